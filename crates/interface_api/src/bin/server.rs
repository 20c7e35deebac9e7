//! Billing API Server Binary
//!
//! Starts the HTTP API and the billing scheduler.
//!
//! # Usage
//!
//! ```bash
//! BILLING_DATABASE_URL=postgres://... BILLING_SMTP_HOST=smtp.example.com cargo run --bin billing-api
//! ```
//!
//! # Environment Variables
//!
//! * `BILLING_HOST` / `BILLING_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `BILLING_DATABASE_URL` - PostgreSQL connection string
//! * `BILLING_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `BILLING_ARTIFACT_DIR` / `BILLING_LOGO_PATH` - Invoice output and header logo
//! * `BILLING_INVOICE_FONT_PATH` - TrueType face used to print the currency symbol
//! * `BILLING_DEFAULT_TARIFF` / `BILLING_CURRENCY` / `BILLING_GRACE_DAYS` - Bill amounts and due dates
//! * `BILLING_SCHEDULE_TIMEZONE` - IANA timezone of the monthly run (default: Asia/Kolkata)
//! * `BILLING_SMTP_*`, `BILLING_SENDER_*`, `BILLING_OPS_MAILBOX` - Invoice mail

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{Clock, SystemClock};
use domain_billing::{
    BillGenerator, BillLedger, BillService, BillingScheduler, OverdueSweeper, PaymentLedger,
    PaymentRecorder,
};
use domain_party::CustomerDirectory;
use infra_db::{
    create_pool, run_migrations, PostgresBillLedger, PostgresCustomerDirectory,
    PostgresPaymentLedger,
};
use infra_documents::{ArtifactStore, Branding, PdfInvoiceRenderer, PdfPainter};
use infra_mail::{EmailInvoiceDispatcher, LogMailer, MailBranding, Mailer, SmtpMailer};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(host = %config.host, port = %config.port, "Starting billing API server");

    let pool = create_pool(config.database())
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let customers = Arc::new(PostgresCustomerDirectory::new(pool.clone()));
    let bills = Arc::new(PostgresBillLedger::new(pool.clone()));
    let payments = Arc::new(PostgresPaymentLedger::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let policy = config.billing_policy().context("invalid billing policy")?;
    tracing::info!(
        tariff = %policy.tariff,
        grace_days = policy.grace_days,
        timezone = %policy.timezone,
        "Billing policy loaded"
    );

    let painter = PdfPainter::new(config.logo()).with_font(config.invoice_font());
    let renderer = PdfInvoiceRenderer::new(painter, Branding::default())
        .with_store(ArtifactStore::new(&config.artifact_dir));

    let mailer: Arc<dyn Mailer> = match config.smtp() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Using SMTP mailer");
            Arc::new(SmtpMailer::new(smtp).context("configuring SMTP")?)
        }
        None => {
            tracing::warn!("BILLING_SMTP_HOST is not set, invoice emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let dispatcher = Arc::new(EmailInvoiceDispatcher::new(
        mailer,
        config.dispatch_settings(),
        MailBranding::default(),
    ));

    let customer_port: Arc<dyn CustomerDirectory> = customers.clone();
    let bill_port: Arc<dyn BillLedger> = bills.clone();
    let payment_port: Arc<dyn PaymentLedger> = payments.clone();

    let generator = BillGenerator::new(
        customer_port.clone(),
        bill_port.clone(),
        policy,
        clock.clone(),
    );
    let recorder = PaymentRecorder::new(
        bill_port.clone(),
        payment_port.clone(),
        customer_port.clone(),
        Arc::new(renderer),
        dispatcher.clone(),
        clock.clone(),
    );
    let service = BillService::new(bill_port.clone(), payment_port, customer_port);

    let scheduler =
        BillingScheduler::new(generator.clone(), OverdueSweeper::new(bill_port)).start(clock);

    let state = AppState::new(service, recorder, generator)
        .with_probe(customers)
        .with_probe(bills)
        .with_probe(payments)
        .with_probe(dispatcher);
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration, falling back to defaults when the environment is unreadable
fn load_config() -> ApiConfig {
    match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid BILLING_* configuration ({}), using defaults", e);
            ApiConfig::default()
        }
    }
}

/// Initializes the tracing subscriber for structured logging
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
