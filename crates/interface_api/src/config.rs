//! API configuration
//!
//! Loaded from `BILLING_`-prefixed environment variables, e.g.
//! `BILLING_PORT=8080` or `BILLING_SMTP_HOST=smtp.example.com`. Unset
//! variables keep their defaults.

use std::path::PathBuf;

use config::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::{Currency, Money, Timezone};
use domain_billing::{BillingPolicy, DEFAULT_GRACE_DAYS};
use infra_db::DatabaseConfig;
use infra_mail::{DispatchSettings, SmtpConfig};

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,

    /// Directory that keeps a copy of every rendered invoice
    pub artifact_dir: String,
    /// Optional PNG drawn in the invoice header
    pub logo_path: Option<String>,
    /// TrueType face with the currency glyph; Helvetica with ISO codes when unset
    pub invoice_font_path: Option<String>,

    /// Amount billed per customer per period
    pub default_tariff: Decimal,
    pub currency: String,
    pub grace_days: u32,
    /// IANA timezone for period boundaries and the schedule
    pub schedule_timezone: String,

    /// Copied on every invoice mail
    pub ops_mailbox: String,
    /// SMTP relay; invoices are only logged when unset
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_starttls: bool,
    pub sender_address: String,
    pub sender_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/billing".to_string(),
            log_level: "info".to_string(),
            artifact_dir: "./public/temp".to_string(),
            logo_path: None,
            invoice_font_path: None,
            default_tariff: Decimal::new(2500, 0),
            currency: "INR".to_string(),
            grace_days: DEFAULT_GRACE_DAYS,
            schedule_timezone: "Asia/Kolkata".to_string(),
            ops_mailbox: "billing-ops@localhost".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: true,
            sender_address: "billing@localhost".to_string(),
            sender_name: "Billing System".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("BILLING"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
    }

    /// Tariff, grace period and timezone for bill generation
    pub fn billing_policy(&self) -> Result<BillingPolicy, ConfigError> {
        let currency: Currency = self
            .currency
            .parse()
            .map_err(|e| ConfigError::Message(format!("currency: {}", e)))?;
        let tariff = Money::positive(self.default_tariff, currency)
            .map_err(|e| ConfigError::Message(format!("default_tariff: {}", e)))?;
        let timezone: Timezone = self
            .schedule_timezone
            .parse()
            .map_err(|e| ConfigError::Message(format!("schedule_timezone: {}", e)))?;

        Ok(BillingPolicy {
            tariff,
            grace_days: self.grace_days,
            timezone,
        })
    }

    pub fn logo(&self) -> Option<PathBuf> {
        self.logo_path.as_ref().map(PathBuf::from)
    }

    pub fn invoice_font(&self) -> Option<PathBuf> {
        self.invoice_font_path.as_ref().map(PathBuf::from)
    }

    /// SMTP settings, if a relay is configured
    pub fn smtp(&self) -> Option<SmtpConfig> {
        let host = self.smtp_host.as_deref().filter(|h| !h.trim().is_empty())?;
        let mut smtp = SmtpConfig::new(host).port(self.smtp_port);
        if let (Some(username), Some(password)) = (&self.smtp_username, &self.smtp_password) {
            smtp = smtp.credentials(username.clone(), password.clone());
        }
        if !self.smtp_starttls {
            smtp = smtp.no_starttls();
        }
        Some(smtp)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            sender_name: self.sender_name.clone(),
            sender_address: self.sender_address.clone(),
            ops_mailbox: self.ops_mailbox.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ApiConfig::default().billing_policy().unwrap();
        assert_eq!(policy.tariff.amount(), Decimal::new(2500, 0));
        assert_eq!(policy.tariff.currency(), Currency::INR);
        assert_eq!(policy.grace_days, 10);
        assert_eq!(policy.timezone.to_string(), "Asia/Kolkata");
    }

    #[test]
    fn test_bad_timezone_is_rejected() {
        let config = ApiConfig {
            schedule_timezone: "Mars/Olympus".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.billing_policy().is_err());
    }

    #[test]
    fn test_ops_mailbox_is_always_set() {
        let settings = ApiConfig::default().dispatch_settings();
        assert_eq!(settings.ops_mailbox, "billing-ops@localhost");
        assert_eq!(settings.sender_address, "billing@localhost");
    }

    #[test]
    fn test_smtp_is_optional() {
        assert!(ApiConfig::default().smtp().is_none());

        let config = ApiConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_username: Some("user".to_string()),
            smtp_password: Some("secret".to_string()),
            ..ApiConfig::default()
        };
        let smtp = config.smtp().unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username.as_deref(), Some("user"));
    }
}
