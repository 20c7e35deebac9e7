//! Router tests over the in-memory adapters

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::BillId;
use domain_billing::{
    Bill, BillGenerator, BillService, BillStatus, BillingPolicy, InMemoryBillLedger,
    InMemoryPaymentLedger, PaymentRecorder, RecordingDispatcher, StubInvoiceRenderer,
};
use domain_party::InMemoryCustomerDirectory;
use interface_api::{create_router, AppState};
use test_utils::{assert_bill_paid, BillBuilder, CustomerFixtures, TemporalFixtures};

struct TestApp {
    router: Router,
    bills: InMemoryBillLedger,
    payments: InMemoryPaymentLedger,
    dispatcher: RecordingDispatcher,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(StubInvoiceRenderer::new(), InMemoryBillLedger::new()).await
    }

    async fn with_renderer(renderer: StubInvoiceRenderer) -> Self {
        Self::build(renderer, InMemoryBillLedger::new()).await
    }

    async fn seeded(bills: Vec<Bill>) -> Self {
        Self::build(StubInvoiceRenderer::new(), InMemoryBillLedger::with_bills(bills).await).await
    }

    async fn build(renderer: StubInvoiceRenderer, bills: InMemoryBillLedger) -> Self {
        let customers = InMemoryCustomerDirectory::with_customers(vec![
            CustomerFixtures::c1(),
            CustomerFixtures::c2(),
            CustomerFixtures::inactive(),
        ])
        .await;
        let payments = InMemoryPaymentLedger::new();
        let dispatcher = RecordingDispatcher::new();
        let clock = Arc::new(TemporalFixtures::clock());

        let generator = BillGenerator::new(
            Arc::new(customers.clone()),
            Arc::new(bills.clone()),
            BillingPolicy::default(),
            clock.clone(),
        );
        let recorder = PaymentRecorder::new(
            Arc::new(bills.clone()),
            Arc::new(payments.clone()),
            Arc::new(customers.clone()),
            Arc::new(renderer),
            Arc::new(dispatcher.clone()),
            clock,
        );
        let service = BillService::new(
            Arc::new(bills.clone()),
            Arc::new(payments.clone()),
            Arc::new(customers),
        );

        let state = AppState::new(service, recorder, generator).with_probe(Arc::new(bills.clone()));
        Self {
            router: create_router(state),
            bills,
            payments,
            dispatcher,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn generate(&self) -> Value {
        let (status, report) = self.send("POST", "/api/v1/bills/generate", None).await;
        assert_eq!(status, StatusCode::OK);
        report
    }
}

fn create_bill_body(bill_id: &str) -> Value {
    json!({
        "billId": bill_id,
        "customerId": "C1",
        "period": "Aug-2025",
        "amount": 2500,
        "generatedDate": "2025-09-01",
        "dueDate": "2025-09-11"
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send("GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adapters"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_bills_active_customers_once() {
    let app = TestApp::new().await;

    let report = app.generate().await;
    assert_eq!(report["period"], "Sep-2025");
    assert_eq!(report["created"].as_array().unwrap().len(), 2);

    let report = app.generate().await;
    assert!(report["created"].as_array().unwrap().is_empty());
    assert_eq!(report["skipped"].as_array().unwrap().len(), 2);
    assert_eq!(app.bills.all().await.len(), 2);
}

#[tokio::test]
async fn test_get_generated_bill() {
    let app = TestApp::new().await;
    let report = app.generate().await;
    let bill_id = report["created"][0].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", &format!("/api/v1/bills/{}", bill_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["billId"], bill_id);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["amount"], "2500");
    assert_eq!(body["generatedDate"], "2025-10-01");
    assert_eq!(body["dueDate"], "2025-10-11");
    assert!(body["paidDate"].is_null());
}

#[tokio::test]
async fn test_unknown_bill_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/api/v1/bills/BILL-missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("BILL-missing"));
}

#[tokio::test]
async fn test_create_bill_then_duplicate_conflicts() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send("POST", "/api/v1/bills/create", Some(create_bill_body("BILL-AUG-C1")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["bill"]["period"], "Aug-2025");

    let (status, body) = app
        .send("POST", "/api/v1/bills/create", Some(create_bill_body("BILL-AUG-C1")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(app.bills.all().await.len(), 1);
}

#[tokio::test]
async fn test_create_bill_validation() {
    let app = TestApp::new().await;

    let mut body = create_bill_body("BILL-BAD");
    body["amount"] = json!(0);
    let (status, response) = app.send("POST", "/api/v1/bills/create", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["error"], "validation");

    let mut body = create_bill_body("BILL-BAD");
    body["dueDate"] = json!("2025-08-01");
    let (status, _) = app.send("POST", "/api/v1/bills/create", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .send("POST", "/api/v1/bills/create", Some(json!({ "billId": "BILL-BAD" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, response) = app
        .send("POST", "/api/v1/bills/create", Some(create_bill_body("../outside")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["error"], "validation");

    let mut body = create_bill_body("");
    body["billId"] = json!("");
    let (status, _) = app.send("POST", "/api/v1/bills/create", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.bills.all().await.is_empty());
}

#[tokio::test]
async fn test_create_bill_for_unknown_customer() {
    let app = TestApp::new().await;
    let mut body = create_bill_body("BILL-X");
    body["customerId"] = json!("C404");
    let (status, _) = app.send("POST", "/api/v1/bills/create", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_scenario() {
    let app = TestApp::new().await;
    let report = app.generate().await;
    let bill_id = report["created"][0].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/payments/create",
            Some(json!({ "billId": bill_id, "mode": "UPI" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["billId"], bill_id);
    assert_eq!(body["payment"]["amountPaid"], "2500");
    assert_eq!(body["payment"]["mode"], "UPI");

    let bill = app
        .bills
        .all()
        .await
        .into_iter()
        .find(|b| b.bill_id.as_str() == bill_id)
        .unwrap();
    assert_bill_paid(&bill);
    assert_eq!(app.payments.count().await, 1);
    assert_eq!(app.dispatcher.sent().await.len(), 1);

    let (status, payment) = app
        .send("GET", &format!("/api/v1/payments/bills/{}", bill_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["paymentId"], body["payment"]["paymentId"]);
}

#[tokio::test]
async fn test_repeated_payment_conflicts() {
    let bill = BillBuilder::for_customer(&CustomerFixtures::c1()).build();
    let bill_id = bill.bill_id.to_string();
    let app = TestApp::seeded(vec![bill]).await;

    let request = json!({ "billId": bill_id, "mode": "Cash" });
    let (status, _) = app.send("POST", "/api/v1/payments/create", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", "/api/v1/payments/create", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(app.payments.count().await, 1);
}

#[tokio::test]
async fn test_payment_validation_and_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/payments/create",
            Some(json!({ "billId": "BILL-1", "mode": "Cheque" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("Cheque"));

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/payments/create",
            Some(json!({ "billId": "BILL-404", "mode": "Card" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.payments.count().await, 0);

    let (status, body) = app.send("GET", "/api/v1/payments/bills/BILL-404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().starts_with("Payment not found"));
}

#[tokio::test]
async fn test_render_failure_after_commit_is_internal() {
    let app = TestApp::with_renderer(StubInvoiceRenderer::failing()).await;
    let report = app.generate().await;
    let bill_id = BillId::parse(report["created"][0].as_str().unwrap()).unwrap();

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/payments/create",
            Some(json!({ "billId": bill_id.as_str(), "mode": "NetBanking" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal");

    // The payment stays committed
    assert_eq!(app.payments.count().await, 1);
    let bill = app.bills.all().await.into_iter().find(|b| b.bill_id == bill_id).unwrap();
    assert_eq!(bill.status, BillStatus::Paid);
    assert!(app.dispatcher.sent().await.is_empty());
}
