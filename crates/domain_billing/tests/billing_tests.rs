//! Integration tests for domain_billing

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{BillId, BillingPeriod, Clock, CustomerId, ManualClock};
use domain_party::{Customer, InMemoryCustomerDirectory};
use test_utils::{
    assert_bill_paid, assert_bill_status, assert_bill_unpaid, assert_money_eq,
    assert_payment_settles, BillBuilder, CustomerBuilder, CustomerFixtures, MoneyFixtures,
    TemporalFixtures,
};

use domain_billing::{
    Bill, BillGenerator, BillLedger, BillService, BillStatus, BillingError, BillingPolicy,
    BillingScheduler, ErrorCategory, InMemoryBillLedger, InMemoryPaymentLedger, NewBill,
    OverdueSweeper, PaymentLedger, PaymentMode, PaymentRecorder, RecordPayment,
    RecordingDispatcher, SettlementStep, StubInvoiceRenderer,
};

// ============================================================================
// Fixtures
// ============================================================================

fn instant(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Harness {
    customers: InMemoryCustomerDirectory,
    bills: InMemoryBillLedger,
    payments: InMemoryPaymentLedger,
    dispatcher: RecordingDispatcher,
    clock: ManualClock,
}

impl Harness {
    async fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers: InMemoryCustomerDirectory::with_customers(customers).await,
            bills: InMemoryBillLedger::new(),
            payments: InMemoryPaymentLedger::new(),
            dispatcher: RecordingDispatcher::new(),
            clock: TemporalFixtures::clock(),
        }
    }

    fn generator(&self) -> BillGenerator {
        BillGenerator::new(
            Arc::new(self.customers.clone()),
            Arc::new(self.bills.clone()),
            BillingPolicy::default(),
            Arc::new(self.clock.clone()),
        )
    }

    fn recorder(&self) -> PaymentRecorder {
        self.recorder_with(StubInvoiceRenderer::new(), self.dispatcher.clone())
    }

    fn recorder_with(&self, renderer: StubInvoiceRenderer, dispatcher: RecordingDispatcher) -> PaymentRecorder {
        PaymentRecorder::new(
            Arc::new(self.bills.clone()),
            Arc::new(self.payments.clone()),
            Arc::new(self.customers.clone()),
            Arc::new(renderer),
            Arc::new(dispatcher),
            Arc::new(self.clock.clone()),
        )
    }

    fn service(&self) -> BillService {
        BillService::new(
            Arc::new(self.bills.clone()),
            Arc::new(self.payments.clone()),
            Arc::new(self.customers.clone()),
        )
    }

    async fn only_bill(&self) -> Bill {
        let bills = self.bills.all().await;
        assert_eq!(bills.len(), 1);
        bills.into_iter().next().unwrap()
    }
}

// ============================================================================
// Generator Tests
// ============================================================================

mod generator_tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_previous_period_for_active_customers() {
        let h = Harness::new(vec![
            CustomerFixtures::c1(),
            CustomerFixtures::c2(),
            CustomerFixtures::inactive(),
        ])
        .await;

        let report = h.generator().run().await;

        assert_eq!(report.period, BillingPeriod::new(2025, 9).unwrap());
        assert_eq!(report.created.len(), 2);
        assert!(report.failed.is_empty());

        let bills = h.bills.all().await;
        assert_eq!(bills.len(), 2);
        assert!(bills.iter().all(|b| b.customer_id.as_str() != "C3"));
    }

    #[tokio::test]
    async fn test_generation_is_idempotent() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let generator = h.generator();

        let first = generator.run().await;
        let second = generator.run().await;

        assert_eq!(first.created.len(), 1);
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 1);
        assert_eq!(h.bills.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_bill_fields_follow_policy() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        h.generator().run().await;

        let bill = h.only_bill().await;
        assert_eq!(bill.period, TemporalFixtures::billed_period());
        assert_money_eq(&bill.amount, &MoneyFixtures::tariff());
        assert_bill_status(&bill, BillStatus::Pending);
        assert_bill_unpaid(&bill);
        assert_eq!(bill.generated_date, TemporalFixtures::run_date());
        assert_eq!(bill.due_date, date(2025, 10, 11));
    }

    #[tokio::test]
    async fn test_new_month_creates_new_bill() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let generator = h.generator();

        generator.run().await;
        h.clock.set(instant(2025, 11, 1, 0));
        let report = generator.run().await;

        assert_eq!(report.period.label(), "Oct-2025");
        assert_eq!(h.bills.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_stop_the_batch() {
        let c4 = CustomerBuilder::new()
            .with_id(CustomerId::parse("C4").unwrap())
            .with_email("d@x.com")
            .build();
        let h = Harness::new(vec![CustomerFixtures::c1(), CustomerFixtures::c2(), c4]).await;
        h.bills.fail_inserts_for(CustomerFixtures::c2().id).await;

        let report = h.generator().run().await;

        let created_for: Vec<String> = h
            .bills
            .all()
            .await
            .into_iter()
            .map(|b| b.customer_id.to_string())
            .collect();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, CustomerFixtures::c2().id);
        assert!(report.failed[0].1.contains("unavailable"));
        assert!(created_for.contains(&"C1".to_string()));
        assert!(created_for.contains(&"C4".to_string()));
        assert!(!created_for.contains(&"C2".to_string()));
    }

    #[tokio::test]
    async fn test_failed_customer_is_billed_on_the_next_run() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        h.bills.fail_inserts_for(CustomerFixtures::c1().id).await;
        let generator = h.generator();

        let first = generator.run().await;
        assert_eq!(first.failed.len(), 1);
        assert!(h.bills.all().await.is_empty());

        h.bills.clear_insert_failures().await;
        let second = generator.run().await;
        assert_eq!(second.created.len(), 1);
        assert!(second.failed.is_empty());
    }

    #[tokio::test]
    async fn test_directory_failure_yields_empty_report() {
        let h = Harness::new(vec![CustomerFixtures::c1(), CustomerFixtures::c2()]).await;
        h.customers.fail_listing(true);

        let report = h.generator().run().await;

        assert_eq!(report.period, TemporalFixtures::billed_period());
        assert!(report.created.is_empty());
        assert!(report.skipped.is_empty());
        assert!(report.failed.is_empty());
        assert!(h.bills.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory_creates_nothing() {
        let h = Harness::new(vec![]).await;
        let report = h.generator().run().await;
        assert!(report.created.is_empty());
        assert!(report.failed.is_empty());
    }
}

// ============================================================================
// Payment Recorder Tests
// ============================================================================

mod recorder_tests {
    use super::*;

    async fn generated(h: &Harness) -> Bill {
        h.generator().run().await;
        h.only_bill().await
    }

    #[tokio::test]
    async fn test_scenario_generate_then_pay() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;

        let receipt = h
            .recorder()
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Upi })
            .await
            .unwrap();

        assert_bill_paid(&receipt.bill);
        assert_payment_settles(&receipt.payment, &bill);
        assert_eq!(receipt.payment.amount_paid.amount(), dec!(2500));
        assert_eq!(receipt.payment.mode, PaymentMode::Upi);

        assert_bill_paid(&h.bills.get(&bill.bill_id).await.unwrap());
        assert_eq!(h.payments.count().await, 1);

        let sent = h.dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.com");
        assert_eq!(sent[0].2, format!("{}.pdf", bill.bill_id));

        assert_eq!(
            receipt.journal.steps.last(),
            Some(&SettlementStep::InvoiceDispatched)
        );
    }

    #[tokio::test]
    async fn test_second_payment_conflicts() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;
        let recorder = h.recorder();

        recorder
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Cash })
            .await
            .unwrap();
        let err = recorder
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Card })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(h.payments.count().await, 1);
        assert_eq!(h.dispatcher.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_bill_is_not_found_and_writes_nothing() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;

        let err = h
            .recorder()
            .record(RecordPayment { bill_id: BillId::parse("NOPE").unwrap(), mode: PaymentMode::Upi })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::BillNotFound(_)));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(h.payments.count().await, 0);
        assert!(h.dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_customer_leaves_bill_pending() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;
        h.customers.remove(&bill.customer_id).await;

        let err = h
            .recorder()
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Upi })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::CustomerNotFound(_)));
        assert_eq!(h.bills.get(&bill.bill_id).await.unwrap().status, BillStatus::Pending);
        assert_eq!(h.payments.count().await, 0);
    }

    #[tokio::test]
    async fn test_payment_write_failure_reverts_bill() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;
        h.payments.fail_inserts(true);

        let err = h
            .recorder()
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::NetBanking })
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Internal);
        match err {
            BillingError::Settlement { journal, .. } => {
                assert!(journal.contains(&SettlementStep::BillMarkedPaid { from: BillStatus::Pending }));
                assert!(journal.contains(&SettlementStep::BillReverted { to: BillStatus::Pending }));
            }
            other => panic!("expected settlement error, got {:?}", other),
        }

        let stored = h.bills.get(&bill.bill_id).await.unwrap();
        assert_bill_status(&stored, BillStatus::Pending);
        assert_bill_unpaid(&stored);
        assert!(h.dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_render_failure_keeps_payment() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;

        let err = h
            .recorder_with(StubInvoiceRenderer::failing(), h.dispatcher.clone())
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Upi })
            .await
            .unwrap_err();

        let payment = h.payments.find_by_bill(&bill.bill_id).await.unwrap().unwrap();
        match err {
            BillingError::InvoiceDelivery { payment_id, .. } => assert_eq!(payment_id, payment.payment_id),
            other => panic!("expected delivery error, got {:?}", other),
        }
        assert_eq!(h.bills.get(&bill.bill_id).await.unwrap().status, BillStatus::Paid);
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_payment() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;

        let err = h
            .recorder_with(StubInvoiceRenderer::new(), RecordingDispatcher::failing())
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Upi })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::InvoiceDelivery { .. }));
        assert!(err.to_string().starts_with("Error processing payment"));
        assert_eq!(h.payments.count().await, 1);
    }

    #[tokio::test]
    async fn test_overdue_bill_is_payable() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;
        OverdueSweeper::new(Arc::new(h.bills.clone())).sweep(date(2025, 10, 20)).await;

        let receipt = h
            .recorder()
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Cash })
            .await
            .unwrap();

        assert_eq!(receipt.bill.status, BillStatus::Paid);
        assert_eq!(
            receipt.journal.steps.first(),
            Some(&SettlementStep::BillMarkedPaid { from: BillStatus::Overdue })
        );
    }

    #[tokio::test]
    async fn test_concurrent_payments_settle_once() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let bill = generated(&h).await;
        let recorder = h.recorder();

        let (a, b) = tokio::join!(
            recorder.record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Cash }),
            recorder.record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Upi }),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(h.payments.count().await, 1);
    }
}

// ============================================================================
// Bill Service Tests
// ============================================================================

mod service_tests {
    use super::*;

    fn manual(bill_id: &str, customer_id: &str) -> NewBill {
        BillBuilder::new(CustomerId::parse(customer_id).unwrap())
            .with_bill_id(BillId::parse(bill_id).unwrap())
            .with_amount(MoneyFixtures::inr(dec!(1800)))
            .build_request()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let service = h.service();

        let created = service.create_bill(manual("B1", "C1")).await.unwrap();
        let fetched = service.get_bill(&created.bill_id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.status, BillStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_bill_id_conflicts() {
        let h = Harness::new(vec![
            CustomerFixtures::c1(),
            CustomerFixtures::c2(),
        ])
        .await;
        let service = h.service();

        service.create_bill(manual("B1", "C1")).await.unwrap();
        let err = service.create_bill(manual("B1", "C2")).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(h.bills.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_period_conflicts() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let service = h.service();

        service.create_bill(manual("B1", "C1")).await.unwrap();
        let err = service.create_bill(manual("B2", "C1")).await.unwrap_err();

        assert!(matches!(err, BillingError::DuplicateBill(_)));
        assert_eq!(h.bills.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let h = Harness::new(vec![]).await;
        let err = h.service().create_bill(manual("B1", "C404")).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_payment_for_unpaid_bill_not_found() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        let service = h.service();
        let bill = service.create_bill(manual("B1", "C1")).await.unwrap();

        let err = service.payment_for_bill(&bill.bill_id).await.unwrap_err();
        assert!(matches!(err, BillingError::PaymentNotFound(_)));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().starts_with("Payment not found"));

        h.recorder()
            .record(RecordPayment { bill_id: bill.bill_id.clone(), mode: PaymentMode::Card })
            .await
            .unwrap();
        let payment = service.payment_for_bill(&bill.bill_id).await.unwrap();
        assert_eq!(payment.amount_paid.amount(), dec!(1800));
    }
}

// ============================================================================
// Overdue Sweep Tests
// ============================================================================

mod overdue_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_marks_only_past_due_pending_bills() {
        let h = Harness::new(vec![
            CustomerFixtures::c1(),
            CustomerFixtures::c2(),
        ])
        .await;
        h.generator().run().await;
        let bills = h.bills.all().await;
        h.recorder()
            .record(RecordPayment { bill_id: bills[0].bill_id.clone(), mode: PaymentMode::Upi })
            .await
            .unwrap();

        let sweeper = OverdueSweeper::new(Arc::new(h.bills.clone()));

        // due date itself is not overdue
        let report = sweeper.sweep(date(2025, 10, 11)).await;
        assert!(report.marked_overdue.is_empty());

        let report = sweeper.sweep(date(2025, 10, 12)).await;
        assert_eq!(report.marked_overdue, vec![bills[1].bill_id.clone()]);
        assert_eq!(h.bills.get(&bills[0].bill_id).await.unwrap().status, BillStatus::Paid);
        assert_eq!(h.bills.get(&bills[1].bill_id).await.unwrap().status, BillStatus::Overdue);

        let again = sweeper.sweep(date(2025, 10, 13)).await;
        assert!(again.marked_overdue.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_uses_each_bills_own_due_date() {
        let c1 = CustomerFixtures::c1();
        let h = Harness::new(vec![c1.clone()]).await;
        let august = BillBuilder::for_customer(&c1)
            .with_period(BillingPeriod::new(2025, 8).unwrap())
            .generated_on(date(2025, 9, 1))
            .due_on(date(2025, 9, 5))
            .build();
        let july = BillBuilder::for_customer(&c1)
            .with_period(BillingPeriod::new(2025, 7).unwrap())
            .generated_on(date(2025, 8, 1))
            .overdue()
            .build();
        let september = BillBuilder::for_customer(&c1).build();
        for bill in [&july, &august, &september] {
            h.bills.insert(bill).await.unwrap();
        }

        let report = OverdueSweeper::new(Arc::new(h.bills.clone()))
            .sweep(TemporalFixtures::run_date())
            .await;

        assert_eq!(report.marked_overdue, vec![august.bill_id.clone()]);
        assert_bill_status(&h.bills.get(&august.bill_id).await.unwrap(), BillStatus::Overdue);
        assert_bill_status(&h.bills.get(&july.bill_id).await.unwrap(), BillStatus::Overdue);
        assert_bill_status(&h.bills.get(&september.bill_id).await.unwrap(), BillStatus::Pending);
    }
}

// ============================================================================
// Scheduler Tests
// ============================================================================

mod scheduler_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_generates_at_month_boundary() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        h.clock.set(Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 0).unwrap());

        let scheduler = BillingScheduler::new(h.generator(), OverdueSweeper::new(Arc::new(h.bills.clone())))
            .with_poll_interval(Duration::from_secs(1));
        let clock: Arc<dyn Clock> = Arc::new(h.clock.clone());
        let handle = scheduler.start(clock);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(h.bills.all().await.is_empty());

        h.clock.set(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 5).unwrap());
        tokio::time::sleep(Duration::from_secs(3)).await;

        let bill = h.only_bill().await;
        assert_eq!(bill.period.label(), "Sep-2025");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_sweeps_daily() {
        let h = Harness::new(vec![CustomerFixtures::c1()]).await;
        h.generator().run().await;
        h.clock.set(Utc.with_ymd_and_hms(2025, 10, 11, 23, 0, 0).unwrap());

        let scheduler = BillingScheduler::new(h.generator(), OverdueSweeper::new(Arc::new(h.bills.clone())))
            .with_poll_interval(Duration::from_secs(1));
        let handle = scheduler.start(Arc::new(h.clock.clone()));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.only_bill().await.status, BillStatus::Pending);

        h.clock.set(Utc.with_ymd_and_hms(2025, 10, 12, 0, 0, 1).unwrap());
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(h.only_bill().await.status, BillStatus::Overdue);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let h = Harness::new(vec![]).await;
        let scheduler = BillingScheduler::new(h.generator(), OverdueSweeper::new(Arc::new(h.bills.clone())));
        let handle = scheduler.start(Arc::new(h.clock.clone()));
        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("scheduler did not stop");
    }
}
