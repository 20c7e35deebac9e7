//! Custom Test Assertions
//!
//! Assertion helpers for bills and payments with messages that name the
//! bill involved.

use core_kernel::Money;
use domain_billing::{Bill, BillStatus, Payment};

/// Asserts that a bill is in the expected status
pub fn assert_bill_status(bill: &Bill, expected: BillStatus) {
    assert_eq!(
        bill.status, expected,
        "Bill {} is {}, expected {}",
        bill.bill_id, bill.status, expected
    );
}

/// Asserts that a bill is paid and carries a paid date
pub fn assert_bill_paid(bill: &Bill) {
    assert_bill_status(bill, BillStatus::Paid);
    assert!(
        bill.paid_date.is_some(),
        "Bill {} is paid but has no paid date",
        bill.bill_id
    );
}

/// Asserts that a bill is not paid and has no paid date
pub fn assert_bill_unpaid(bill: &Bill) {
    assert!(
        bill.status.is_payable(),
        "Bill {} should be payable, is {}",
        bill.bill_id,
        bill.status
    );
    assert!(
        bill.paid_date.is_none(),
        "Bill {} is {} but has paid date {:?}",
        bill.bill_id,
        bill.status,
        bill.paid_date
    );
}

/// Asserts that a payment settles exactly the given bill
pub fn assert_payment_settles(payment: &Payment, bill: &Bill) {
    assert_eq!(payment.bill_id, bill.bill_id, "Payment is for another bill");
    assert_eq!(payment.customer_id, bill.customer_id, "Payment is for another customer");
    assert_money_eq(&payment.amount_paid, &bill.amount);
}

/// Asserts that two amounts are equal in value and currency
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::BillBuilder;
    use crate::fixtures::TemporalFixtures;
    use core_kernel::CustomerId;

    #[test]
    fn test_unpaid_bill_passes() {
        assert_bill_unpaid(&BillBuilder::new(CustomerId::generate()).build());
    }

    #[test]
    #[should_panic(expected = "should be payable")]
    fn test_paid_bill_fails_unpaid_assertion() {
        let bill = BillBuilder::new(CustomerId::generate())
            .paid_at(TemporalFixtures::run_instant())
            .build();
        assert_bill_unpaid(&bill);
    }
}
