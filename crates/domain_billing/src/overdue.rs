//! Overdue sweep
//!
//! Moves pending bills past their due date to `overdue`. The move is a
//! conditional update, so a bill paid between listing and updating is left
//! alone.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use core_kernel::BillId;

use crate::bill::BillStatus;
use crate::ports::BillLedger;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub marked_overdue: Vec<BillId>,
    /// Bills that changed status before they could be marked
    pub skipped: Vec<BillId>,
    pub failed: Vec<(BillId, String)>,
}

#[derive(Clone)]
pub struct OverdueSweeper {
    bills: Arc<dyn BillLedger>,
}

impl OverdueSweeper {
    pub fn new(bills: Arc<dyn BillLedger>) -> Self {
        Self { bills }
    }

    /// Marks every pending bill with `due_date < today` as overdue
    pub async fn sweep(&self, today: NaiveDate) -> SweepReport {
        let mut report = SweepReport::default();

        let due = match self.bills.list_pending_due_before(today).await {
            Ok(bills) => bills,
            Err(e) => {
                warn!(%today, error = %e, "Failed to list past-due bills");
                return report;
            }
        };

        for bill in due {
            match self
                .bills
                .transition(&bill.bill_id, BillStatus::Pending, BillStatus::Overdue, None)
                .await
            {
                Ok(_) => {
                    info!(bill_id = %bill.bill_id, due_date = %bill.due_date, "Bill marked overdue");
                    report.marked_overdue.push(bill.bill_id);
                }
                Err(e) if e.is_conflict() => report.skipped.push(bill.bill_id),
                Err(e) => {
                    warn!(bill_id = %bill.bill_id, error = %e, "Failed to mark bill overdue");
                    report.failed.push((bill.bill_id, e.to_string()));
                }
            }
        }

        report
    }
}
