//! Loan lifecycle rules: the status state machine and the repayment schedule.
//!
//! Both are pure functions so the Postgres and in-memory repositories (and the handlers)
//! share exactly the same arithmetic and transition table.

use bigdecimal::{BigDecimal, Zero};
use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::models::{LoanStatus, ScheduledInstallment};

/// LoanAction
///
/// Everything that can move a loan out of its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Approve,
    Reject,
    Disburse,
    /// The last outstanding installment was paid.
    Settle,
}

impl LoanAction {
    fn verb(&self) -> &'static str {
        match self {
            LoanAction::Approve => "approved",
            LoanAction::Reject => "rejected",
            LoanAction::Disburse => "disbursed",
            LoanAction::Settle => "settled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Loan is {} and cannot be {}", .from.as_str(), .action.verb())]
pub struct TransitionError {
    pub from: LoanStatus,
    pub action: LoanAction,
}

/// transition
///
/// `pending -> approved | rejected`, `approved -> active`, `active -> repaid`.
/// `rejected` and `repaid` are terminal; nothing returns to `pending`.
pub fn transition(from: LoanStatus, action: LoanAction) -> Result<LoanStatus, TransitionError> {
    match (from, action) {
        (LoanStatus::Pending, LoanAction::Approve) => Ok(LoanStatus::Approved),
        (LoanStatus::Pending, LoanAction::Reject) => Ok(LoanStatus::Rejected),
        (LoanStatus::Approved, LoanAction::Disburse) => Ok(LoanStatus::Active),
        (LoanStatus::Active, LoanAction::Settle) => Ok(LoanStatus::Repaid),
        _ => Err(TransitionError { from, action }),
    }
}

/// repayment_schedule
///
/// Splits `loan_amount` into `loan_period` monthly installments. Each installment is the
/// even share truncated to cents; the last installment also carries the truncated remainder,
/// so the schedule always sums to `loan_amount`. Installment `i` falls due `i` calendar
/// months after `anchor` (clamped to the end of shorter months).
pub fn repayment_schedule(
    loan_amount: &BigDecimal,
    loan_period: i32,
    anchor: NaiveDate,
) -> Vec<ScheduledInstallment> {
    if loan_period <= 0 {
        return Vec::new();
    }

    let base = (loan_amount.clone() / BigDecimal::from(loan_period)).with_scale(2);
    let mut allocated = BigDecimal::zero();

    (1..=loan_period)
        .map(|n| {
            let amount_due = if n == loan_period {
                (loan_amount - &allocated).with_scale(2)
            } else {
                base.clone()
            };
            allocated += &amount_due;

            ScheduledInstallment {
                installment_number: n,
                due_date: anchor
                    .checked_add_months(Months::new(n as u32))
                    .unwrap_or(NaiveDate::MAX),
                amount_due,
            }
        })
        .collect()
}
