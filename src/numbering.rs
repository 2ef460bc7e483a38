//! Human-readable document numbers.
//!
//! Numbers are derived from database sequences (or a counter in the in-memory repository),
//! never from clocks or random suffixes, so two documents can never share a number.

use crate::models::TransactionType;

/// NumberKind
///
/// Each kind owns one Postgres sequence and one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Member,
    Account,
    Loan,
    Deposit,
    Withdrawal,
}

impl NumberKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            NumberKind::Member => "MEM",
            NumberKind::Account => "ACC",
            NumberKind::Loan => "LOAN",
            NumberKind::Deposit => "DEP",
            NumberKind::Withdrawal => "WDR",
        }
    }

    /// Name of the backing Postgres sequence. Deposits and withdrawals share one.
    pub fn sequence(&self) -> &'static str {
        match self {
            NumberKind::Member => "member_number_seq",
            NumberKind::Account => "account_number_seq",
            NumberKind::Loan => "loan_number_seq",
            NumberKind::Deposit | NumberKind::Withdrawal => "transaction_reference_seq",
        }
    }

    pub fn for_transaction(transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Deposit => NumberKind::Deposit,
            TransactionType::Withdrawal => NumberKind::Withdrawal,
        }
    }

    /// format
    ///
    /// Renders a sequence value, zero-padded to eight digits (`LOAN00000042`).
    /// Values wider than eight digits are rendered in full.
    pub fn format(&self, value: i64) -> String {
        format!("{}{:08}", self.prefix(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_eight_digits() {
        assert_eq!(NumberKind::Member.format(1), "MEM00000001");
        assert_eq!(NumberKind::Loan.format(42), "LOAN00000042");
        assert_eq!(NumberKind::Account.format(123_456_789), "ACC123456789");
    }

    #[test]
    fn transaction_references_share_a_sequence() {
        assert_eq!(
            NumberKind::Deposit.sequence(),
            NumberKind::Withdrawal.sequence()
        );
        assert_eq!(
            NumberKind::for_transaction(TransactionType::Withdrawal).format(7),
            "WDR00000007"
        );
    }
}
