use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AccountWithMember, AuditLogEntry, CashMovement, LedgerEntry, Loan, LoanApproval,
    LoanRepayment, LoanStatus, LoanWithMember, Member, MemberRegistration, MemberSummary,
    MembershipStatus, NewAuditLog, NewLoan, NewMember, NewUser, PortfolioTotals, Role,
    SavingsAccount, Transaction, UpdateProfileRequest, User,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// Persistence failures. Constraint violations carry the database message so they can be
/// surfaced to the caller as bad input; everything else is an opaque database failure.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Constraint(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            // 22003: numeric_value_out_of_range, e.g. an amount too wide for NUMERIC(14, 2).
            if db_err.code().as_deref() == Some("22003") {
                return RepoError::Constraint(db_err.message().to_string());
            }
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    return RepoError::Constraint(db_err.message().to_string());
                }
                _ => {}
            }
        }
        RepoError::Database(err)
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract the handlers are written against. Every method that touches more
/// than one row (registration, cash movements, loan decisions, installment payments) is atomic:
/// either all of its writes land or none do.
///
/// Guarded state changes return `Ok(None)` when the guard did not match (the row is missing or
/// is no longer in the expected status), leaving the caller to decide between 404 and 409.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    /// Newest first.
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Flips `is_active` in a single statement.
    async fn toggle_user_active(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;

    // --- Members ---
    /// Creates the optional login, the member and its mandatory savings account together.
    async fn create_member(
        &self,
        user: Option<NewUser>,
        member: NewMember,
    ) -> RepoResult<MemberRegistration>;
    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>>;
    async fn get_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<Member>>;
    /// Partial update of the caller's contact details; `None` fields are left untouched.
    /// Returns `None` when the user does not exist.
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<(User, Option<Member>)>>;
    async fn set_membership_status(
        &self,
        member_id: Uuid,
        status: MembershipStatus,
    ) -> RepoResult<Option<Member>>;
    async fn list_members(&self) -> RepoResult<Vec<MemberSummary>>;

    // --- Savings ---
    async fn list_member_accounts(&self, member_id: Uuid) -> RepoResult<Vec<SavingsAccount>>;
    async fn list_accounts(&self) -> RepoResult<Vec<AccountWithMember>>;
    async fn get_mandatory_account(&self, member_id: Uuid) -> RepoResult<Option<SavingsAccount>>;
    /// Moves money on the member's active mandatory account and appends the ledger row.
    /// Fails with `NotFound("Savings account")` or `InsufficientFunds`.
    async fn apply_cash_movement(
        &self,
        movement: CashMovement,
    ) -> RepoResult<(Transaction, SavingsAccount)>;

    // --- Ledger ---
    async fn list_member_transactions(
        &self,
        member_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Transaction>>;
    async fn list_transactions(&self, limit: i64) -> RepoResult<Vec<LedgerEntry>>;

    // --- Loans ---
    async fn create_loan(&self, loan: NewLoan) -> RepoResult<Loan>;
    async fn get_loan(&self, id: Uuid) -> RepoResult<Option<Loan>>;
    async fn list_member_loans(&self, member_id: Uuid) -> RepoResult<Vec<Loan>>;
    async fn list_loans(&self, status: Option<LoanStatus>) -> RepoResult<Vec<LoanWithMember>>;
    /// Approved and rejected loans, most recent decision first.
    async fn list_decided_loans(&self) -> RepoResult<Vec<LoanWithMember>>;
    /// `pending -> approved` plus the repayment schedule.
    async fn approve_loan(
        &self,
        approval: LoanApproval,
    ) -> RepoResult<Option<(Loan, Vec<LoanRepayment>)>>;
    /// `pending -> rejected`.
    async fn reject_loan(
        &self,
        loan_id: Uuid,
        decided_by: Uuid,
        reason: Option<String>,
    ) -> RepoResult<Option<Loan>>;
    /// `approved -> active`.
    async fn disburse_loan(
        &self,
        loan_id: Uuid,
        disbursed_by: Uuid,
        disbursed_at: DateTime<Utc>,
    ) -> RepoResult<Option<Loan>>;
    async fn list_repayments(&self, loan_id: Uuid) -> RepoResult<Vec<LoanRepayment>>;
    async fn get_repayment(&self, id: Uuid) -> RepoResult<Option<LoanRepayment>>;
    /// Marks a pending installment of an active loan paid; settles the loan (`repaid`) when
    /// it was the last one outstanding.
    async fn pay_repayment(
        &self,
        repayment_id: Uuid,
        paid_by: Uuid,
    ) -> RepoResult<Option<(LoanRepayment, Loan)>>;

    // --- Reporting ---
    /// `since` bounds `recent_audit_logs`.
    async fn get_totals(&self, since: DateTime<Utc>) -> RepoResult<PortfolioTotals>;

    // --- Audit ---
    async fn record_audit(&self, entry: NewAuditLog) -> RepoResult<()>;
    async fn list_audit_logs(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
