use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Exclusive upper bound of every `NUMERIC(14, 2)` money column.
pub fn money_limit() -> BigDecimal {
    BigDecimal::from(1_000_000_000_000i64)
}

// --- Enumerations (mapped to Postgres enum types) ---

/// Role
///
/// The RBAC field of a `User`. Stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
    sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Cso,
    Cashier,
    CreditOfficer,
    Auditor,
    #[default]
    Member,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Manager,
        Role::Cso,
        Role::Cashier,
        Role::CreditOfficer,
        Role::Auditor,
        Role::Member,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cso => "cso",
            Role::Cashier => "cashier",
            Role::CreditOfficer => "credit_officer",
            Role::Auditor => "auditor",
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "membership_status", rename_all = "snake_case")]
#[ts(export)]
pub enum MembershipStatus {
    #[default]
    Pending,
    Active,
    Inactive,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "account_type", rename_all = "snake_case")]
#[ts(export)]
pub enum AccountType {
    #[default]
    Mandatory,
    Voluntary,
    Fixed,
}

/// LoanStatus
///
/// `pending -> {approved, rejected}`, `approved -> active` (disbursement),
/// `active -> repaid` once every installment is paid. See `crate::loans`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[ts(export)]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Active,
    Repaid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Active => "active",
            LoanStatus::Repaid => "repaid",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "repayment_status", rename_all = "snake_case")]
#[ts(export)]
pub enum RepaymentStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionType {
    #[default]
    Deposit,
    Withdrawal,
}

// --- Core Entities (Mapped to Database) ---

/// User
///
/// The identity record stored in `users`. The id is issued by the external auth service,
/// so the row mirrors `auth.users`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Member
///
/// Cooperative membership profile. Self-registered members are linked to a `User`;
/// members enrolled at the counter by staff have no login (`user_id` is `None`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Member {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub member_number: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    #[ts(type = "string | null")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub next_of_kin: Option<String>,
    pub next_of_kin_phone: Option<String>,
    pub employment_status: Option<String>,
    pub membership_status: MembershipStatus,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub share_capital: BigDecimal,
    pub shares_held: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct SavingsAccount {
    pub id: Uuid,
    pub member_id: Uuid,
    pub account_number: String,
    pub account_type: AccountType,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub balance: BigDecimal,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Loan {
    pub id: Uuid,
    pub member_id: Uuid,
    pub loan_number: String,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub loan_amount: BigDecimal,
    /// Annual rate in percent.
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub interest_rate: BigDecimal,
    /// Number of monthly installments.
    pub loan_period: i32,
    pub purpose: String,
    pub collateral_description: Option<String>,
    pub status: LoanStatus,
    pub approved_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub approved_at: Option<DateTime<Utc>>,
    pub disbursed_by: Option<Uuid>,
    #[ts(type = "string | null")]
    pub disbursed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LoanRepayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub installment_number: i32,
    #[ts(type = "string")]
    pub due_date: NaiveDate,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub amount_due: BigDecimal,
    pub status: RepaymentStatus,
    #[ts(type = "string | null")]
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Transaction
///
/// Immutable ledger row. `balance_after` is the account balance right after this movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Transaction {
    pub id: Uuid,
    pub member_id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub amount: BigDecimal,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub balance_after: BigDecimal,
    pub reference_number: String,
    pub description: String,
    pub processed_by: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Joined Views ---

/// MemberSummary
///
/// Row of the staff member directory: the membership joined with its (optional) login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct MemberSummary {
    pub member_id: Uuid,
    pub user_id: Option<Uuid>,
    pub member_number: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub membership_status: MembershipStatus,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub share_capital: BigDecimal,
    pub shares_held: i32,
    /// Login activation flag; `None` for members without a login.
    pub is_active: Option<bool>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LoanWithMember {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub member_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AccountWithMember {
    #[sqlx(flatten)]
    pub account: SavingsAccount,
    pub member_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LedgerEntry {
    #[sqlx(flatten)]
    pub transaction: Transaction,
    pub member_number: String,
}

/// AuditLogEntry
///
/// Auditor-facing projection of `AuditLog`, with the acting user's email resolved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub ip_address: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub user_email: String,
}

/// PortfolioTotals
///
/// All aggregate counters the dashboards and reports draw from, computed in one call.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct PortfolioTotals {
    pub total_members: i64,
    pub total_loans: i64,
    pub pending_loans: i64,
    pub active_loans: i64,
    pub total_savings: BigDecimal,
    pub total_share_capital: BigDecimal,
    pub total_shares_held: i64,
    pub total_transactions: i64,
    pub total_audit_logs: i64,
    pub recent_audit_logs: i64,
}

// --- Repository Inputs (internal) ---

/// Identity row to insert alongside a self-registered member or by an administrator.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub next_of_kin: Option<String>,
    pub next_of_kin_phone: Option<String>,
    pub employment_status: Option<String>,
    pub membership_status: MembershipStatus,
    pub share_capital: BigDecimal,
    pub shares_held: i32,
}

/// Result of creating a member together with its mandatory savings account.
#[derive(Debug, Clone)]
pub struct MemberRegistration {
    pub user: Option<User>,
    pub member: Member,
    pub account: SavingsAccount,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub member_id: Uuid,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub loan_period: i32,
    pub purpose: String,
    pub collateral_description: Option<String>,
}

/// One installment of a repayment schedule, before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledInstallment {
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub amount_due: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct LoanApproval {
    pub loan_id: Uuid,
    pub approved_by: Uuid,
    pub approved_at: DateTime<Utc>,
    pub loan_amount: BigDecimal,
    pub schedule: Vec<ScheduledInstallment>,
}

/// A deposit or withdrawal against a member's mandatory account.
#[derive(Debug, Clone)]
pub struct CashMovement {
    pub member_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: String,
    pub processed_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub action: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Self-registration payload (POST /api/auth/register). The password is only passed through
/// to the external auth service and never persisted or logged by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// Defaults to the configured minimum when omitted.
    #[validate(range(min = 0, message = "Shares held cannot be negative"))]
    pub shares_held: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// EnrollMemberRequest
///
/// Counter enrolment by staff (POST /api/members/register). Field names follow the
/// front-end form, which uses snake_case here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
pub struct EnrollMemberRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    #[ts(type = "string | null")]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub next_of_kin: Option<String>,
    pub next_of_kin_phone: Option<String>,
    pub employment_status: Option<String>,
    #[validate(range(min = 0, message = "Shares held cannot be negative"))]
    pub shares_held: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActivateMemberRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[ts(export)]
pub struct ApplyLoanRequest {
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub loan_amount: BigDecimal,
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub interest_rate: Option<BigDecimal>,
    #[validate(range(min = 1, max = 360, message = "Loan period must be between 1 and 360 months"))]
    pub loan_period: i32,
    #[validate(length(min = 1, message = "Loan purpose is required"))]
    pub purpose: String,
    pub collateral_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApproveLoanRequest {
    pub loan_id: Uuid,
    pub approved: bool,
    /// Optional override of the requested amount.
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub approval_amount: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RejectLoanRequest {
    pub loan_id: Uuid,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DisburseLoanRequest {
    pub loan_id: Uuid,
    #[ts(type = "string | null")]
    pub disbursement_date: Option<DateTime<Utc>>,
}

/// CashMovementRequest
///
/// Body of both the deposit and the withdrawal endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashMovementRequest {
    pub member_id: Uuid,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub amount: BigDecimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ToggleUserStatusRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRoleRequest {
    pub user_id: Uuid,
    pub role: Role,
}

// --- Response Payloads (Output Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegistrationResponse {
    pub success: bool,
    pub user: User,
    pub member: Member,
    pub account: SavingsAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct EnrollmentResponse {
    pub success: bool,
    pub member: Member,
    pub account: SavingsAccount,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CurrentUserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProfileResponse {
    pub user: User,
    pub member: Option<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MemberResponse {
    pub success: bool,
    pub member: Member,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MembersResponse {
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoanResponse {
    pub success: bool,
    pub loan: Loan,
    pub message: String,
}

/// LoanDecisionResponse
///
/// Approval outcome. `repayments` is empty unless the loan was approved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoanDecisionResponse {
    pub success: bool,
    pub loan: Loan,
    pub repayments: Vec<LoanRepayment>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoansResponse {
    pub loans: Vec<Loan>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoanListResponse {
    pub loans: Vec<LoanWithMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApprovalsResponse {
    pub approvals: Vec<LoanWithMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RepaymentsResponse {
    pub repayments: Vec<LoanRepayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RepaymentResponse {
    pub success: bool,
    pub repayment: LoanRepayment,
    pub loan: Loan,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SavingsResponse {
    pub savings: Vec<SavingsAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountWithMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LedgerResponse {
    pub transactions: Vec<LedgerEntry>,
}

/// CashMovementResponse
///
/// Outcome of a deposit or withdrawal. Keys are camelCase to match the cashier screens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashMovementResponse {
    pub success: bool,
    pub transaction: Transaction,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub new_balance: BigDecimal,
    pub reference_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SettingsResponse {
    pub settings: crate::config::SaccoSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLogEntry>,
}

// --- Dashboard & Report Schemas (Output) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminReportStats {
    pub total_members: i64,
    pub total_loans: i64,
    pub active_loans: i64,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub total_savings: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminReportResponse {
    pub stats: AdminReportStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManagerReport {
    pub total_members: i64,
    pub total_loans: i64,
    #[ts(type = "string")]
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ManagerReportResponse {
    pub reports: ManagerReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_members: i64,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub total_savings: BigDecimal,
    pub total_loans: i64,
    pub active_loans: i64,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub total_share_capital: BigDecimal,
    pub total_shares_held: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManagerDashboardStats {
    pub member_count: i64,
    pub pending_loans: i64,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub total_savings: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditorDashboardStats {
    pub total_audit_logs: i64,
    pub total_members: i64,
    pub total_transactions: i64,
    pub total_loans: i64,
    pub recent_activity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MemberDashboardStats {
    pub member: Member,
    #[schema(value_type = String)]
    #[ts(type = "string")]
    pub balance: BigDecimal,
}
