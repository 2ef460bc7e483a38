use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer, so handlers always receive the
/// caller's `AuthUser`. Which roles may call each route is decided by the handler's
/// `Permission`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        .route("/api/auth/user", get(handlers::auth::current_user))
        // --- Member self-service ---
        .route(
            "/api/members/profile",
            get(handlers::members::get_profile).put(handlers::members::update_profile),
        )
        .route("/api/members/loans", get(handlers::members::get_my_loans))
        .route("/api/members/savings", get(handlers::members::get_my_savings))
        .route(
            "/api/members/transactions",
            get(handlers::members::get_my_transactions),
        )
        // --- Member administration ---
        .route("/api/members", get(handlers::members::list_members))
        .route("/api/members/register", post(handlers::members::enroll_member))
        .route("/api/members/activate", put(handlers::members::activate_member))
        // --- Loan lifecycle ---
        .route("/api/loans", get(handlers::loans::list_loans))
        .route("/api/loans/apply", post(handlers::loans::apply_for_loan))
        .route("/api/loans/approve", put(handlers::loans::approve_loan))
        .route("/api/loans/reject", put(handlers::loans::reject_loan))
        .route("/api/loans/disburse", put(handlers::loans::disburse_loan))
        .route(
            "/api/loans/{id}/repayments",
            get(handlers::loans::get_loan_repayments),
        )
        .route(
            "/api/loans/repayments/{id}/pay",
            put(handlers::loans::pay_repayment),
        )
        .route(
            "/api/credit-officer/approvals",
            get(handlers::loans::get_approvals),
        )
        // --- Cash office ---
        .route("/api/transactions/deposit", post(handlers::transactions::deposit))
        .route("/api/transactions/withdraw", post(handlers::transactions::withdraw))
        .route(
            "/api/cso/savings",
            get(handlers::transactions::list_savings_accounts),
        )
        // --- Reporting and oversight ---
        .route("/api/manager/reports", get(handlers::reports::get_manager_reports))
        .route("/api/auditor/audit-logs", get(handlers::audit::get_audit_logs))
        // --- Dashboards ---
        .route(
            "/api/dashboard/member/stats",
            get(handlers::members::get_member_stats),
        )
        .route(
            "/api/dashboard/admin/stats",
            get(handlers::reports::get_admin_stats),
        )
        .route(
            "/api/dashboard/manager/stats",
            get(handlers::reports::get_manager_stats),
        )
        .route(
            "/api/dashboard/auditor/stats",
            get(handlers::reports::get_auditor_stats),
        )
}
