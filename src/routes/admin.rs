use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Nested under `/api/admin` and wrapped in the same authentication layer as the
/// authenticated router. Handlers require `ManageUsers`, `ViewSettings`, `ViewAdminReports` or
/// `ViewLedger`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- User management ---
        .route("/users", get(handlers::admin::list_users))
        .route("/users/create", post(handlers::admin::create_user))
        .route("/users/toggle-status", put(handlers::admin::toggle_user_status))
        .route("/users/update-role", put(handlers::admin::update_user_role))
        // --- Oversight ---
        .route("/settings", get(handlers::admin::get_settings))
        .route("/reports", get(handlers::reports::get_admin_reports))
        .route("/transactions", get(handlers::transactions::list_ledger))
}
