use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Cross-cutting concerns.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod policy;

// Domain rules and data.
pub mod loans;
pub mod models;
pub mod numbering;

// Services behind the handlers.
pub mod identity;
pub mod repository;

pub mod handlers;
pub mod routes;

use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use identity::{IdentityState, MockIdentityProvider, SupabaseIdentityClient};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every portal endpoint, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::current_user,
        handlers::members::get_profile, handlers::members::update_profile,
        handlers::members::get_my_loans, handlers::members::get_my_savings,
        handlers::members::get_my_transactions, handlers::members::get_member_stats,
        handlers::members::list_members, handlers::members::enroll_member,
        handlers::members::activate_member,
        handlers::loans::apply_for_loan, handlers::loans::approve_loan,
        handlers::loans::reject_loan, handlers::loans::disburse_loan,
        handlers::loans::list_loans, handlers::loans::get_loan_repayments,
        handlers::loans::pay_repayment, handlers::loans::get_approvals,
        handlers::transactions::deposit, handlers::transactions::withdraw,
        handlers::transactions::list_savings_accounts, handlers::transactions::list_ledger,
        handlers::admin::list_users, handlers::admin::create_user,
        handlers::admin::toggle_user_status, handlers::admin::update_user_role,
        handlers::admin::get_settings,
        handlers::reports::get_admin_reports, handlers::reports::get_manager_reports,
        handlers::reports::get_admin_stats, handlers::reports::get_manager_stats,
        handlers::reports::get_auditor_stats,
        handlers::audit::get_audit_logs,
    ),
    components(
        schemas(
            models::Role, models::MembershipStatus, models::AccountType, models::LoanStatus,
            models::RepaymentStatus, models::TransactionType,
            models::User, models::Member, models::SavingsAccount, models::Loan,
            models::LoanRepayment, models::Transaction, models::AuditLog,
            models::MemberSummary, models::LoanWithMember, models::AccountWithMember,
            models::LedgerEntry, models::AuditLogEntry,
            models::RegisterRequest, models::UpdateProfileRequest, models::EnrollMemberRequest,
            models::ActivateMemberRequest, models::ApplyLoanRequest, models::ApproveLoanRequest,
            models::RejectLoanRequest, models::DisburseLoanRequest, models::CashMovementRequest,
            models::CreateUserRequest, models::ToggleUserStatusRequest,
            models::UpdateUserRoleRequest,
            models::RegistrationResponse, models::EnrollmentResponse,
            models::CurrentUserResponse, models::ProfileResponse, models::MemberResponse,
            models::MembersResponse, models::LoanResponse, models::LoanDecisionResponse,
            models::LoansResponse, models::LoanListResponse, models::ApprovalsResponse,
            models::RepaymentsResponse, models::RepaymentResponse, models::SavingsResponse,
            models::AccountsResponse, models::TransactionsResponse, models::LedgerResponse,
            models::CashMovementResponse, models::UsersResponse, models::UserResponse,
            models::SettingsResponse, models::AuditLogsResponse,
            models::AdminReportStats, models::AdminReportResponse, models::ManagerReport,
            models::ManagerReportResponse, models::AdminDashboardStats,
            models::ManagerDashboardStats, models::AuditorDashboardStats,
            models::MemberDashboardStats, config::SaccoSettings, error::ErrorBody,
        )
    ),
    tags(
        (name = "sacco-portal", description = "SACCO Administration Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The shared, cloneable container of services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Credential store used by registration and admin user creation.
    pub identity: IdentityState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Resolves the caller once per request. A failed resolution rejects with 401 (or 403 for a
/// deactivated account) before any handler runs; on success the `AuthUser` is stored in the
/// request extensions, where the handler-side extractor picks it up without a second lookup.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles public, authenticated and admin routes, applies middleware, registers state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/api/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
