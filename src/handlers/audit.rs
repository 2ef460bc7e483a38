use axum::{Json, extract::State};

use super::ApiResult;
use crate::{AppState, auth::AuthUser, models::AuditLogsResponse, policy::Permission};

const AUDIT_LOG_LIMIT: i64 = 100;

/// get_audit_logs
///
/// [Auditor Route] The latest audit entries with the acting user's email ("Unknown" when the
/// row has no user).
#[utoipa::path(
    get,
    path = "/api/auditor/audit-logs",
    responses((status = 200, description = "Audit trail", body = AuditLogsResponse))
)]
pub async fn get_audit_logs(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AuditLogsResponse> {
    auth.require(Permission::ViewAuditLogs)?;

    let logs = state.repo.list_audit_logs(AUDIT_LOG_LIMIT).await?;
    Ok(Json(AuditLogsResponse { logs }))
}
