use axum::{Json, extract::State};
use chrono::{Duration, Utc};

use super::ApiResult;
use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{
        AdminDashboardStats, AdminReportResponse, AdminReportStats, AuditorDashboardStats,
        ManagerDashboardStats, ManagerReport, ManagerReportResponse, PortfolioTotals,
    },
    policy::Permission,
};

/// Counts everything; `recent_audit_logs` covers the last 24 hours.
async fn totals(state: &AppState) -> Result<PortfolioTotals, AppError> {
    let since = Utc::now() - Duration::hours(24);
    Ok(state.repo.get_totals(since).await?)
}

/// get_admin_reports
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    responses((status = 200, description = "Report", body = AdminReportResponse))
)]
pub async fn get_admin_reports(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AdminReportResponse> {
    auth.require(Permission::ViewAdminReports)?;

    let t = totals(&state).await?;
    Ok(Json(AdminReportResponse {
        stats: AdminReportStats {
            total_members: t.total_members,
            total_loans: t.total_loans,
            active_loans: t.active_loans,
            total_savings: t.total_savings,
        },
    }))
}

/// get_manager_reports
#[utoipa::path(
    get,
    path = "/api/manager/reports",
    responses((status = 200, description = "Report", body = ManagerReportResponse))
)]
pub async fn get_manager_reports(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ManagerReportResponse> {
    auth.require(Permission::ViewManagerReports)?;

    let t = totals(&state).await?;
    Ok(Json(ManagerReportResponse {
        reports: ManagerReport {
            total_members: t.total_members,
            total_loans: t.total_loans,
            generated_at: Utc::now(),
        },
    }))
}

/// get_admin_stats
///
/// [Admin Dashboard] Portfolio headline figures.
#[utoipa::path(
    get,
    path = "/api/dashboard/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AdminDashboardStats> {
    auth.require(Permission::ViewAdminDashboard)?;

    let t = totals(&state).await?;
    Ok(Json(AdminDashboardStats {
        total_members: t.total_members,
        total_savings: t.total_savings,
        total_loans: t.total_loans,
        active_loans: t.active_loans,
        total_share_capital: t.total_share_capital,
        total_shares_held: t.total_shares_held,
    }))
}

/// get_manager_stats
#[utoipa::path(
    get,
    path = "/api/dashboard/manager/stats",
    responses((status = 200, description = "Stats", body = ManagerDashboardStats))
)]
pub async fn get_manager_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ManagerDashboardStats> {
    auth.require(Permission::ViewManagerDashboard)?;

    let t = totals(&state).await?;
    Ok(Json(ManagerDashboardStats {
        member_count: t.total_members,
        pending_loans: t.pending_loans,
        total_savings: t.total_savings,
    }))
}

/// get_auditor_stats
#[utoipa::path(
    get,
    path = "/api/dashboard/auditor/stats",
    responses((status = 200, description = "Stats", body = AuditorDashboardStats))
)]
pub async fn get_auditor_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AuditorDashboardStats> {
    auth.require(Permission::ViewAuditorDashboard)?;

    let t = totals(&state).await?;
    Ok(Json(AuditorDashboardStats {
        total_audit_logs: t.total_audit_logs,
        total_members: t.total_members,
        total_transactions: t.total_transactions,
        total_loans: t.total_loans,
        recent_activity: t.recent_audit_logs,
    }))
}
