use axum::{Json, extract::State, http::StatusCode};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;

use super::{ApiResult, caller_member, validate_money};
use crate::{
    AppState,
    audit::{self, ClientIp},
    auth::AuthUser,
    error::AppError,
    extract::{Payload, QueryParams},
    models::{
        ActivateMemberRequest, EnrollMemberRequest, EnrollmentResponse, LoansResponse,
        MemberDashboardStats, MemberResponse, MembersResponse, MembershipStatus, NewMember,
        ProfileResponse, SavingsResponse, TransactionsResponse, UpdateProfileRequest,
    },
    policy::Permission,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// PageParams
///
/// `limit`/`offset` paging for the member's own ledger.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct PageParams {
    /// Defaults to 50, clamped to 1..=500.
    pub limit: Option<i64>,
    /// Defaults to 0.
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// get_profile
///
/// [Authenticated Route] The caller's login together with their membership, if any.
#[utoipa::path(
    get,
    path = "/api/members/profile",
    responses((status = 200, description = "Profile", body = ProfileResponse))
)]
pub async fn get_profile(auth: AuthUser, State(state): State<AppState>) -> ApiResult<ProfileResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let user = state
        .repo
        .get_user(auth.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let member = state.repo.get_member_by_user(auth.id).await?;

    Ok(Json(ProfileResponse { user, member }))
}

/// update_profile
///
/// [Authenticated Route] Partial update of name, phone and address. Absent fields are kept.
#[utoipa::path(
    put,
    path = "/api/members/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = ProfileResponse))
)]
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<UpdateProfileRequest>,
) -> ApiResult<ProfileResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let (user, member) = state
        .repo
        .update_profile(auth.id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    audit::record(&state.repo, auth.id, &ip, "update_profile", "users", Some(user.id)).await;

    Ok(Json(ProfileResponse { user, member }))
}

/// get_my_loans
///
/// [Authenticated Route] Loans of the caller's membership; empty without one.
#[utoipa::path(
    get,
    path = "/api/members/loans",
    responses((status = 200, description = "Own loans", body = LoansResponse))
)]
pub async fn get_my_loans(auth: AuthUser, State(state): State<AppState>) -> ApiResult<LoansResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let loans = match state.repo.get_member_by_user(auth.id).await? {
        Some(member) => state.repo.list_member_loans(member.id).await?,
        None => Vec::new(),
    };
    Ok(Json(LoansResponse { loans }))
}

/// get_my_savings
///
/// [Authenticated Route] Savings accounts of the caller's membership; empty without one.
#[utoipa::path(
    get,
    path = "/api/members/savings",
    responses((status = 200, description = "Own savings accounts", body = SavingsResponse))
)]
pub async fn get_my_savings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<SavingsResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let savings = match state.repo.get_member_by_user(auth.id).await? {
        Some(member) => state.repo.list_member_accounts(member.id).await?,
        None => Vec::new(),
    };
    Ok(Json(SavingsResponse { savings }))
}

/// get_my_transactions
///
/// [Authenticated Route] The caller's ledger, newest first.
#[utoipa::path(
    get,
    path = "/api/members/transactions",
    params(PageParams),
    responses((status = 200, description = "Own transactions", body = TransactionsResponse))
)]
pub async fn get_my_transactions(
    auth: AuthUser,
    State(state): State<AppState>,
    QueryParams(params): QueryParams<PageParams>,
) -> ApiResult<TransactionsResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let (limit, offset) = params.bounds();
    let transactions = match state.repo.get_member_by_user(auth.id).await? {
        Some(member) => {
            state
                .repo
                .list_member_transactions(member.id, limit, offset)
                .await?
        }
        None => Vec::new(),
    };
    Ok(Json(TransactionsResponse { transactions }))
}

/// get_member_stats
///
/// [Member Dashboard] The caller's membership and mandatory savings balance.
#[utoipa::path(
    get,
    path = "/api/dashboard/member/stats",
    responses(
        (status = 200, description = "Member dashboard", body = MemberDashboardStats),
        (status = 404, description = "Caller has no membership")
    )
)]
pub async fn get_member_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<MemberDashboardStats> {
    auth.require(Permission::ViewMemberDashboard)?;

    let member = caller_member(&state.repo, auth.id).await?;
    let balance = state
        .repo
        .get_mandatory_account(member.id)
        .await?
        .map(|account| account.balance)
        .unwrap_or_else(BigDecimal::zero);

    Ok(Json(MemberDashboardStats { member, balance }))
}

/// list_members
///
/// [Staff Route] The member directory.
#[utoipa::path(
    get,
    path = "/api/members",
    responses((status = 200, description = "Members", body = MembersResponse))
)]
pub async fn list_members(auth: AuthUser, State(state): State<AppState>) -> ApiResult<MembersResponse> {
    auth.require(Permission::ListMembers)?;

    let members = state.repo.list_members().await?;
    Ok(Json(MembersResponse { members }))
}

/// enroll_member
///
/// [Staff Route] Counter enrolment. The member starts `pending` and has no login; an
/// activation by staff completes the process.
#[utoipa::path(
    post,
    path = "/api/members/register",
    request_body = EnrollMemberRequest,
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn enroll_member(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<EnrollMemberRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    auth.require(Permission::EnrollMember)?;

    // The length rule only sees the raw value; a name of spaces is still blank.
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    let shares_held = payload.shares_held.unwrap_or(0);
    let share_capital = state.config.settings.share_capital_for(shares_held);
    validate_money(&share_capital, "Share capital")?;

    let new_member = NewMember {
        full_name: Some(full_name),
        phone: payload.phone,
        national_id: payload.national_id,
        date_of_birth: payload.date_of_birth,
        address: payload.address,
        next_of_kin: payload.next_of_kin,
        next_of_kin_phone: payload.next_of_kin_phone,
        employment_status: payload.employment_status,
        membership_status: MembershipStatus::Pending,
        share_capital,
        shares_held,
    };

    let registration = state.repo.create_member(None, new_member).await?;
    let member = registration.member;

    tracing::info!(
        enrolled_by = %auth.id,
        member_number = %member.member_number,
        "member enrolled at the counter"
    );
    audit::record(&state.repo, auth.id, &ip, "enroll_member", "members", Some(member.id)).await;

    let message = format!("Member {} registered successfully", member.member_number);
    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse {
            success: true,
            member,
            account: registration.account,
            message,
        }),
    ))
}

/// activate_member
///
/// [Staff Route] Sets `membership_status = active`.
#[utoipa::path(
    put,
    path = "/api/members/activate",
    request_body = ActivateMemberRequest,
    responses(
        (status = 200, description = "Activated", body = MemberResponse),
        (status = 404, description = "Unknown member")
    )
)]
pub async fn activate_member(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<ActivateMemberRequest>,
) -> ApiResult<MemberResponse> {
    auth.require(Permission::ActivateMember)?;

    let member = state
        .repo
        .set_membership_status(payload.member_id, MembershipStatus::Active)
        .await?
        .ok_or_else(|| AppError::not_found("Member"))?;

    audit::record(&state.repo, auth.id, &ip, "activate_member", "members", Some(member.id)).await;

    Ok(Json(MemberResponse {
        success: true,
        member,
        message: "Member activated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(PageParams::default().bounds(), (50, 0));
        let params = PageParams {
            limit: Some(10_000),
            offset: Some(-4),
        };
        assert_eq!(params.bounds(), (500, 0));
        let params = PageParams {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(params.bounds(), (1, 20));
    }
}
