use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::{ApiResult, validate_money};
use crate::{
    AppState,
    audit::{self, ClientIp},
    auth::AuthUser,
    error::AppError,
    extract::Payload,
    models::{
        CurrentUserResponse, MembershipStatus, NewMember, NewUser, RegisterRequest,
        RegistrationResponse, Role,
    },
    policy::Permission,
    repository::RepoError,
};

/// Falls back to the part of the address before `@`.
pub(crate) fn display_name(full_name: Option<String>, email: &str) -> String {
    full_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

/// The identity provider already holds `id` but no `users` row references it.
pub(crate) fn warn_orphaned_identity(id: Uuid, email: &str, err: &RepoError) {
    tracing::warn!(
        identity_id = %id,
        email,
        error = %err,
        "identity provider account created without a local user row"
    );
}

/// register
///
/// [Public Route] Self-registration of a new cooperative member.
///
/// *Flow*: checks the share purchase against the configured minimum, signs the credentials up
/// with the identity provider, then creates the `users` row, the active `members` row and the
/// mandatory savings account in one repository call.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Invalid input or rejected by the identity provider", body = crate::error::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    let settings = &state.config.settings;

    let shares_held = payload.shares_held.unwrap_or(settings.min_shares);
    if shares_held < settings.min_shares {
        return Err(AppError::Validation(settings.minimum_shares_message()));
    }
    let share_capital = settings.share_capital_for(shares_held);
    validate_money(&share_capital, "Share capital")?;

    let user_id = state
        .identity
        .sign_up(&payload.email, &payload.password)
        .await?;

    let email = payload.email.clone();
    let full_name = display_name(payload.full_name, &payload.email);
    let new_user = NewUser {
        id: user_id,
        email: payload.email,
        full_name: full_name.clone(),
        phone: payload.phone.clone(),
        role: Role::Member,
    };
    let new_member = NewMember {
        full_name: Some(full_name),
        phone: payload.phone,
        membership_status: MembershipStatus::Active,
        share_capital,
        shares_held,
        ..Default::default()
    };

    let registration = state
        .repo
        .create_member(Some(new_user), new_member)
        .await
        .inspect_err(|e| warn_orphaned_identity(user_id, &email, e))?;
    let user = registration
        .user
        .ok_or_else(|| AppError::Internal("registration returned no user row".to_string()))?;

    tracing::info!(
        user_id = %user.id,
        member_number = %registration.member.member_number,
        "member self-registered"
    );
    audit::record(
        &state.repo,
        user.id,
        &ip,
        "register_member",
        "members",
        Some(registration.member.id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            success: true,
            user,
            member: registration.member,
            account: registration.account,
        }),
    ))
}

/// current_user
///
/// [Authenticated Route] Returns the caller's identity record.
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<CurrentUserResponse> {
    auth.require(Permission::ViewOwnProfile)?;

    let user = state
        .repo
        .get_user(auth.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    Ok(Json(CurrentUserResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(display_name(None, "abebe@sacco.test"), "abebe");
        assert_eq!(display_name(Some("  ".into()), "abebe@sacco.test"), "abebe");
        assert_eq!(
            display_name(Some("Abebe Kebede".into()), "abebe@sacco.test"),
            "Abebe Kebede"
        );
    }

    #[test]
    fn credentials_need_an_address_and_a_password() {
        use validator::Validate;

        let valid = RegisterRequest {
            email: "abebe@sacco.test".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        for (email, password) in [("abebe", "secret"), ("a@", "secret"), ("abebe@sacco.test", "")] {
            let req = RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
                ..Default::default()
            };
            assert!(req.validate().is_err(), "{email:?}/{password:?} should be refused");
        }
    }
}
