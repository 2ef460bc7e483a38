use axum::{Json, extract::State, http::StatusCode};

use super::{
    ApiResult,
    auth::{display_name, warn_orphaned_identity},
};
use crate::{
    AppState,
    audit::{self, ClientIp},
    auth::AuthUser,
    error::AppError,
    extract::Payload,
    models::{
        CreateUserRequest, NewUser, SettingsResponse, ToggleUserStatusRequest,
        UpdateUserRoleRequest, UserResponse, UsersResponse,
    },
    policy::Permission,
};

/// list_users
///
/// [Admin Route] Every login, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Users", body = UsersResponse))
)]
pub async fn list_users(auth: AuthUser, State(state): State<AppState>) -> ApiResult<UsersResponse> {
    auth.require(Permission::ManageUsers)?;

    let users = state.repo.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// create_user
///
/// [Admin Route] Creates a staff (or member) login: signs the credentials up with the identity
/// provider and mirrors the identity into `users` with the requested role.
#[utoipa::path(
    post,
    path = "/api/admin/users/create",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserResponse),
        (status = 400, description = "Invalid input or rejected by the identity provider")
    )
)]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    auth.require(Permission::ManageUsers)?;

    let id = state
        .identity
        .sign_up(&payload.email, &payload.password)
        .await?;

    let email = payload.email.clone();
    let user = state
        .repo
        .create_user(NewUser {
            id,
            full_name: display_name(payload.full_name, &payload.email),
            email: payload.email,
            phone: payload.phone,
            role: payload.role,
        })
        .await
        .inspect_err(|e| warn_orphaned_identity(id, &email, e))?;

    tracing::info!(user_id = %user.id, role = %user.role, created_by = %auth.id, "user created");
    audit::record(&state.repo, auth.id, &ip, "create_user", "users", Some(user.id)).await;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user,
        }),
    ))
}

/// toggle_user_status
///
/// [Admin Route] Flips `is_active`. Applying it twice restores the original value.
#[utoipa::path(
    put,
    path = "/api/admin/users/toggle-status",
    request_body = ToggleUserStatusRequest,
    responses(
        (status = 200, description = "Toggled", body = UserResponse),
        (status = 400, description = "Attempt to deactivate oneself"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn toggle_user_status(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<ToggleUserStatusRequest>,
) -> ApiResult<UserResponse> {
    auth.require(Permission::ManageUsers)?;

    if payload.user_id == auth.id {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let user = state
        .repo
        .toggle_user_active(payload.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!(user_id = %user.id, is_active = user.is_active, "user status toggled");
    audit::record(&state.repo, auth.id, &ip, "toggle_user_status", "users", Some(user.id)).await;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// update_user_role
///
/// [Admin Route] Assigns a new role. Takes effect on the user's next request.
#[utoipa::path(
    put,
    path = "/api/admin/users/update-role",
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user_role(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<UpdateUserRoleRequest>,
) -> ApiResult<UserResponse> {
    auth.require(Permission::ManageUsers)?;

    let user = state
        .repo
        .set_user_role(payload.user_id, payload.role)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!(user_id = %user.id, role = %user.role, changed_by = %auth.id, "user role updated");
    audit::record(&state.repo, auth.id, &ip, "update_user_role", "users", Some(user.id)).await;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// get_settings
///
/// [Admin Route] The cooperative policy values currently in force.
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses((status = 200, description = "Settings", body = SettingsResponse))
)]
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<SettingsResponse> {
    auth.require(Permission::ViewSettings)?;

    Ok(Json(SettingsResponse {
        settings: state.config.settings.clone(),
    }))
}
