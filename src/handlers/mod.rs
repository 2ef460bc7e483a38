//! HTTP handlers, one module per area of the portal.
//!
//! Every protected handler follows the same shape: receive the request-scoped `AuthUser`,
//! declare the required `Permission`, then perform its repository call(s).

use axum::Json;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Member, money_limit},
    repository::RepositoryState,
};

pub mod admin;
pub mod audit;
pub mod auth;
pub mod loans;
pub mod members;
pub mod reports;
pub mod transactions;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// caller_member
///
/// The membership row linked to the caller's login, or 404 "Member not found".
pub(crate) async fn caller_member(repo: &RepositoryState, user_id: Uuid) -> Result<Member, AppError> {
    repo.get_member_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Member"))
}

/// validate_money
///
/// Amounts are whole cents and must fit a `NUMERIC(14, 2)` column. `what` names the field in
/// the error message.
pub(crate) fn validate_money(amount: &BigDecimal, what: &str) -> Result<(), AppError> {
    if amount.with_scale(2) != *amount {
        return Err(AppError::Validation(format!(
            "{what} cannot have more than two decimal places"
        )));
    }
    if *amount >= money_limit() {
        return Err(AppError::Validation(format!(
            "{what} must be less than {} ETB",
            money_limit()
        )));
    }
    Ok(())
}
