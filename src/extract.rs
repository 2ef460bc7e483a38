//! Request extractors whose rejections render as `AppError`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// Payload
///
/// `Json<T>` that also runs the body's `validator` rules. Both malformed JSON and failed
/// rules become `AppError::Validation`, so every bad body gets the same `{"error": ...}`
/// shape as every other failure instead of axum's plain-text response.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| match e {
                JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
                JsonRejection::JsonSyntaxError(e) => AppError::Validation(e.body_text()),
                JsonRejection::MissingJsonContentType(e) => AppError::Validation(e.body_text()),
                _ => AppError::Validation("Invalid JSON body".to_string()),
            })?;

        value.validate()?;

        Ok(Payload(value))
    }
}

/// PathParam
///
/// `Path<T>` with an `AppError` rejection, e.g. for a malformed UUID segment.
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        Ok(PathParam(inner))
    }
}

/// QueryParams
///
/// `Query<T>` with an `AppError` rejection.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        Ok(QueryParams(inner))
    }
}
