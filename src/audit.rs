//! Audit trail writer.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{models::NewAuditLog, repository::RepositoryState};

/// ClientIp
///
/// Best guess at the caller's address: the first hop of `x-forwarded-for`, else `x-real-ip`.
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        ClientIp(forwarded.or_else(real_ip).map(str::to_string))
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp::from_headers(&parts.headers))
    }
}

/// record
///
/// Appends an audit row for a mutation that already succeeded. A failed write is logged and
/// swallowed; it never turns a completed operation into an error response.
pub async fn record(
    repo: &RepositoryState,
    actor: Uuid,
    ip: &ClientIp,
    action: &str,
    table_name: &str,
    record_id: Option<Uuid>,
) {
    let entry = NewAuditLog {
        action: action.to_string(),
        table_name: table_name.to_string(),
        record_id,
        user_id: Some(actor),
        ip_address: ip.0.clone(),
    };

    if let Err(e) = repo.record_audit(entry).await {
        tracing::error!(error = %e, action, table_name, "failed to write audit log");
    }
}
