use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the credentials (duplicate email, weak password, ...).
    /// The provider's message is safe to show to the caller.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered with something unreadable.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// IdentityProvider
///
/// The contract with the external authentication service that owns credentials and issues the
/// JWTs this API verifies. Swapped for `MockIdentityProvider` in tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// sign_up
    ///
    /// Registers an email/password pair and returns the identity id issued by the provider.
    /// That id becomes the primary key of the local `users` row.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError>;
}

/// SignUpResponse
///
/// GoTrue answers `/signup` with either the user object itself or a session wrapping it,
/// depending on whether email confirmation is enabled.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    id: Option<Uuid>,
    user: Option<SignUpUser>,
}

#[derive(Debug, Deserialize)]
struct SignUpUser {
    id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg.or(self.error_description).or(self.message)
    }
}

/// SupabaseIdentityClient
///
/// Calls the Supabase Auth REST endpoint with the project's anon key.
#[derive(Clone)]
pub struct SupabaseIdentityClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentityClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .json::<ProviderErrorBody>()
                .await
                .unwrap_or_default();
            tracing::warn!(%status, "identity provider rejected sign-up");
            return Err(IdentityError::Rejected(
                body.into_message()
                    .unwrap_or_else(|| "Registration was rejected".to_string()),
            ));
        }

        let body = response
            .json::<SignUpResponse>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        body.id
            .or(body.user.map(|u| u.id))
            .ok_or_else(|| IdentityError::Unavailable("sign-up response carried no user id".into()))
    }
}

/// MockIdentityProvider
///
/// Issues fresh ids without any network traffic.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    /// When true, every sign-up is rejected.
    pub should_fail: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Uuid, IdentityError> {
        if self.should_fail {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        Ok(Uuid::new_v4())
    }
}

/// IdentityState
///
/// The concrete type used to share the identity provider across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_response_accepts_both_shapes() {
        let id = Uuid::new_v4();

        let flat: SignUpResponse = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
        assert_eq!(flat.id.or(flat.user.map(|u| u.id)), Some(id));

        let wrapped: SignUpResponse = serde_json::from_value(serde_json::json!({
            "access_token": "token",
            "user": { "id": id }
        }))
        .unwrap();
        assert_eq!(wrapped.id.or(wrapped.user.map(|u| u.id)), Some(id));
    }

    #[test]
    fn provider_error_message_prefers_msg() {
        let body: ProviderErrorBody = serde_json::from_value(serde_json::json!({
            "code": 422,
            "msg": "User already registered"
        }))
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("User already registered"));
    }
}
