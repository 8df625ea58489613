//! HTTP-based identity verification against an external provider.
//!
//! The provider exposes a token-introspection endpoint returning the
//! subject and verified email for a valid bearer token.

use async_trait::async_trait;
use serde::Deserialize;

use rotaplan_application::IdentityVerifier;
use rotaplan_core::{ActorIdentity, AppError, AppResult};

/// Verifies bearer tokens by calling the identity provider over HTTP.
pub struct HttpIdentityVerifier {
    http_client: reqwest::Client,
    introspection_url: String,
}

impl HttpIdentityVerifier {
    /// Creates a verifier targeting the given introspection endpoint.
    #[must_use]
    pub fn new(http_client: reqwest::Client, introspection_url: String) -> Self {
        Self {
            http_client,
            introspection_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify_bearer(&self, token: &str) -> AppResult<ActorIdentity> {
        let response = self
            .http_client
            .get(&self.introspection_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("identity provider unreachable: {error}"))
            })?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized("invalid bearer token".to_owned()));
        }
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "identity provider returned status {}",
                response.status()
            )));
        }

        let claims: IntrospectionResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("identity provider returned invalid claims: {error}"))
        })?;

        let email = match claims.email_verified {
            Some(false) => None,
            _ => claims.email,
        };

        Ok(ActorIdentity::new(claims.sub, email))
    }
}
