//! Static identity verification for development.
//!
//! Accepts tokens of the form `subject` or `subject:email` verbatim. Never
//! use outside local development.

use async_trait::async_trait;

use rotaplan_application::IdentityVerifier;
use rotaplan_core::{ActorIdentity, AppError, AppResult};

/// Development verifier that trusts the token contents.
#[derive(Clone)]
pub struct StaticIdentityVerifier;

impl StaticIdentityVerifier {
    /// Creates a new static verifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticIdentityVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify_bearer(&self, token: &str) -> AppResult<ActorIdentity> {
        if token.is_empty() {
            return Err(AppError::Unauthorized("empty bearer token".to_owned()));
        }

        match token.split_once(':') {
            Some((subject, email)) if !subject.is_empty() => {
                Ok(ActorIdentity::new(subject, Some(email.to_owned())))
            }
            Some(_) => Err(AppError::Unauthorized("empty token subject".to_owned())),
            None => Ok(ActorIdentity::new(token, None)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_subject_and_email() {
        let verifier = StaticIdentityVerifier::new();

        let identity = verifier
            .verify_bearer("user-1:owner@example.com")
            .await
            .unwrap();
        assert_eq!(identity.subject(), "user-1");
        assert_eq!(identity.email(), Some("owner@example.com"));

        assert!(verifier.verify_bearer("").await.is_err());
        assert!(verifier.verify_bearer(":no-subject").await.is_err());
    }
}
