//! Identity verification port.
//!
//! Session handling and credential storage are delegated to an external
//! identity provider; the API only needs bearer tokens turned into
//! [`ActorIdentity`] values.

use async_trait::async_trait;

use rotaplan_core::{ActorIdentity, AppResult};

/// Verifies bearer tokens against the external identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a bearer token and returns the identity it proves.
    ///
    /// Fails with `Unauthorized` for missing, malformed, or rejected tokens.
    async fn verify_bearer(&self, token: &str) -> AppResult<ActorIdentity>;
}
