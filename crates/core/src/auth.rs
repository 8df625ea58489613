use serde::{Deserialize, Serialize};

/// Caller identity derived from a verified bearer token.
///
/// Authentication itself is delegated to an external identity provider;
/// this type only carries the claims the rest of the system relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    subject: String,
    email: Option<String>,
}

impl ActorIdentity {
    /// Creates an actor identity from verified token claims.
    #[must_use]
    pub fn new(subject: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the verified email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
