//! Caller identity
//!
//! Token verification lives outside this crate. What arrives here is an
//! already verified [`AuthContext`], threaded explicitly through `Join` and
//! `Broadcast`. The [`AuthInterceptor`] is the glue an RPC layer runs before
//! the core: it pulls the bearer credential out of call metadata and asks an
//! [`IdentityProvider`] to verify it. Calls rejected here never reach the
//! registry.

use std::collections::HashMap;

use crate::registry::UserId;

/// Metadata key carrying the bearer credential
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Verified identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub display_name: String,
}

impl AuthContext {
    pub fn new(user_id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Authentication failure, surfaced to the client as unauthenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid credential")]
    InvalidCredential,
}

/// External identity collaborator
///
/// Implementations verify a bearer credential and return the identity it
/// belongs to.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, credential: &str) -> Result<AuthContext, AuthError>;
}

/// Fixed token table, for tests and local demos
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, AuthContext>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an identity
    pub fn with_token(mut self, token: impl Into<String>, identity: AuthContext) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn verify(&self, credential: &str) -> Result<AuthContext, AuthError> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

/// Runs ahead of the core to turn call metadata into an [`AuthContext`]
pub struct AuthInterceptor<P> {
    provider: P,
}

impl<P: IdentityProvider> AuthInterceptor<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Authenticate a call from its metadata
    ///
    /// Looks up the `authorization` entry; a leading `Bearer ` is optional.
    pub fn authenticate<'a, I>(&self, metadata: I) -> Result<AuthContext, AuthError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let raw = metadata
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(AUTHORIZATION_KEY))
            .map(|(_, value)| value.trim_start())
            .ok_or(AuthError::MissingCredential)?;

        let credential = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        match self.provider.verify(credential) {
            Ok(identity) => {
                tracing::debug!(user = %identity.user_id, "Caller authenticated");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Caller rejected");
                Err(e)
            }
        }
    }
}
