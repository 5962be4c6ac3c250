//! Caller authentication
//!
//! Token introspection is delegated to an external identity provider. The
//! service only needs the subject it returns, which becomes the owner of any
//! asset the caller uploads.

pub mod oidc;

use crate::error::HttpAppError;
use achminup_core::Identity;
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};

pub use oidc::OidcUserInfoClient;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OIDC responded with non-200 status {0}")]
    Rejected(u16),

    #[error("OIDC response has no string 'sub'")]
    MissingSubject,

    #[error("Failed to build identity provider client: {0}")]
    Client(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the raw `Authorization` header value to an identity.
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError>;
}

/// Authenticate the request described by `headers`.
pub async fn authenticate(
    provider: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<Identity, HttpAppError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let identity = provider.authenticate(authorization).await?;
    tracing::debug!(user = %identity, "Authenticated");
    Ok(identity)
}
