//! Bearer-credential authentication backed by an external identity service.

mod http;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::{error::AppError, state::SharedState};

pub use self::http::HttpIdentityResolver;

/// Identity returned by the resolver for a valid credential.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    /// Stable opaque user identifier.
    pub id: String,
    /// Email on file with the identity service, when it shares one.
    pub email: Option<String>,
}

/// Failures while turning a bearer credential into a user identity.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable bearer credential was supplied.
    #[error("missing bearer credential")]
    MissingCredential,
    /// The credential was supplied but rejected.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    /// The identity service answered with an unexpected status.
    #[error("identity service returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),
    /// The identity service could not be reached at all.
    #[error("identity service unreachable")]
    Unreachable(#[source] reqwest::Error),
}

/// Resolves bearer credentials to user identities.
pub trait IdentityResolver: Send + Sync {
    /// Look up the user behind a bearer token.
    fn resolve(&self, token: String) -> BoxFuture<'static, Result<ResolvedUser, AuthError>>;
}

/// Extractor rejecting requests that lack a resolvable bearer credential.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    /// Identifier of the caller.
    pub id: String,
    /// Email the identity service knows for the caller, if any.
    pub email: Option<String>,
}

impl FromRequestParts<SharedState> for AuthedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.identity().resolve(token.to_owned()).await?;
        Ok(AuthedUser {
            id: user.id,
            email: user.email,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;
    let value = header.to_str().map_err(|_| {
        AuthError::InvalidCredential("authorization header is not valid UTF-8".into())
    })?;
    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::InvalidCredential("authorization header is not a bearer credential".into())
    })?;
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}
