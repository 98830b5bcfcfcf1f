//! Request extractors.
//!
//! The user-session identity is an explicit per-request value carried in the
//! `X-User-Session` header, never ambient state. [`SessionIdentity`] demands
//! it; [`MaybeSessionIdentity`] admits anonymous reads (an aggregate without
//! an identity just has no personal likes).

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use playline_models::UserSessionId;

use crate::error::ApiError;

/// Header carrying the user-session identity.
pub const USER_SESSION_HEADER: &str = "x-user-session";

/// A required user-session identity.
pub struct SessionIdentity(pub UserSessionId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_identity(parts)
            .map(Self)
            .ok_or_else(|| ApiError::unauthorized("missing X-User-Session header"))
    }
}

/// An optional user-session identity.
pub struct MaybeSessionIdentity(pub Option<UserSessionId>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeSessionIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(header_identity(parts)))
    }
}

fn header_identity(parts: &Parts) -> Option<UserSessionId> {
    parts
        .headers
        .get(USER_SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(UserSessionId::from_string)
}
