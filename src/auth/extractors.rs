//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::AuthRejection;
use super::state::HasAuthBackend;
use super::types::CallerIdentity;

/// Extractor for endpoints that require authentication.
/// Rejects with 401 before the handler runs when the access token is
/// missing, invalid or expired. Expired tokens are not refreshed here; the
/// client calls the refresh endpoint.
pub struct Auth(pub CallerIdentity);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state
            .authenticator()
            .authenticate(&parts.headers)
            .map(Auth)
            .map_err(AuthRejection::from)
    }
}

/// Optional authentication extractor - never fails, returns Option<CallerIdentity>.
/// Useful for endpoints that work both authenticated and unauthenticated.
pub struct OptionalAuth(pub Option<CallerIdentity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            state.authenticator().authenticate(&parts.headers).ok(),
        ))
    }
}
