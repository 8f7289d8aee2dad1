//! The authentication gate capability.

use std::sync::Arc;

use axum::http::{HeaderMap, header};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::AuthErrorKind;
use super::types::CallerIdentity;
use crate::jwt::TokenIssuer;

/// Resolves the caller identity of a request, or says why it cannot.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthErrorKind>;
}

/// Verifies the access token carried by an `Authorization: Bearer` header or,
/// failing that, the `access_token` cookie.
#[derive(Clone)]
pub struct JwtAuthenticator {
    issuer: Arc<dyn TokenIssuer>,
}

impl JwtAuthenticator {
    pub fn new(issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthErrorKind> {
        let token = bearer_token(headers)
            .or_else(|| get_cookie(headers, ACCESS_COOKIE_NAME))
            .ok_or(AuthErrorKind::NotAuthenticated)?;

        self.issuer.verify_access(token).map_err(|e| {
            if e.is_rejection() {
                tracing::debug!(error = %e, "Access token rejected");
                AuthErrorKind::InvalidToken
            } else {
                tracing::error!(error = %e, "Failed to verify access token");
                AuthErrorKind::Internal
            }
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtConfig;
    use axum::http::HeaderValue;

    fn gate() -> (JwtAuthenticator, Arc<JwtConfig>) {
        let jwt = Arc::new(JwtConfig::new(b"test-secret-key-for-testing"));
        (JwtAuthenticator::new(jwt.clone()), jwt)
    }

    fn bob() -> CallerIdentity {
        CallerIdentity {
            user_id: 3,
            username: "bob".to_string(),
        }
    }

    #[test]
    fn test_cookie_token_authenticates() {
        let (gate, jwt) = gate();
        let pair = jwt.issue(&bob()).unwrap();

        let mut headers = HeaderMap::new();
        let cookie = format!("access_token={}", pair.access.token);
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        assert_eq!(gate.authenticate(&headers).unwrap(), bob());
    }

    #[test]
    fn test_bearer_token_authenticates() {
        let (gate, jwt) = gate();
        let pair = jwt.issue(&bob()).unwrap();

        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", pair.access.token);
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&value).unwrap(),
        );

        assert_eq!(gate.authenticate(&headers).unwrap(), bob());
    }

    #[test]
    fn test_missing_token() {
        let (gate, _) = gate();
        assert!(matches!(
            gate.authenticate(&HeaderMap::new()),
            Err(AuthErrorKind::NotAuthenticated)
        ));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let (gate, jwt) = gate();
        let pair = jwt.issue(&bob()).unwrap();

        let mut headers = HeaderMap::new();
        let cookie = format!("access_token={}", pair.refresh.token);
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        assert!(matches!(
            gate.authenticate(&headers),
            Err(AuthErrorKind::InvalidToken)
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
