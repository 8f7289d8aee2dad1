//! Cookie parsing and `Set-Cookie` construction for the session tokens.
//!
//! Session cookies are always `HttpOnly; Secure; SameSite=None; Path=/` so the
//! browser sends them on cross-site requests from the frontend.

use axum::http::{HeaderMap, header};

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const COOKIE_ATTRIBUTES: &str = "HttpOnly; Secure; SameSite=None; Path=/";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            if let Some((key, value)) = part.trim().split_once('=') {
                let value = value.trim();
                if key.trim() == name && !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Build a `Set-Cookie` value that stores `value` for `max_age` seconds.
pub fn session_cookie(name: &str, value: &str, max_age: u64) -> String {
    format!("{}={}; {}; Max-Age={}", name, value, COOKIE_ATTRIBUTES, max_age)
}

/// Build a `Set-Cookie` value that deletes the cookie on the client.
pub fn expired_cookie(name: &str) -> String {
    format!(
        "{}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        name, COOKIE_ATTRIBUTES
    )
}
