//! Cookie-relayed JWT authentication.
//!
//! Per-session lifecycle: `Anonymous -> Authenticated` on login,
//! `Authenticated -> Authenticated` on refresh (new access token only), and
//! back to `Anonymous` on logout or once both tokens have expired. The gate
//! only verifies access tokens; it never refreshes them.

mod authenticator;
mod cookie;
mod errors;
mod extractors;
mod state;
mod types;

pub use authenticator::{Authenticator, JwtAuthenticator};
pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, expired_cookie, get_cookie, session_cookie,
};
pub use errors::{AuthErrorKind, AuthRejection};
pub use extractors::{Auth, OptionalAuth};
pub use state::HasAuthBackend;
pub use types::CallerIdentity;
