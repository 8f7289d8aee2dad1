mod auth;
mod careers;
mod error;

use axum::Router;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::careers::CareersClient;
use crate::rate_limit::RateLimitConfig;
use crate::session::SessionManager;

pub use auth::AuthState;
pub use careers::CareersState;
pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(
    session: SessionManager,
    authenticator: Arc<dyn Authenticator>,
    careers: CareersClient,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = AuthState {
        session,
        authenticator: authenticator.clone(),
        rate_limit_config,
    };

    let careers_state = CareersState {
        client: careers,
        authenticator,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .merge(careers::router(careers_state))
}
