pub mod api;
pub mod auth;
pub mod careers;
pub mod cli;
pub mod cors;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod validation;

use axum::Router;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

use api::create_api_router;
use auth::{Authenticator, JwtAuthenticator};
use careers::{CareersClient, CareersClientConfig, UpstreamError};
use db::Database;
use jwt::{JwtConfig, TokenIssuer, TokenLifetimes};
use rate_limit::{RateLimitConfig, RateLimits};
use session::SessionManager;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    pub token_lifetimes: TokenLifetimes,
    /// Collection URL of the external careers API
    pub careers_api_url: Url,
    pub upstream_timeout: Duration,
    pub upstream_connect_timeout: Duration,
    /// Origins allowed to make credentialed cross-site requests. Empty disables CORS.
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limits: RateLimits,
}

impl ServerConfig {
    /// Configuration with default lifetimes, timeouts and limits.
    pub fn new(db: Database, jwt_secret: Vec<u8>, careers_api_url: Url) -> Self {
        Self {
            db,
            jwt_secret,
            token_lifetimes: TokenLifetimes::default(),
            careers_api_url,
            upstream_timeout: careers::DEFAULT_TIMEOUT,
            upstream_connect_timeout: careers::DEFAULT_CONNECT_TIMEOUT,
            allowed_origins: Vec::new(),
            rate_limits: RateLimits::default(),
        }
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Result<Router, UpstreamError> {
    let jwt = Arc::new(JwtConfig::with_lifetimes(
        &config.jwt_secret,
        config.token_lifetimes,
    ));
    let issuer: Arc<dyn TokenIssuer> = jwt;
    let authenticator: Arc<dyn Authenticator> = Arc::new(JwtAuthenticator::new(issuer.clone()));

    let session = SessionManager::new(Arc::new(config.db.users()), issuer);

    let careers = CareersClient::new(CareersClientConfig {
        base_url: config.careers_api_url.clone(),
        timeout: config.upstream_timeout,
        connect_timeout: config.upstream_connect_timeout,
    })?;

    let api_router = create_api_router(
        session,
        authenticator,
        careers,
        Arc::new(RateLimitConfig::new(config.rate_limits)),
    );

    let app = Router::new().nest("/api", api_router);

    if config.allowed_origins.is_empty() {
        Ok(app)
    } else {
        Ok(app.layer(cors::cors_layer(config.allowed_origins.clone())))
    }
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config).map_err(std::io::Error::other)?;
    info!(
        address = %listener.local_addr()?,
        careers_api = %config.careers_api_url,
        "Listening"
    );
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
