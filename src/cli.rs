//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::ServerConfig;
use crate::careers::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::db::Database;
use crate::jwt::{DEFAULT_ACCESS_TOKEN_SECS, DEFAULT_REFRESH_TOKEN_SECS, TokenLifetimes};
use crate::rate_limit::RateLimits;

const MIN_JWT_SECRET_LENGTH: usize = 32;

pub const DEFAULT_CAREERS_API_URL: &str = "https://dev.codeleap.co.uk/careers/";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "careerlink",
    about = "Cookie-based JWT sessions in front of a careers posts API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "careerlink.db")]
    pub database: String,

    /// Collection URL of the external careers API
    #[arg(long, env = "CAREERS_API_URL", default_value = DEFAULT_CAREERS_API_URL)]
    pub careers_api_url: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TOKEN_SECS)]
    pub access_token_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_TOKEN_SECS)]
    pub refresh_token_ttl: u64,

    /// Total timeout for one careers API call, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub upstream_timeout: u64,

    /// Connect timeout for the careers API, in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub upstream_connect_timeout: u64,

    /// Origin allowed to send credentialed cross-site requests (repeatable)
    #[arg(long = "allowed-origin", value_parser = parse_origin)]
    pub allowed_origins: Vec<HeaderValue>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn parse_origin(s: &str) -> Result<HeaderValue, String> {
    let url = Url::parse(s).map_err(|e| format!("Invalid origin {}: {}", s, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Origin must use http or https: {}", s));
    }
    if url.path() != "/" || url.query().is_some() {
        return Err(format!("Origin must not have a path or query: {}", s));
    }
    HeaderValue::from_str(s.trim_end_matches('/')).map_err(|e| e.to_string())
}

/// Initialize logging based on the specified format. `RUST_LOG` overrides
/// the default `info` level.
pub fn init_logging(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    check_secret_length(secret)
}

fn check_secret_length(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Parse and validate the careers API URL.
/// Returns None and logs an error if validation fails.
pub fn validate_careers_api_url(raw: &str) -> Option<Url> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %raw, error = %e, "Invalid careers API URL");
            return None;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        error!(url = %raw, "Careers API URL must use http or https");
        return None;
    }

    if url.host_str().is_none() {
        error!(url = %raw, "Careers API URL has no host");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String, careers_api_url: Url) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        token_lifetimes: TokenLifetimes {
            access_secs: args.access_token_ttl,
            refresh_secs: args.refresh_token_ttl,
        },
        careers_api_url,
        upstream_timeout: Duration::from_secs(args.upstream_timeout),
        upstream_connect_timeout: Duration::from_secs(args.upstream_connect_timeout),
        allowed_origins: args.allowed_origins.clone(),
        rate_limits: RateLimits::default(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
