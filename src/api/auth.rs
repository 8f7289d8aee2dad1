use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::post,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, json_object};
use crate::auth::{
    ACCESS_COOKIE_NAME, Auth, Authenticator, OptionalAuth, REFRESH_COOKIE_NAME, expired_cookie,
    get_cookie, session_cookie,
};
use crate::impl_has_auth_backend;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_register};
use crate::session::{LoginRequest, Registration, SessionManager};

#[derive(Clone)]
pub struct AuthState {
    pub session: SessionManager,
    pub authenticator: Arc<dyn Authenticator>,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    let login_router = Router::new()
        .route("/token/", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    let register_router = Router::new()
        .route("/register/", post(register))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_register,
        ));

    Router::new()
        .route("/token/refresh/", post(refresh))
        .route("/authenticated/", post(authenticated))
        .route("/logout/", post(logout))
        .with_state(state)
        .merge(login_router)
        .merge(register_router)
}

async fn login(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_object(body)?;
    let request = LoginRequest::from_payload(&payload)?;

    let (identity, pair) = state
        .session
        .login(request)
        .await
        .map_err(ApiError::from_login)?;

    info!(username = %identity.username, "User logged in");

    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                session_cookie(ACCESS_COOKIE_NAME, &pair.access.token, pair.access.duration),
            ),
            (
                header::SET_COOKIE,
                session_cookie(
                    REFRESH_COOKIE_NAME,
                    &pair.refresh.token,
                    pair.refresh.duration,
                ),
            ),
        ]),
        Json(json!({"success": true})),
    ))
}

async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let access = state
        .session
        .refresh(get_cookie(&headers, REFRESH_COOKIE_NAME))?;

    // The refresh cookie is left as the client holds it
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(ACCESS_COOKIE_NAME, &access.token, access.duration),
        )]),
        Json(json!({"refreshed": true})),
    ))
}

async fn authenticated(Auth(_identity): Auth) -> Json<Value> {
    Json(json!({"authenticated": true}))
}

async fn register(
    State(state): State<AuthState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_object(body)?;
    let registration = Registration::from_payload(&payload)?;

    let credential = state.session.register(registration).await?;

    Ok((StatusCode::CREATED, Json(credential)))
}

async fn logout(OptionalAuth(identity): OptionalAuth) -> impl IntoResponse {
    match identity {
        Some(identity) => info!(username = %identity.username, "User logged out"),
        None => info!("Logout without a valid session"),
    }

    (
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(ACCESS_COOKIE_NAME)),
            (header::SET_COOKIE, expired_cookie(REFRESH_COOKIE_NAME)),
        ]),
        Json(json!({"success": true})),
    )
}
