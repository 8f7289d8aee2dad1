use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, json_object};
use crate::auth::{Auth, Authenticator};
use crate::careers::{CareerPost, CareersClient, CreatePost, DeleteOutcome, UpdatePost};
use crate::impl_has_auth_backend;
use crate::validation::FieldErrors;

#[derive(Clone)]
pub struct CareersState {
    pub client: CareersClient,
    pub authenticator: Arc<dyn Authenticator>,
}

impl_has_auth_backend!(CareersState);

pub fn router(state: CareersState) -> Router {
    Router::new()
        .route("/careers/", get(list_posts).post(create_post))
        .route("/careers/{id}/", patch(update_post).delete(delete_post))
        .with_state(state)
}

/// Post ids are non-negative integers.
fn post_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    match id {
        Ok(Path(id)) if id >= 0 => Ok(id),
        _ => Err(ApiError::Validation(FieldErrors::single(
            "id",
            "A valid integer is required.",
        ))),
    }
}

fn status_or_ok(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::OK)
}

async fn list_posts(State(state): State<CareersState>) -> Result<Json<Vec<CareerPost>>, ApiError> {
    let posts = state.client.list().await.upstream_err("Fetch posts")?;
    Ok(Json(posts))
}

async fn create_post(
    State(state): State<CareersState>,
    Auth(caller): Auth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_object(body)?;
    let post = CreatePost::from_payload(&payload)?.owned_by(&caller.username);

    let response = state
        .client
        .create(&post)
        .await
        .upstream_err("Create post")?;

    info!(username = %caller.username, "Post created");
    Ok((status_or_ok(response.status), Json(response.body)))
}

async fn update_post(
    State(state): State<CareersState>,
    Auth(caller): Auth,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = post_id(id)?;
    let payload = json_object(body)?;
    let update = UpdatePost::from_payload(&payload)?;

    let response = state
        .client
        .update(id, &update)
        .await
        .upstream_err("Update post")?;

    info!(username = %caller.username, id, "Post updated");
    Ok((status_or_ok(response.status), Json(response.body)))
}

async fn delete_post(
    State(state): State<CareersState>,
    Auth(caller): Auth,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = post_id(id)?;

    let outcome = state.client.delete(id).await.upstream_err("Delete post")?;

    info!(username = %caller.username, id, "Post deleted");
    Ok(match outcome {
        DeleteOutcome::Deleted => {
            Json(json!({"message": "Post deleted successfully"})).into_response()
        }
        DeleteOutcome::NoContent => StatusCode::NO_CONTENT.into_response(),
    })
}
