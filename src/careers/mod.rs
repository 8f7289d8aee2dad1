//! Proxy for career posts stored by the external careers API.
//!
//! Inbound payloads are validated here before any network call; upstream
//! responses are reshaped through the read schema on the way out.

mod client;
mod error;
mod schema;

pub use client::{
    CareersClient, CareersClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, DeleteOutcome,
    UpstreamResponse,
};
pub use error::UpstreamError;
pub use schema::{CareerPost, CreatePost, NewPost, TITLE_MAX_LENGTH, UpdatePost};
