//! HTTP client for the careers API.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, header};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::UpstreamError;
use super::schema::{CareerPost, NewPost, UpdatePost, parse_listing};

/// Default total timeout for one upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the careers client.
#[derive(Debug, Clone)]
pub struct CareersClientConfig {
    /// Collection URL, e.g. `https://dev.codeleap.co.uk/careers/`
    pub base_url: Url,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl CareersClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Status and JSON body of an accepted upstream write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

/// How the upstream acknowledged a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// 200
    Deleted,
    /// 204
    NoContent,
}

/// Client for the external careers API. Calls are never retried.
#[derive(Clone)]
pub struct CareersClient {
    http: Client,
    base_url: Url,
}

impl CareersClient {
    pub fn new(config: CareersClientConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(UpstreamError::Transport)?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(config.base_url),
        })
    }

    fn post_url(&self, id: i64) -> Result<Url, UpstreamError> {
        self.base_url
            .join(&format!("{}/", id))
            .map_err(|e| UpstreamError::InvalidResponse(format!("post URL: {}", e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Calling careers API");
        self.http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
    }

    /// Fetch all posts.
    pub async fn list(&self) -> Result<Vec<CareerPost>, UpstreamError> {
        let response = self
            .request(Method::GET, self.base_url.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "Careers API rejected listing");
            return Err(UpstreamError::Status(status));
        }

        parse_listing(response.json().await?)
    }

    /// Create a post. Accepts 200 and 201.
    pub async fn create(&self, post: &NewPost) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .request(Method::POST, self.base_url.clone())
            .json(post)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 && status != 201 {
            warn!(status, "Careers API rejected create");
            return Err(UpstreamError::Status(status));
        }

        Ok(UpstreamResponse {
            status,
            body: response.json().await?,
        })
    }

    /// Apply a partial update to post `id`. Accepts 200 only.
    pub async fn update(
        &self,
        id: i64,
        update: &UpdatePost,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .request(Method::PATCH, self.post_url(id)?)
            .json(update)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, id, "Careers API rejected update");
            return Err(UpstreamError::Status(status));
        }

        Ok(UpstreamResponse {
            status,
            body: response.json().await?,
        })
    }

    /// Delete post `id`. Accepts 200 and 204.
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, UpstreamError> {
        let response = self
            .request(Method::DELETE, self.post_url(id)?)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(DeleteOutcome::Deleted),
            204 => Ok(DeleteOutcome::NoContent),
            status => {
                warn!(status, id, "Careers API rejected delete");
                Err(UpstreamError::Status(status))
            }
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
