#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use careerlink::{ServerConfig, create_app, db::Database, rate_limit::RateLimits};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-with-at-least-32-chars";
pub const PASSWORD: &str = "correct horse battery";

/// One request seen by the stub careers API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub accept: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct StubState {
    responses: HashMap<Method, (u16, Value)>,
    requests: Vec<RecordedRequest>,
    delay: Option<Duration>,
}

/// Stand-in for the external careers API, served by axum on an ephemeral port.
#[derive(Clone, Default)]
pub struct StubUpstream {
    state: Arc<Mutex<StubState>>,
}

impl StubUpstream {
    /// Start serving and return the collection URL.
    pub async fn start(&self) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .fallback(stub_handler)
            .with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Url::parse(&format!("http://{}/careers/", addr)).unwrap()
    }

    /// Answer every request with `method` using `status` and `body`.
    pub fn respond(&self, method: Method, status: u16, body: Value) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(method, (status, body));
    }

    pub fn delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

async fn stub_handler(
    State(stub): State<StubUpstream>,
    method: Method,
    uri: Uri,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    let (response, delay) = {
        let mut state = stub.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: uri.path().to_string(),
            accept: headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
        (state.responses.get(&method).cloned(), state.delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match response {
        Some((204, _)) => StatusCode::NO_CONTENT.into_response(),
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

/// A sample upstream post record.
pub fn post_record(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "created_datetime": "2024-03-01T12:30:00.123456Z",
        "title": format!("Post {}", id),
        "content": "Hello there",
    })
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub upstream: StubUpstream,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build the app against a fresh in-memory database and stub upstream,
    /// letting the caller adjust the configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let upstream = StubUpstream::default();
        let url = upstream.start().await;

        let mut config = ServerConfig::new(db.clone(), TEST_SECRET.to_vec(), url);
        config.rate_limits = RateLimits {
            login_per_minute: 1000,
            register_per_minute: 1000,
        };
        adjust(&mut config);

        let router = create_app(&config).expect("Failed to build app");
        Self {
            router,
            db,
            upstream,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookies: Option<&str>) -> Response {
        self.json_request(Method::POST, uri, body, cookies).await
    }

    pub async fn json_request(
        &self,
        method: Method,
        uri: &str,
        body: Value,
        cookies: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn empty_request(&self, method: Method, uri: &str, cookies: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn register(&self, username: &str, email: &str) -> Response {
        self.post_json(
            "/api/auth/register/",
            json!({"username": username, "email": email, "password": PASSWORD}),
            None,
        )
        .await
    }

    /// Register and log in, returning a Cookie header carrying both tokens.
    pub async fn login_as(&self, username: &str) -> String {
        let response = self
            .register(username, &format!("{}@example.com", username))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self
            .post_json(
                "/api/auth/token/",
                json!({"username": username, "password": PASSWORD}),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        cookie_header(&set_cookies(&response))
    }
}

/// All Set-Cookie header values of a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The Set-Cookie value for cookie `name`, if present.
pub fn find_cookie<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    cookies
        .iter()
        .find(|c| c.starts_with(&format!("{}=", name)))
        .map(String::as_str)
}

/// Turn Set-Cookie values into a Cookie request header.
pub fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}
