mod common;

use axum::http::StatusCode;
use careerlink::rate_limit::RateLimits;
use common::{PASSWORD, TestApp, body_bytes, body_json};
use serde_json::json;

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::new().await;

    let response = app.register("alice", "alice@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["email"], "alice@example.com");
    assert!(json["id"].as_i64().is_some());
    assert_eq!(json.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn test_register_never_returns_secret() {
    let app = TestApp::new().await;

    let response = app.register("alice", "alice@example.com").await;
    let body = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(!body.contains(PASSWORD));
    assert!(!body.contains("password"));
    assert!(!body.contains("$argon2"));

    let stored = app
        .db
        .users()
        .get_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, PASSWORD);
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;

    let response = app.register("alice", "shared@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.register("bob", "shared@example.com").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({"error": "This email is already in use."}));
    assert!(!body.contains("$argon2"));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new().await;

    app.register("alice", "a@example.com").await;
    let response = app.register("alice", "b@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(
        json["fields"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_register_usernames_differ_by_case() {
    let app = TestApp::new().await;

    let response = app.register("alice", "a@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app.register("Alice", "b@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_reports_all_field_errors() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/auth/register/",
            json!({"username": "no spaces", "email": "not-an-email"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid input");
    let fields = json["fields"].as_object().unwrap();
    assert!(fields.contains_key("username"));
    assert!(fields.contains_key("email"));
    assert_eq!(fields["password"][0], "This field is required.");
}

#[tokio::test]
async fn test_register_whitespace_password_is_blank() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/auth/register/",
            json!({"username": "bob", "email": "bob@example.com", "password": "   "}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(
        json["fields"],
        json!({"password": ["This field may not be blank."]})
    );
    assert!(app.db.users().get_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_register_rejects_non_object_body() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/auth/register/", json!(["alice"]), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_json(response).await["fields"]["non_field_errors"]
            .as_array()
            .is_some()
    );
}

#[tokio::test]
async fn test_register_long_username() {
    let app = TestApp::new().await;

    let response = app.register(&"a".repeat(151), "a@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.register(&"a".repeat(150), "a@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_rate_limited() {
    let app = TestApp::with_config(|config| {
        config.rate_limits = RateLimits {
            login_per_minute: 1000,
            register_per_minute: 1,
        };
    })
    .await;

    let response = app.register("alice", "alice@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.register("bob", "bob@example.com").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
