use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use rollbook::router::init_router;
use rollbook::state::AppState;
use rollbook_auth::issue_identity_token;
use rollbook_config::{CorsConfig, IdentityConfig, StudentCodeConfig};
use rollbook_db::{MemoryRegistry, Registry, UserRegistry};
use rollbook_models::{Email, NewUser, Role, User, UserId};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub registry: Arc<MemoryRegistry>,
}

pub fn identity_config() -> IdentityConfig {
    IdentityConfig {
        secret: "integration-test-secret".to_string(),
        issuer: "rollbook-identity".to_string(),
        audience: "rollbook-dashboard".to_string(),
        token_ttl: 600,
    }
}

pub fn setup_test_app() -> TestApp {
    let registry = Arc::new(MemoryRegistry::new());
    let state = AppState::new(
        Registry::from_memory(registry.clone()),
        identity_config(),
        CorsConfig::from_list("http://localhost:5173"),
        StudentCodeConfig::default(),
    );

    TestApp {
        router: init_router(state),
        registry,
    }
}

/// App over an arbitrary registry, for tests that need to inject failures.
#[allow(dead_code)]
pub fn setup_test_app_with(registry: Registry) -> Router {
    init_router(AppState::new(
        registry,
        identity_config(),
        CorsConfig::from_list("http://localhost:5173"),
        StudentCodeConfig::default(),
    ))
}

pub fn token_for(uid: &str, email: Option<&str>) -> String {
    issue_identity_token(uid, email, None, &identity_config()).unwrap()
}

pub fn generate_unique_email() -> String {
    format!("test-{}@school.test", Uuid::new_v4())
}

pub fn generate_uid() -> String {
    format!("uid-{}", Uuid::new_v4())
}

/// Inserts an admin directly and returns it with a valid token.
#[allow(dead_code)]
pub async fn create_admin(registry: &MemoryRegistry) -> (User, String) {
    let uid = generate_uid();
    let admin = registry
        .insert_user(NewUser {
            auth_uid: uid.clone(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: Email::new(generate_unique_email()).unwrap(),
            role: Role::Admin,
            student_code: None,
        })
        .await
        .unwrap();
    (admin, token_for(&uid, None))
}

/// Stores a record that predates identity linking: no UID.
#[allow(dead_code)]
pub async fn create_legacy_user(
    registry: &MemoryRegistry,
    email: &str,
    role: Role,
    student_code: Option<&str>,
) -> User {
    let now = Utc::now();
    registry
        .import_user(User {
            id: UserId::new(),
            auth_uid: None,
            first_name: "Legacy".to_string(),
            last_name: "Record".to_string(),
            email: Email::new(email).unwrap(),
            role,
            student_code: student_code.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Registers a new identity through the API and returns the created record.
#[allow(dead_code)]
pub async fn register(router: &Router, role: &str) -> (Value, String) {
    let uid = generate_uid();
    let email = generate_unique_email();
    let token = token_for(&uid, Some(&email));
    let (status, body) = send(
        router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(serde_json::json!({
            "firstName": "Test",
            "lastName": "User",
            "role": role
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (body, token)
}
