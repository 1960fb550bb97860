mod common;

use axum::http::StatusCode;
use common::{
    create_legacy_user, generate_uid, generate_unique_email, register, send, setup_test_app,
    token_for,
};
use rollbook_models::Role;
use serde_json::json;

#[tokio::test]
async fn test_register_student_gets_first_code() {
    let app = setup_test_app();

    let (first, _) = register(&app.router, "student").await;
    assert_eq!(first["role"], "student");
    assert_eq!(first["studentCode"], "SU-001");
    assert!(first["authUid"].as_str().unwrap().starts_with("uid-"));

    let (second, _) = register(&app.router, "student").await;
    assert_eq!(second["studentCode"], "SU-002");
}

#[tokio::test]
async fn test_register_defaults_to_student_and_uses_token_email() {
    let app = setup_test_app();
    let uid = generate_uid();
    let email = generate_unique_email();
    let token = token_for(&uid, Some(&email));

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "Grace", "lastName": "Hopper" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "student");
    assert_eq!(body["email"], email);
    assert_eq!(body["authUid"], uid);
    assert_eq!(body["studentCode"], "SU-001");
}

#[tokio::test]
async fn test_register_teacher_gets_no_code() {
    let app = setup_test_app();

    let (teacher, _) = register(&app.router, "teacher").await;
    assert_eq!(teacher["role"], "teacher");
    assert!(teacher["studentCode"].is_null());

    // Teachers do not consume numbers.
    let (student, _) = register(&app.router, "student").await;
    assert_eq!(student["studentCode"], "SU-001");
}

#[tokio::test]
async fn test_register_as_admin_is_forbidden() {
    let app = setup_test_app();
    let token = token_for(&generate_uid(), Some(&generate_unique_email()));

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "Eve", "lastName": "Admin", "role": "admin" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Admin"));
}

#[tokio::test]
async fn test_register_twice_conflicts() {
    let app = setup_test_app();
    let (_, token) = register(&app.router, "student").await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "Again", "lastName": "User" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_with_taken_email_conflicts() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let first = token_for(&generate_uid(), Some(&email));
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&first),
        Some(json!({ "firstName": "One", "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = token_for(&generate_uid(), Some(&email));
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&second),
        Some(json!({ "firstName": "Two", "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_register_without_token_is_unauthorized() {
    let app = setup_test_app();

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "firstName": "No", "lastName": "Token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some("not-a-jwt"),
        Some(json!({ "firstName": "Bad", "lastName": "Token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let app = setup_test_app();
    let token = token_for(&generate_uid(), Some(&generate_unique_email()));

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "", "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "firstName is required");

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "A", "lastName": "B", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_needs_an_email_from_somewhere() {
    let app = setup_test_app();
    let token = token_for(&generate_uid(), None);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&token),
        Some(json!({ "firstName": "No", "lastName": "Email" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "email is required");
}

#[tokio::test]
async fn test_sync_returns_registered_record() {
    let app = setup_test_app();
    let (created, token) = register(&app.router, "student").await;

    let (status, body) = send(&app.router, "POST", "/api/auth/sync", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], false);
    assert_eq!(body["user"]["id"], created["id"]);
}

#[tokio::test]
async fn test_sync_links_legacy_record_by_email() {
    let app = setup_test_app();
    let email = generate_unique_email();
    let legacy = create_legacy_user(&app.registry, &email, Role::Student, Some("SU-007")).await;

    let uid = generate_uid();
    let token = token_for(&uid, Some(&email.to_uppercase()));

    let (status, body) = send(&app.router, "POST", "/api/auth/sync", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], true);
    assert_eq!(body["user"]["id"], legacy.id.to_string());
    assert_eq!(body["user"]["authUid"], uid);
    assert_eq!(body["user"]["studentCode"], "SU-007");

    // Once linked, the UID match wins.
    let (status, body) = send(&app.router, "POST", "/api/auth/sync", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["linked"], false);

    let (status, me) = send(&app.router, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], legacy.id.to_string());
}

#[tokio::test]
async fn test_sync_email_owned_by_other_identity_conflicts() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let owner = token_for(&generate_uid(), Some(&email));
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/auth/register",
        Some(&owner),
        Some(json!({ "firstName": "Owner", "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let intruder = token_for(&generate_uid(), Some(&email));
    let (status, _) = send(&app.router, "POST", "/api/auth/sync", Some(&intruder), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sync_unknown_identity_is_not_found() {
    let app = setup_test_app();

    let token = token_for(&generate_uid(), Some(&generate_unique_email()));
    let (status, _) = send(&app.router, "POST", "/api/auth/sync", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let no_email = token_for(&generate_uid(), None);
    let (status, _) = send(&app.router, "POST", "/api/auth/sync", Some(&no_email), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_requires_linked_identity() {
    let app = setup_test_app();

    let (status, _) = send(&app.router, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = token_for(&generate_uid(), Some(&generate_unique_email()));
    let (status, _) = send(&app.router, "GET", "/api/auth/me", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (created, token) = register(&app.router, "teacher").await;
    let (status, body) = send(&app.router, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}
