mod common;

use axum::http::StatusCode;
use common::{
    create_admin, create_legacy_user, generate_uid, generate_unique_email, register, send,
    setup_test_app, token_for,
};
use rollbook_db::UserRegistry;
use rollbook_models::{Role, UserId};
use serde_json::{Value, json};

fn new_user(role: &str) -> Value {
    json!({
        "authUid": generate_uid(),
        "firstName": "Created",
        "lastName": "ByAdmin",
        "email": generate_unique_email(),
        "role": role
    })
}

#[tokio::test]
async fn test_users_require_admin() {
    let app = setup_test_app();

    let (status, _) = send(&app.router, "GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = token_for(&generate_uid(), None);
    let (status, _) = send(&app.router, "GET", "/api/users", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, student_token) = register(&app.router, "student").await;
    let (status, body) = send(&app.router, "GET", "/api/users", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Admin role required"));

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/users",
        Some(&student_token),
        Some(new_user("student")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_creates_users() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let (status, student) = send(
        &app.router,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(new_user("student")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student["studentCode"], "SU-001");

    let (status, teacher) = send(
        &app.router,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(new_user("teacher")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(teacher["studentCode"].is_null());

    let (status, admin) = send(
        &app.router,
        "POST",
        "/api/users",
        Some(&admin_token),
        Some(new_user("admin")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(admin["role"], "admin");
    assert!(admin["studentCode"].is_null());

    let id = student["id"].as_str().unwrap();
    let (status, fetched) = send(
        &app.router,
        "GET",
        &format!("/api/users/{}", id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, student);
}

#[tokio::test]
async fn test_create_user_conflicts_and_validation() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let body = new_user("student");
    let (status, _) = send(&app.router, "POST", "/api/users", Some(&admin_token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut same_email = new_user("teacher");
    same_email["email"] = body["email"].clone();
    let (status, _) = send(&app.router, "POST", "/api/users", Some(&admin_token), Some(same_email)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut same_uid = new_user("teacher");
    same_uid["authUid"] = body["authUid"].clone();
    let (status, _) = send(&app.router, "POST", "/api/users", Some(&admin_token), Some(same_uid)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut blank_name = new_user("student");
    blank_name["lastName"] = json!("");
    let (status, _) = send(&app.router, "POST", "/api/users", Some(&admin_token), Some(blank_name)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut bad_role = new_user("student");
    bad_role["role"] = json!("principal");
    let (status, _) = send(&app.router, "POST", "/api/users", Some(&admin_token), Some(bad_role)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The failed attempts did not consume a code.
    let (status, next) = send(&app.router, "GET", "/api/student-codes/next", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["studentCode"], "SU-002");
}

#[tokio::test]
async fn test_list_users_filters_and_paginates() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    for _ in 0..3 {
        register(&app.router, "student").await;
    }
    register(&app.router, "teacher").await;

    let (status, all) = send(&app.router, "GET", "/api/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 5);
    assert_eq!(all["data"].as_array().unwrap().len(), 5);

    let (status, students) = send(
        &app.router,
        "GET",
        "/api/users?role=student",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(students["meta"]["total"], 3);
    let data = students["data"].as_array().unwrap();
    assert!(data.iter().all(|u| u["role"] == "student"));
    // Newest first.
    assert_eq!(data[0]["studentCode"], "SU-003");
    assert_eq!(data[2]["studentCode"], "SU-001");

    let (status, page) = send(
        &app.router,
        "GET",
        "/api/users?role=student&page=2&limit=2",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["studentCode"], "SU-001");
    assert_eq!(page["meta"]["page"], 2);
    assert_eq!(page["meta"]["totalPages"], 2);
    assert_eq!(page["meta"]["hasMore"], false);
}

#[tokio::test]
async fn test_role_change_frees_and_allocates_codes() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let (first, _) = register(&app.router, "student").await;
    let (second, _) = register(&app.router, "student").await;
    let (teacher, _) = register(&app.router, "teacher").await;
    assert_eq!(second["studentCode"], "SU-002");

    // Leaving the student role releases SU-001.
    let (status, demoted) = send(
        &app.router,
        "PUT",
        &format!("/api/users/{}", first["id"].as_str().unwrap()),
        Some(&admin_token),
        Some(json!({ "role": "teacher" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(demoted["role"], "teacher");
    assert!(demoted["studentCode"].is_null());

    // Joining it takes the lowest free number.
    let (status, promoted) = send(
        &app.router,
        "PUT",
        &format!("/api/users/{}", teacher["id"].as_str().unwrap()),
        Some(&admin_token),
        Some(json!({ "role": "student", "firstName": "Promoted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "student");
    assert_eq!(promoted["firstName"], "Promoted");
    assert_eq!(promoted["studentCode"], "SU-001");

    // Same role is a no-op for the code.
    let (status, unchanged) = send(
        &app.router,
        "PUT",
        &format!("/api/users/{}", second["id"].as_str().unwrap()),
        Some(&admin_token),
        Some(json!({ "role": "student" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["studentCode"], "SU-002");
}

#[tokio::test]
async fn test_update_email_conflict_and_missing_user() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let (first, _) = register(&app.router, "student").await;
    let (second, _) = register(&app.router, "student").await;

    let (status, _) = send(
        &app.router,
        "PUT",
        &format!("/api/users/{}", second["id"].as_str().unwrap()),
        Some(&admin_token),
        Some(json!({ "email": first["email"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let missing = UserId::new();
    let (status, _) = send(
        &app.router,
        "PUT",
        &format!("/api/users/{}", missing),
        Some(&admin_token),
        Some(json!({ "firstName": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/users/{}", missing),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_frees_code_for_reuse() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let (_first, _) = register(&app.router, "student").await;
    let (second, second_token) = register(&app.router, "student").await;
    let (_third, _) = register(&app.router, "student").await;

    let (status, body) = send(
        &app.router,
        "DELETE",
        &format!("/api/users/{}", second["id"].as_str().unwrap()),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    // The deleted identity is no longer linked.
    let (status, _) = send(&app.router, "GET", "/api/auth/me", Some(&second_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (reused, _) = register(&app.router, "student").await;
    assert_eq!(reused["studentCode"], "SU-002");

    let (next, _) = register(&app.router, "student").await;
    assert_eq!(next["studentCode"], "SU-004");

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/users/{}", second["id"].as_str().unwrap()),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = setup_test_app();
    let (admin, admin_token) = create_admin(&app.registry).await;

    let (status, body) = send(
        &app.router,
        "DELETE",
        &format!("/api/users/{}", admin.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("own account"));
}

#[tokio::test]
async fn test_list_users_tolerates_odd_page_values() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;
    register(&app.router, "student").await;

    let (status, body) = send(&app.router, "GET", "/api/users?page=&limit=", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app.router,
        "GET",
        "/api/users?page=9223372036854775807&limit=100",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["hasMore"], false);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app.router, "GET", "/api/change-logs?page=&limit=", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unlinked_record_cannot_become_student() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;
    let email = generate_unique_email();
    let legacy = create_legacy_user(&app.registry, &email, Role::Teacher, None).await;
    let uri = format!("/api/users/{}", legacy.id);

    let (status, body) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&admin_token),
        Some(json!({ "role": "student", "firstName": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("link an identity"));

    // Nothing was written.
    let (_, unchanged) = send(&app.router, "GET", &uri, Some(&admin_token), None).await;
    assert_eq!(unchanged["role"], "teacher");
    assert_eq!(unchanged["firstName"], "Legacy");
    assert!(unchanged["studentCode"].is_null());
    let (_, next) = send(&app.router, "GET", "/api/student-codes/next", Some(&admin_token), None).await;
    assert_eq!(next["studentCode"], "SU-001");

    // Once the owner signs in and is linked, the change goes through.
    let token = token_for(&generate_uid(), Some(&email));
    let (status, synced) = send(&app.router, "POST", "/api/auth/sync", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(synced["linked"], true);

    let (status, promoted) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&admin_token),
        Some(json!({ "role": "student" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["studentCode"], "SU-001");
}

#[tokio::test]
async fn test_reassign_leaves_unlinked_codeless_students_alone() {
    let app = setup_test_app();
    let (_, admin_token) = create_admin(&app.registry).await;

    let orphan = create_legacy_user(&app.registry, &generate_unique_email(), Role::Student, None).await;
    let holder =
        create_legacy_user(&app.registry, &generate_unique_email(), Role::Student, Some("SU-005")).await;
    let (student, _) = register(&app.router, "student").await;
    assert_eq!(student["studentCode"], "SU-001");

    let (status, report) = send(
        &app.router,
        "POST",
        "/api/student-codes/reassign",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totalStudents"], 2);

    let orphan = app.registry.find_user(orphan.id).await.unwrap().unwrap();
    assert_eq!(orphan.student_code, None);
    let holder = app.registry.find_user(holder.id).await.unwrap().unwrap();
    assert!(holder.student_code.is_some());
}
