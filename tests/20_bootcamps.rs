mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{bootcamp_body, TestApp};
use devcamper_api::types::Role;

#[tokio::test]
async fn list_wraps_records_in_envelope() {
    let app = TestApp::new();
    let admin = app.user(Role::Admin).await;
    for name in ["Devworks", "ModernTech", "Codemasters"] {
        app.bootcamp(&admin, name).await;
    }

    let (status, body) = app.get("/api/v1/bootcamps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["pagination"], json!({}));
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["courses"], json!([]));
}

#[tokio::test]
async fn create_fills_defaults_and_rejects_system_fields() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;

    let (status, body) = app
        .request(Method::POST, "/api/v1/bootcamps", Some(&publisher.token), Some(bootcamp_body("Devworks")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["photo"], json!("no-photo.jpg"));
    assert_eq!(data["jobGuarantee"], json!(false));
    assert_eq!(data["user"], json!(publisher.id.to_string()));
    assert!(data["createdAt"].is_string());

    let other = app.user(Role::Publisher).await;
    let mut forged = bootcamp_body("Forged");
    forged["averageRating"] = json!(10);
    let (status, body) = app
        .request(Method::POST, "/api/v1/bootcamps", Some(&other.token), Some(forged))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn create_requires_token_and_publisher_role() {
    let app = TestApp::new();
    let (status, _) = app
        .request(Method::POST, "/api/v1/bootcamps", None, Some(bootcamp_body("Devworks")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = app.user(Role::User).await;
    let (status, body) = app
        .request(Method::POST, "/api/v1/bootcamps", Some(&user.token), Some(bootcamp_body("Devworks")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("User role user is not authorized to access this route"));
}

#[tokio::test]
async fn publisher_may_own_one_bootcamp() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    app.bootcamp(&publisher, "Devworks").await;

    let (status, _) = app
        .request(Method::POST, "/api/v1/bootcamps", Some(&publisher.token), Some(bootcamp_body("Second")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let admin = app.user(Role::Admin).await;
    app.bootcamp(&admin, "First").await;
    app.bootcamp(&admin, "Second").await;
}

#[tokio::test]
async fn validation_errors_are_400() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/bootcamps",
            Some(&publisher.token),
            Some(json!({"name": "x".repeat(51), "careers": ["Basket Weaving"]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["careers"].is_string());
    assert!(body["field_errors"]["address"].is_string());
}

#[tokio::test]
async fn only_owner_or_admin_may_update() {
    let app = TestApp::new();
    let owner = app.user(Role::Publisher).await;
    let id = app.bootcamp(&owner, "Devworks").await;
    let uri = format!("/api/v1/bootcamps/{}", id);

    let intruder = app.user(Role::Publisher).await;
    let (status, _) = app
        .request(Method::PUT, &uri, Some(&intruder.token), Some(json!({"housing": false})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&owner.token), Some(json!({"housing": false})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["housing"], json!(false));
    assert_eq!(body["data"]["name"], json!("Devworks"));

    let admin = app.user(Role::Admin).await;
    let (status, body) = app
        .request(Method::PUT, &uri, Some(&admin.token), Some(json!({"phone": "(111) 111-1111"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], json!("(111) 111-1111"));
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/v1/bootcamps/not-an-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("No bootcamp with the id of not-an-id"));

    let (status, _) = app.get("/api/v1/bootcamps/5d725a1b7b292f5f8ceff788").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/api/v1/bootcamps/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn show_attaches_course_titles() {
    let app = TestApp::new();
    let owner = app.user(Role::Publisher).await;
    let id = app.bootcamp(&owner, "Devworks").await;
    app.course(&owner, &id, "Front End Web Development", 10000).await;

    let (status, body) = app.get(&format!("/api/v1/bootcamps/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let courses = body["data"]["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], json!("Front End Web Development"));
    assert!(courses[0].get("tuition").is_none());
    assert_eq!(body["data"]["averageCost"], json!(10000));
}

#[tokio::test]
async fn delete_removes_courses_and_reviews() {
    let app = TestApp::new();
    let owner = app.user(Role::Publisher).await;
    let id = app.bootcamp(&owner, "Devworks").await;
    app.course(&owner, &id, "Front End", 8000).await;
    app.course(&owner, &id, "Back End", 12000).await;
    let reviewer = app.user(Role::User).await;
    app.review(&reviewer, &id, 8).await;

    let uri = format!("/api/v1/bootcamps/{}", id);
    let (status, body) = app.request(Method::DELETE, &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {}}));

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, courses) = app.get("/api/v1/courses").await;
    assert_eq!(courses["count"], json!(0));
    let (_, reviews) = app.get("/api/v1/reviews").await;
    assert_eq!(reviews["count"], json!(0));
}
