mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use devcamper_api::types::Role;

#[tokio::test]
async fn average_rating_tracks_creates_and_deletes() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;
    let bootcamp_uri = format!("/api/v1/bootcamps/{}", bootcamp);

    let first = app.user(Role::User).await;
    let second = app.user(Role::User).await;
    let low = app.review(&first, &bootcamp, 7).await;
    app.review(&second, &bootcamp, 9).await;

    let (_, body) = app.get(&bootcamp_uri).await;
    assert_eq!(body["data"]["averageRating"], json!(8));

    let third = app.user(Role::User).await;
    app.review(&third, &bootcamp, 8).await;
    let (_, body) = app.get(&bootcamp_uri).await;
    assert_eq!(body["data"]["averageRating"], json!(8));

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/reviews/{}", low), Some(&first.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get(&bootcamp_uri).await;
    assert_eq!(body["data"]["averageRating"], json!(8.5));
}

#[tokio::test]
async fn average_rating_keeps_one_decimal() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;
    for rating in [7, 8, 8] {
        let author = app.user(Role::User).await;
        app.review(&author, &bootcamp, rating).await;
    }

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{}", bootcamp)).await;
    assert_eq!(body["data"]["averageRating"], json!(7.7));
}

#[tokio::test]
async fn one_review_per_user_per_bootcamp() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;
    let author = app.user(Role::User).await;
    app.review(&author, &bootcamp, 9).await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/bootcamps/{}/reviews", bootcamp),
            Some(&author.token),
            Some(json!({"title": "Again", "text": "Still good", "rating": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{}", bootcamp)).await;
    assert_eq!(body["data"]["averageRating"], json!(9));
}

#[tokio::test]
async fn publishers_cannot_review() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/v1/bootcamps/{}/reviews", bootcamp),
            Some(&publisher.token),
            Some(json!({"title": "Mine", "text": "Best ever", "rating": 10})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rating_must_be_between_one_and_ten() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;
    let author = app.user(Role::User).await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/v1/bootcamps/{}/reviews", bootcamp),
            Some(&author.token),
            Some(json!({"title": "Meh", "text": "Too hard", "rating": 11})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Please add a rating between 1 and 10"));
}

#[tokio::test]
async fn review_update_leaves_average_alone() {
    let app = TestApp::new();
    let publisher = app.user(Role::Publisher).await;
    let bootcamp = app.bootcamp(&publisher, "Devworks").await;
    let author = app.user(Role::User).await;
    let review = app.review(&author, &bootcamp, 6).await;
    let uri = format!("/api/v1/reviews/{}", review);

    let stranger = app.user(Role::User).await;
    let (status, _) = app
        .request(Method::PUT, &uri, Some(&stranger.token), Some(json!({"rating": 1})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&author.token), Some(json!({"rating": 10})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], json!(10));

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{}", bootcamp)).await;
    assert_eq!(body["data"]["averageRating"], json!(6));

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bootcamp"]["name"], json!("Devworks"));

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{}/reviews", bootcamp)).await;
    assert_eq!(body["count"], json!(1));
}
