mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn binary_serves_health_and_public_routes() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{}/health", server.base_url)).send().await?.json().await?;
    assert_eq!(health["data"]["status"], json!("ok"));

    let res = client
        .get(format!("{}/api/v1/bootcamps", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({"success": true, "count": 0, "pagination": {}, "data": []}));

    Ok(())
}

#[tokio::test]
async fn register_sets_token_cookie() -> Result<()> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/v1/auth/register", server.base_url))
        .json(&json!({"name": "Mary Williams", "email": "mary@gmail.com", "password": "123456", "role": "publisher"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("token="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"));

    let body: Value = res.json().await?;
    let token = body["token"].as_str().unwrap_or_default();
    let me: Value = client
        .get(format!("{}/api/v1/auth/me", server.base_url))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["data"]["email"], json!("mary@gmail.com"));

    Ok(())
}
