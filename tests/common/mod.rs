#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use devcamper_api::auth::{generate_jwt, Claims};
use devcamper_api::database::{Collection, MemoryStore, Store};
use devcamper_api::types::{Document, Role};
use devcamper_api::{app, AppState};

/// Router over a fresh in-memory store, driven with `oneshot`
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
}

/// A seeded account and a token for it
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let router = app(AppState::new(store.clone()));
        Self { router, store }
    }

    /// Insert an account directly; its password hash is never checked.
    pub async fn user(&self, role: Role) -> TestUser {
        let mut doc = Document::new();
        let tag = Uuid::new_v4().simple().to_string();
        doc.insert("name".into(), json!(format!("{} {}", role, &tag[..6])));
        doc.insert("email".into(), json!(format!("{}@devcamper.test", tag)));
        doc.insert("password".into(), json!("not-a-real-hash"));
        doc.insert("role".into(), json!(role.as_str()));

        let user = self.store.insert(Collection::Users, doc).await.unwrap();
        let id = Uuid::parse_str(user["id"].as_str().unwrap()).unwrap();
        let token = generate_jwt(Claims::new(id, role)).unwrap();
        TestUser { id, token }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    /// Create a bootcamp as `owner` and return its id.
    pub async fn bootcamp(&self, owner: &TestUser, name: &str) -> String {
        let (status, body) = self
            .request(Method::POST, "/api/v1/bootcamps", Some(&owner.token), Some(bootcamp_body(name)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "bootcamp create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Add a course to a bootcamp and return its id.
    pub async fn course(&self, owner: &TestUser, bootcamp_id: &str, title: &str, tuition: u64) -> String {
        let uri = format!("/api/v1/bootcamps/{}/courses", bootcamp_id);
        let (status, body) = self
            .request(Method::POST, &uri, Some(&owner.token), Some(course_body(title, tuition)))
            .await;
        assert_eq!(status, StatusCode::OK, "course create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Review a bootcamp and return the review id.
    pub async fn review(&self, author: &TestUser, bootcamp_id: &str, rating: u64) -> String {
        let uri = format!("/api/v1/bootcamps/{}/reviews", bootcamp_id);
        let body = json!({"title": "Worth it", "text": "Good instructors", "rating": rating});
        let (status, body) = self.request(Method::POST, &uri, Some(&author.token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "review create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

pub fn bootcamp_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Full stack web development with the MERN stack",
        "website": "https://devworks.com",
        "email": "enroll@devworks.com",
        "address": "233 Bay State Rd Boston MA 02215",
        "careers": ["Web Development", "UI/UX"],
        "housing": true
    })
}

pub fn course_body(title: &str, tuition: u64) -> Value {
    json!({
        "title": title,
        "description": "Build applications end to end",
        "weeks": "8",
        "tuition": tuition,
        "minimumSkill": "beginner"
    })
}

/// The release binary running on a free port with the in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_devcamper-api"))
            .args(["--memory", "--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
