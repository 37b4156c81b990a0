// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use reelhouse::config::Config;
use reelhouse::db::{AccountStore, MemoryStore, PostgresStore};
use reelhouse::error::AppError;
use reelhouse::models::{MovieId, Role};
use reelhouse::routes::create_router;
use reelhouse::services::catalog::{CatalogProvider, CatalogRequest};
use reelhouse::AppState;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Check if a Postgres database is available via environment variable.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Skip test with message if no database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: DATABASE_URL not set");
            return;
        }
    };
}

/// Connect to the test database and apply migrations.
#[allow(dead_code)]
pub async fn test_postgres() -> PostgresStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PostgresStore::connect(&url, 5)
        .await
        .expect("Failed to connect to Postgres");
    store.migrate().await.expect("Failed to run migrations");
    store
}

/// Catalog stand-in: movie lookups return a small document, ids listed in
/// `missing` are not found, and every request is recorded.
#[derive(Default)]
pub struct FakeCatalog {
    missing: HashSet<MovieId>,
    requests: Mutex<Vec<CatalogRequest>>,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn with_missing(ids: &[MovieId]) -> Self {
        Self {
            missing: ids.iter().copied().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CatalogRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn fetch(&self, request: &CatalogRequest) -> Result<Value, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        match request {
            CatalogRequest::Movie(id) if self.missing.contains(id) => {
                Err(AppError::NotFound("Resource not found".to_string()))
            }
            CatalogRequest::Movie(id) => Ok(json!({ "id": id, "title": format!("Movie {}", id) })),
            other => {
                let query: serde_json::Map<String, Value> = other
                    .query()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v)))
                    .collect();
                Ok(json!({ "path": other.path(), "query": query, "results": [] }))
            }
        }
    }
}

/// Handles for driving the app in tests.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub catalog: Arc<FakeCatalog>,
}

/// Create a test app over an in-memory store and a fake catalog.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_catalog(FakeCatalog::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_catalog(catalog: FakeCatalog) -> TestApp {
    let store = MemoryStore::new();
    let catalog = Arc::new(catalog);
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(store.clone()),
        catalog.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        catalog,
    }
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode the JSON response body (`Value::Null` if empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, token, body))
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register a user through the API. Returns (token, user id).
#[allow(dead_code)]
pub async fn register(app: &axum::Router, name: &str, email: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = body["token"].as_str().unwrap().to_string();
    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    (token, id)
}

/// Register a user and give them the admin role directly in the store.
#[allow(dead_code)]
pub async fn register_admin(test: &TestApp, email: &str) -> (String, Uuid) {
    let (token, id) = register(&test.router, "Admin", email).await;
    test.store.set_role(id, Role::Admin).await.unwrap().unwrap();
    (token, id)
}

/// Create a JWT with an arbitrary subject and expiry offset (seconds from now).
#[allow(dead_code)]
pub fn create_test_jwt(sub: &str, signing_key: &[u8], expires_in: i64) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: sub.to_string(),
        exp: now + expires_in,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}
