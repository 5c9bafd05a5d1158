//! Shared helpers for driving the full router in-process.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use notes_api::adapters::{Argon2PasswordHasher, InMemoryNoteStore};
use notes_api::{Collaborators, NotesServer, ServiceConfig};
use notes_crypto::TokenCodec;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TOKEN_SECRET: &str = "integration-secret-0123456789abcdef!";
pub const ENCRYPTION_KEY: &str = "0123456789abcdef0123456789abcdef";

pub fn config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.auth.token_secret = TOKEN_SECRET.to_string();
    config.encryption.key = ENCRYPTION_KEY.to_string();
    config
}

/// Same secret and TTL as the server, for minting or inspecting tokens.
pub fn token_codec() -> TokenCodec {
    let config = config();
    TokenCodec::new(config.auth.token_secret.as_bytes(), config.auth.token_ttl).unwrap()
}

/// Collaborators with cheap Argon2 parameters, plus a handle on the note store.
pub fn collaborators() -> (Collaborators, Arc<InMemoryNoteStore>) {
    let notes = Arc::new(InMemoryNoteStore::new());
    let collaborators = Collaborators {
        notes: notes.clone(),
        hasher: Arc::new(Argon2PasswordHasher::with_params(1024, 1, 1).unwrap()),
        ..Collaborators::in_memory()
    };
    (collaborators, notes)
}

pub fn server() -> NotesServer {
    NotesServer::with_collaborators(config(), collaborators().0).unwrap()
}

pub fn app() -> Router {
    server().router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap().to_string()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sign up and return the issued token.
pub async fn signup(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    response.json()["token"].as_str().unwrap().to_string()
}
