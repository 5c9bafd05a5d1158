//! HTTP routes and handlers.
//!
//! Public: `/api/auth/*`, `/api/health`, `/v3/api-docs`.
//! Protected: `/api/notes` and `/api/notes/:id`, which take a
//! [`SecurityContext`] and therefore answer 401 when the gate installed none.

use crate::domain::config::CorsConfig;
use crate::domain::{
    ApiError, ApiResult, LoginRequest, NoteId, NoteRequest, NoteView, Permission,
    SecurityContext, SignupRequest, TokenResponse,
};
use crate::middleware::{create_cors_layer, AuthLayer, RequestSpanLayer};
use crate::service::{CredentialService, NoteService};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub notes: Arc<NoteService>,
}

/// Assemble routes and middleware (CORS → request span → gate → routes).
pub fn build_router(state: AppState, auth: AuthLayer, cors: &CorsConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(create_cors_layer(cors))
        .layer(RequestSpanLayer::new())
        .layer(auth);

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/test", get(auth_test))
        .route("/api/health", get(health))
        .route("/v3/api-docs", get(api_docs))
        .route("/api/notes", get(list_notes).post(create_note))
        .route(
            "/api/notes/:id",
            get(get_note).put(update_note).delete(delete_note),
        )
        .layer(middleware)
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_request(rejection.body_text()))
}

fn note_id(path: Result<Path<NoteId>, PathRejection>) -> ApiResult<NoteId> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::invalid_request("note id must be a positive integer"))
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let request = json_body(payload)?;
    let token = state
        .credentials
        .signup(&request.username, &request.password, request.email.as_deref())
        .await?;
    Ok(Json(TokenResponse { token }))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let request = json_body(payload)?;
    let token = state
        .credentials
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

async fn auth_test() -> &'static str {
    "Auth endpoints are working."
}

async fn health() -> &'static str {
    "Server is running!"
}

async fn api_docs() -> Json<Value> {
    Json(openapi_document())
}

async fn list_notes(
    context: SecurityContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<NoteView>>> {
    context.require(Permission::ReadNotes)?;
    Ok(Json(state.notes.list(&context.subject).await?))
}

async fn create_note(
    context: SecurityContext,
    State(state): State<AppState>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> ApiResult<Json<NoteView>> {
    context.require(Permission::WriteNotes)?;
    let request = json_body(payload)?;
    let note = state
        .notes
        .create(&context.subject, request.title, &request.content)
        .await?;
    Ok(Json(note))
}

async fn get_note(
    context: SecurityContext,
    State(state): State<AppState>,
    path: Result<Path<NoteId>, PathRejection>,
) -> ApiResult<Json<NoteView>> {
    context.require(Permission::ReadNotes)?;
    let id = note_id(path)?;
    Ok(Json(state.notes.get(&context.subject, id).await?))
}

async fn update_note(
    context: SecurityContext,
    State(state): State<AppState>,
    path: Result<Path<NoteId>, PathRejection>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> ApiResult<Json<NoteView>> {
    context.require(Permission::WriteNotes)?;
    let id = note_id(path)?;
    let request = json_body(payload)?;
    let note = state
        .notes
        .update(&context.subject, id, request.title, &request.content)
        .await?;
    Ok(Json(note))
}

async fn delete_note(
    context: SecurityContext,
    State(state): State<AppState>,
    path: Result<Path<NoteId>, PathRejection>,
) -> ApiResult<StatusCode> {
    context.require(Permission::DeleteNotes)?;
    let id = note_id(path)?;
    state.notes.delete(&context.subject, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// OpenAPI 3 description of the HTTP surface, with the bearer scheme applied
/// globally. Auth endpoints override it with an empty requirement.
pub fn openapi_document() -> Value {
    let token_response = json!({
        "200": { "description": "Bearer token",
                 "content": { "application/json": { "schema": { "$ref": "#/components/schemas/TokenResponse" } } } }
    });
    let public = json!([]);

    json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Secure Notes API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "REST API for managing encrypted notes with bearer token authentication"
        },
        "security": [ { "bearerAuth": [] } ],
        "paths": {
            "/api/auth/signup": { "post": {
                "security": public,
                "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/SignupRequest" } } } },
                "responses": token_response
            } },
            "/api/auth/login": { "post": {
                "security": public,
                "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LoginRequest" } } } },
                "responses": token_response
            } },
            "/api/health": { "get": { "security": public, "responses": { "200": { "description": "Liveness" } } } },
            "/api/notes": {
                "get": { "responses": { "200": { "description": "Notes owned by the caller" } } },
                "post": {
                    "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NoteRequest" } } } },
                    "responses": { "200": { "description": "Created note" } }
                }
            },
            "/api/notes/{id}": {
                "parameters": [ { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } } ],
                "get": { "responses": { "200": { "description": "Note" }, "404": { "description": "No such note" } } },
                "put": {
                    "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NoteRequest" } } } },
                    "responses": { "200": { "description": "Updated note" }, "404": { "description": "No such note" } }
                },
                "delete": { "responses": { "204": { "description": "Deleted" }, "404": { "description": "No such note" } } }
            }
        },
        "components": {
            "securitySchemes": {
                "bearerAuth": {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT"
                }
            },
            "schemas": {
                "SignupRequest": { "type": "object", "required": ["username", "password"], "properties": {
                    "username": { "type": "string" }, "password": { "type": "string" }, "email": { "type": "string" } } },
                "LoginRequest": { "type": "object", "required": ["username", "password"], "properties": {
                    "username": { "type": "string" }, "password": { "type": "string" } } },
                "TokenResponse": { "type": "object", "properties": { "token": { "type": "string" } } },
                "NoteRequest": { "type": "object", "required": ["content"], "properties": {
                    "title": { "type": "string" }, "content": { "type": "string" } } }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_declares_bearer_scheme() {
        let doc = openapi_document();
        assert_eq!(
            doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
            "bearer"
        );
        assert_eq!(doc["paths"]["/api/auth/login"]["post"]["security"], json!([]));
        assert!(doc["paths"]["/api/notes/{id}"]["delete"].is_object());
    }
}
