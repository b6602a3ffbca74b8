/// Common test utilities for Notatki integration tests
///
/// This file contains shared functions and utilities for all integration tests,
/// including test application setup, helper functions for registering accounts
/// and creating notes, and other shared functionality.
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use notatki::{auth, create_app, db::init_pool};
use serde_json::json;
use std::sync::Arc;
use tower::Service;

pub use notatki::auth::bootstrap::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

/// Creates a test application with an in-memory SQLite database
///
/// This helper function:
/// 1. Creates a unique shared in-memory SQLite database
/// 2. Runs migrations to set up the schema
/// 3. Creates the default administrator account
/// 4. Creates an Axum application with the database
///
/// Using an in-memory database ensures that:
/// - Tests run quickly
/// - Tests are isolated from each other
/// - No cleanup is needed after tests
///
/// ### Returns
///
/// An Axum Router configured with all routes and connected to an in-memory database
pub async fn create_test_app() -> Router {
    // Each test gets its own shared-cache in-memory database, so all the
    // pool's connections see the same data while tests stay isolated
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = Arc::new(init_pool(&database_url));

    // Run migrations on the in-memory database to set up the schema
    let conn = &mut pool.get().unwrap();
    notatki::run_migrations(conn);

    // Create the administrator account that exists on a fresh install
    auth::ensure_admin_user(&pool).await.unwrap();

    // Create and return the application with the configured database pool
    create_app(pool)
}

/// Builds an `Authorization` header value for the given credentials
///
/// ### Arguments
///
/// * `username` - The username to authenticate as
/// * `password` - The password of the account
///
/// ### Returns
///
/// A `Basic` authorization header value with the encoded credentials
pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Registers a new account via the API
///
/// This helper function:
/// 1. Sends a POST request to /api/v1/user with the provided credentials
/// 2. Verifies the response has a 201 Created status
/// 3. Returns the ID of the new account from the response body
///
/// ### Arguments
///
/// * `app` - The test application
/// * `username` - The username for the new account
/// * `password` - The password for the new account
///
/// ### Returns
///
/// The ID of the created account
pub async fn register_user(app: &mut Router, username: &str, password: &str) -> String {
    // Create a request to register an account
    let request = Request::builder()
        .uri("/api/v1/user")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({
                "username": username,
                "password": password
            }))
            .unwrap(),
        ))
        .unwrap();

    // Send the request and get the response
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The response body is the ID of the new account
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Creates a note via the API
///
/// This helper function:
/// 1. Sends a POST request to /api/v1/notes as the given account
/// 2. Verifies the response has a 201 Created status
/// 3. Returns the ID of the new note from the response body
///
/// ### Arguments
///
/// * `app` - The test application
/// * `authorization` - The `Authorization` header value of the owner
/// * `title` - The title for the new note
/// * `content` - The initial content of the note
/// * `password` - An optional password protecting the note
///
/// ### Returns
///
/// The ID of the created note
pub async fn create_note(
    app: &mut Router,
    authorization: &str,
    title: &str,
    content: &str,
    password: Option<&str>,
) -> String {
    // Create a request to create a note
    let request = Request::builder()
        .uri("/api/v1/notes")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", authorization)
        .body(Body::from(
            serde_json::to_string(&json!({
                "title": title,
                "content": content,
                "password": password
            }))
            .unwrap(),
        ))
        .unwrap();

    // Send the request and get the response
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The response body is the ID of the new note
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Creates a category via the API
///
/// This helper function:
/// 1. Sends a POST request to /api/v1/categories as the given account
/// 2. Verifies the response has a 201 Created status
/// 3. Returns the ID of the new category from the response body
///
/// ### Arguments
///
/// * `app` - The test application
/// * `authorization` - The `Authorization` header value to send
/// * `name` - The name for the new category
///
/// ### Returns
///
/// The ID of the created category
pub async fn create_category(app: &mut Router, authorization: &str, name: &str) -> String {
    // Create a request to create a category
    let request = Request::builder()
        .uri("/api/v1/categories")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Authorization", authorization)
        .body(Body::from(
            serde_json::to_string(&json!({
                "name": name
            }))
            .unwrap(),
        ))
        .unwrap();

    // Send the request and get the response
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The response body is the ID of the new category
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
