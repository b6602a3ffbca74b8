/// Notatki: A Multi-User Notes Service Library
///
/// This library provides the core functionality for a multi-user notes service,
/// including data models, database access, authentication, and a web API.
///
/// Notes are versioned: every content change appends a snapshot rather than
/// overwriting the previous text, and any earlier snapshot can be promoted back
/// to being the current content. Notes can also be protected with their own
/// password, grouped into categories, and flagged as important or archived.
///
/// ### Modules
///
/// - `auth`: Password hashing, HTTP Basic authentication, and access rules
/// - `config`: Configuration loading and merging
/// - `db`: Database connection management
/// - `dto`: Request and response bodies of the web API
/// - `errors`: The error type that handlers return and its HTTP mapping
/// - `handlers`: Web API handlers
/// - `models`: Data structures representing users, notes, snapshots, and categories
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
///
/// ### Web API
///
/// The library exposes a RESTful API using Axum with the following endpoints:
///
/// - `GET /health`: Check that the service is up
/// - `POST /api/v1/user`: Register a new account
/// - `GET /api/v1/user`: Look up accounts by id
/// - `PUT /api/v1/user/password`: Change an account's password
/// - `PUT /api/v1/user/block`: Block or unblock an account (admin only)
/// - `PUT /api/v1/user/{id}`: Update an account
/// - `DELETE /api/v1/user/{id}`: Delete an account
/// - `POST /api/v1/notes`: Create a new note
/// - `GET /api/v1/notes`: List notes, optionally filtered
/// - `DELETE /api/v1/notes`: Soft-delete a note
/// - `GET /api/v1/notes/{id}`: Get a note with its current content
/// - `PUT /api/v1/notes/{id}`: Update a note, appending a snapshot
/// - `PATCH /api/v1/notes/{id}/important`: Set or clear the important flag
/// - `PATCH /api/v1/notes/{id}/archivized`: Set or clear the archived flag
/// - `GET /api/v1/notes/{id}/snapshot`: List a note's snapshot history
/// - `PATCH /api/v1/notes/{id}/snapshot/{snapshot_id}`: Restore a snapshot
/// - `POST /api/v1/categories`: Create a category
/// - `GET /api/v1/categories`: List categories with their notes
/// - `GET /api/v1/categories/{id}`: Get a category with its notes
/// - `PUT /api/v1/categories/{id}`: Rename a category and replace its notes
/// - `DELETE /api/v1/categories/{id}`: Delete a category

/// Authentication and access control module
pub mod auth;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects for the web API
pub mod dto;

/// API error types
pub mod errors;

/// Web API handlers
pub mod handlers;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Shared helpers for tests
#[cfg(test)]
pub mod test_utils;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use errors::ApiError;
use handlers::{
    block_user_handler, create_category_handler, create_note_handler, create_user_handler,
    delete_category_handler, delete_note_handler, delete_user_handler, get_category_handler,
    get_note_handler, get_users_handler, health_handler, list_categories_handler,
    list_notes_handler, list_snapshots_handler, restore_snapshot_handler,
    set_note_archived_handler, set_note_important_handler, update_category_handler,
    update_note_handler, update_password_handler, update_user_handler,
};

/// Creates the application router with all routes configured
///
/// Every route except `GET /health` and `POST /api/v1/user` sits behind the
/// Basic authentication middleware, and every request passes through the
/// audit log middleware.
///
/// ### Arguments
///
/// * `pool` - A shared database connection pool
///
/// ### Returns
///
/// An Axum Router configured with all API routes
pub fn create_app(pool: Arc<db::DbPool>) -> Router {
    Router::new()
        // Route for the health check
        .route("/health", get(health_handler))
        // Routes for registering and looking up accounts
        .route(
            "/api/v1/user",
            post(create_user_handler).get(get_users_handler),
        )
        // Route for changing an account's password
        .route("/api/v1/user/password", put(update_password_handler))
        // Route for blocking and unblocking accounts
        .route("/api/v1/user/block", put(block_user_handler))
        // Routes for updating and deleting a specific account
        .route(
            "/api/v1/user/{id}",
            put(update_user_handler).delete(delete_user_handler),
        )
        // Routes for creating, listing, and soft-deleting notes
        .route(
            "/api/v1/notes",
            post(create_note_handler)
                .get(list_notes_handler)
                .delete(delete_note_handler),
        )
        // Routes for reading and updating a specific note
        .route(
            "/api/v1/notes/{id}",
            get(get_note_handler).put(update_note_handler),
        )
        // Route for flagging a note as important
        .route(
            "/api/v1/notes/{id}/important",
            patch(set_note_important_handler),
        )
        // Route for archiving a note
        .route(
            "/api/v1/notes/{id}/archivized",
            patch(set_note_archived_handler),
        )
        // Route for listing a note's snapshot history
        .route("/api/v1/notes/{id}/snapshot", get(list_snapshots_handler))
        // Route for restoring an earlier snapshot
        .route(
            "/api/v1/notes/{id}/snapshot/{snapshot_id}",
            patch(restore_snapshot_handler),
        )
        // Routes for creating and listing categories
        .route(
            "/api/v1/categories",
            post(create_category_handler).get(list_categories_handler),
        )
        // Routes for reading, updating, and deleting a specific category
        .route(
            "/api/v1/categories/{id}",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
        // Known paths hit with the wrong method get a 405 instead of a 404
        .method_not_allowed_fallback(method_not_allowed_handler)
        // Resolve Basic credentials before any handler runs
        .layer(middleware::from_fn_with_state(
            pool.clone(),
            auth::authenticate,
        ))
        // Record every request, including rejected ones, in the audit log
        .layer(middleware::from_fn(auth::audit_log))
        // Allow browser clients from any origin
        .layer(CorsLayer::permissive())
        // Add the database pool to the application state
        .with_state(pool)
}

/// Fallback handler for known paths requested with an unsupported method
async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Runs the embedded migrations
///
/// This function applies all database migrations to set up the schema. It is
/// called once at startup and by the test helpers.
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite connection
///
/// ### Panics
///
/// This function will panic if the migrations fail to run
pub fn run_migrations(conn: &mut diesel::SqliteConnection) {
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    // Define the embedded migrations
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    // Run all pending migrations
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}
