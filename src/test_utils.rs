use crate::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use diesel::RunQueryDsl;
use diesel::connection::SimpleConnection;
use proptest::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Enables foreign key constraints
/// 3. Runs all migrations to set up the schema
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    // Use a unique shared in-memory database for each test.
    // Plain ":memory:" gives each connection its own separate database,
    // so migrations run on one connection wouldn't be visible on others.
    // By using a unique URI with cache=shared, all connections in this pool
    // share the same in-memory database while remaining isolated from other tests.
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url);

    // Get a connection from the pool
    let mut conn = pool.get().expect("Failed to get connection");

    // Enable foreign key constraints for SQLite
    conn.batch_execute("PRAGMA foreign_keys = ON").unwrap();

    // Run all migrations to set up the schema
    run_migrations(&mut conn);

    // Wrap the pool in an Arc for thread-safe sharing
    Arc::new(pool)
}

use diesel::QueryableByName;
use diesel::sql_types::Text;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
/// 3. The database can be queried successfully
#[tokio::test]
async fn test_setup_test_db() {
    let pool = setup_test_db();
    assert!(pool.get().is_ok());

    // Check that all migrations were run, i.e. the tables were created
    let mut conn = pool.get().unwrap();
    let result =
        diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'").execute(&mut conn);
    assert!(result.is_ok());

    // Get the names of the tables
    let table_names: Vec<TableName> =
        diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
            .load(&mut conn)
            .expect("Failed to load table names");

    // Verify that we have the expected tables
    assert!(table_names.len() > 0, "No tables found in the database");

    // test interacting with each of the found tables
    let expected_tables = vec![
        "users",
        "notes",
        "snapshots",
        "categories",
        "category_notes",
        "__diesel_schema_migrations", // Diesel's migration tracking table
    ];

    for table in expected_tables {
        let exists = table_names.iter().any(|t| t.name == table);
        assert!(exists, "Table '{}' not found in database", table);

        // Test a simple query on each table
        let query = format!("SELECT COUNT(*) FROM {}", table);
        let result = diesel::sql_query(&query).execute(&mut conn);
        assert!(
            result.is_ok(),
            "Failed to query table '{}': {:?}",
            table,
            result.err()
        );
    }

    drop(conn);

    // test interacting with the app
    let app = create_app(pool.clone());

    // the health route needs no credentials, so it makes a good smoke test
    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    // send the request to the app
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Response status is not OK (err: {:?})",
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    );
}

/// Generates an arbitrary DateTime<Utc> within 2020-01-01 to 2030-01-01
pub fn arb_datetime_utc() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..1_893_456_000i64).prop_map(|ts| DateTime::from_timestamp(ts, 0).unwrap())
}

/// Generates strings of varying shapes: empty, whitespace runs, plain words,
/// and fully arbitrary unicode
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \\t]{1,4}",
        "[a-zA-Z0-9 ]{1,30}",
        ".*",
    ]
}

/// Generates strings made only of whitespace, including the empty string
pub fn arb_blank_string() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just(' '), Just('\t'), Just('\n')], 0..10)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Generates usernames from the character set accepted at registration
pub fn arb_username() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,24}"
}
