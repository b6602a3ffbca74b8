use std::time::Duration;

use anyhow::Result;
use diesel::connection::SimpleConnection;
use diesel::query_dsl::methods::ExecuteDsl;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use tracing::warn;

/// A pool of SQLite connections shared by all handlers
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// How many times a write is attempted before giving up on a locked database
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Initial pause between write attempts; doubles on every retry
const RETRY_BASE_DELAY: Duration = Duration::from_millis(5);

/// Enables per-connection pragmas on every pooled connection
///
/// SQLite scopes both settings to a single connection, so they have to be
/// applied each time the pool opens one, not once at startup.
#[derive(Debug, Clone, Copy)]
struct ConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 1000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a connection pool for the given database URL
///
/// ### Arguments
///
/// * `database_url` - Path or URI of the SQLite database
///
/// ### Returns
///
/// A configured `DbPool`
///
/// ### Panics
///
/// Panics if the pool cannot be created, which means the database is
/// unreachable and the application cannot start.
pub fn init_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .expect("Failed to create pool.")
}

/// Extension trait that retries write statements on a locked database
///
/// SQLite allows a single writer at a time; under concurrent requests a
/// write can fail with "database is locked" even with a busy timeout set.
/// Callers use `execute_with_retry` instead of `execute` for inserts,
/// updates and deletes so transient contention does not surface as an
/// error to the client.
#[allow(async_fn_in_trait)]
pub trait ExecuteWithRetry: Sized {
    /// Executes the statement, retrying with exponential backoff while the
    /// database reports lock contention
    async fn execute_with_retry(self, conn: &mut SqliteConnection) -> Result<usize>;
}

impl<T> ExecuteWithRetry for T
where
    T: ExecuteDsl<SqliteConnection> + Clone,
{
    async fn execute_with_retry(self, conn: &mut SqliteConnection) -> Result<usize> {
        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 1;

        loop {
            match ExecuteDsl::execute(self.clone(), conn) {
                Ok(rows) => return Ok(rows),
                Err(err) if is_locked_error(&err) && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(attempt, "Database locked, retrying write");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Whether an error is SQLite lock contention rather than a real failure
fn is_locked_error(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(_, info) if info.message().contains("database is locked")
    )
}
