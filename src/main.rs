use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use notatki::{
    auth,
    config::{self, CliArgs},
    create_app, db, run_migrations,
};

/// Initializes the tracing subscriber
///
/// Logs are always written to stdout in a human-readable format. When a log
/// directory is configured, JSON logs are additionally written to a daily
/// rolling file in that directory. The returned guard must stay alive for the
/// lifetime of the process so buffered log lines are flushed on shutdown.
fn init_tracing(
    log_directory: Option<&Path>,
    debug: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Respect RUST_LOG when set, otherwise derive the level from the debug flag
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = tracing_subscriber::fmt::layer();

    match log_directory {
        Some(directory) => {
            // Write JSON logs to a daily rolling file alongside stdout
            let file_appender = tracing_appender::rolling::daily(directory, "notatki.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer().json().with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();

            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from a .env file if one exists, before
    // argument parsing so clap can pick them up
    dotenv::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();
    let debug = args.debug;

    // Resolve the configuration from defaults, the config file, and arguments
    let config = config::get_config(args);

    // Initialize logging; the guard flushes file logs when dropped
    let _guard = init_tracing(config.log_directory.as_deref(), debug);

    info!(
        database_url = %config.database_url,
        listen_addr = %config.listen_addr,
        "Starting notatki"
    );

    // Initialize the database pool
    let pool = Arc::new(db::init_pool(&config.database_url));

    // Apply any pending migrations before accepting requests
    {
        let mut conn = pool.get().expect("Failed to get a database connection");
        run_migrations(&mut conn);
    }

    // Make sure the default administrator account exists
    auth::ensure_admin_user(&pool)
        .await
        .expect("Failed to create the default admin account");

    // Build the application router
    let app = create_app(pool);

    // Run the server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind the listen address");
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .await
        .expect("Server exited with an error");
}
