use axum::Json;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// Handler for the health check endpoint
///
/// This function handles GET requests to `/health`. It does not touch the
/// database; it only confirms that the server is up and serving requests.
///
/// ### Returns
///
/// A small JSON status document
#[instrument]
pub async fn health_handler() -> Json<Value> {
    debug!("Health check");

    Json(json!({ "status": "OK" }))
}
