use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{self, Principal};
use crate::db::DbPool;
use crate::dto::SnapshotDto;
use crate::errors::ApiError;
use crate::repo;

/// Handler for listing a note's revision history
///
/// This function handles GET requests to `/api/v1/notes/{id}/snapshot`.
/// Only the note's owner and administrators may read the history. The
/// history stays readable after the note has been soft deleted.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `note_id` - The ID of the note, extracted from the URL path
///
/// ### Returns
///
/// The note's snapshots as JSON, newest first
#[instrument(skip(pool, principal), fields(note_id = %note_id, caller = %principal.username))]
pub async fn list_snapshots_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the note ID from the URL path
    Path(note_id): Path<String>,
) -> Result<Json<Vec<SnapshotDto>>, ApiError> {
    debug!("Listing snapshots for note");

    let note = repo::get_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    let snapshots = repo::list_snapshots(&pool, &note_id).map_err(ApiError::Database)?;

    let dtos = snapshots
        .iter()
        .map(SnapshotDto::from_snapshot)
        .collect::<Vec<_>>();

    info!("Retrieved {} snapshots for note {}", dtos.len(), note_id);

    Ok(Json(dtos))
}

/// Handler for restoring an old revision of a note
///
/// This function handles PATCH requests to
/// `/api/v1/notes/{id}/snapshot/{snapshot_id}`. Restoring moves the
/// snapshot's timestamp forward so it becomes the note's current content
/// again; no history is lost. Only the note's owner and administrators may
/// restore.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `params` - The note and snapshot IDs, extracted from the URL path
///
/// ### Returns
///
/// The restored snapshot as JSON
#[instrument(skip(pool, principal, params), fields(note_id = %params.0, snapshot_id = %params.1, caller = %principal.username))]
pub async fn restore_snapshot_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the note and snapshot IDs from the URL path
    Path(params): Path<(String, String)>,
) -> Result<Json<SnapshotDto>, ApiError> {
    let (note_id, snapshot_id) = params;

    info!("Restoring snapshot");

    let note = repo::get_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    // The snapshot has to exist and belong to the note named in the path
    let snapshot = repo::get_snapshot(&pool, &snapshot_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Snapshot not found".to_string()))?;
    if snapshot.get_note_id() != note_id {
        return Err(ApiError::NotFound("Snapshot not found".to_string()));
    }

    let restored = repo::restore_snapshot(&pool, &snapshot_id)
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Successfully restored snapshot {} of note {}",
        snapshot_id, note_id
    );

    Ok(Json(SnapshotDto::from_snapshot(&restored)))
}
