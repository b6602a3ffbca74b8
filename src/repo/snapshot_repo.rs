use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::Snapshot;
use crate::schema::snapshots;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Appends a new snapshot to a note's history
///
/// Snapshots are append-only; the newest one by creation time is the
/// note's current content.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note the snapshot belongs to
/// * `content` - The content to record
///
/// ### Returns
///
/// A Result containing the newly created Snapshot if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, content), fields(note_id = %note_id))]
pub async fn create_snapshot(pool: &DbPool, note_id: &str, content: String) -> Result<Snapshot> {
    debug!("Creating new snapshot");

    let mut conn = pool.get()?;

    let new_snapshot = Snapshot::new(note_id.to_string(), content);

    diesel::insert_into(snapshots::table)
        .values(new_snapshot.clone())
        .execute_with_retry(&mut conn)
        .await?;

    info!(
        "Successfully created snapshot with id: {}",
        new_snapshot.get_id()
    );

    Ok(new_snapshot)
}

/// Retrieves the newest snapshot of a note
///
/// Ties on the creation time are broken by ID so the result is stable.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note
///
/// ### Returns
///
/// A Result containing an Option with the newest Snapshot, or None if the
/// note has no snapshots
#[instrument(skip(pool), fields(note_id = %note_id))]
pub fn latest_snapshot(pool: &DbPool, note_id: &str) -> Result<Option<Snapshot>> {
    debug!("Retrieving newest snapshot for note");

    let conn = &mut pool.get()?;

    let result = snapshots::table
        .filter(snapshots::note_id.eq(note_id))
        .order_by(snapshots::created_at.desc())
        .then_order_by(snapshots::id.desc())
        .first::<Snapshot>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves all snapshots of a note, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note
///
/// ### Returns
///
/// A Result containing a vector of the note's Snapshots
#[instrument(skip(pool), fields(note_id = %note_id))]
pub fn list_snapshots(pool: &DbPool, note_id: &str) -> Result<Vec<Snapshot>> {
    debug!("Listing snapshots for note");

    let conn = &mut pool.get()?;

    let result = snapshots::table
        .filter(snapshots::note_id.eq(note_id))
        .order_by(snapshots::created_at.desc())
        .then_order_by(snapshots::id.desc())
        .load::<Snapshot>(conn)?;

    info!("Retrieved {} snapshots", result.len());

    Ok(result)
}

/// Retrieves a snapshot from the database by its ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `snapshot_id` - The ID of the snapshot to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Snapshot if found, or None if
/// not found
#[instrument(skip(pool), fields(snapshot_id = %snapshot_id))]
pub fn get_snapshot(pool: &DbPool, snapshot_id: &str) -> Result<Option<Snapshot>> {
    debug!("Retrieving snapshot by id");

    let conn = &mut pool.get()?;

    let result = snapshots::table
        .filter(snapshots::id.eq(snapshot_id))
        .first::<Snapshot>(conn)
        .optional()?;

    Ok(result)
}

/// Makes an old snapshot the note's current content again
///
/// Restoring does not copy the row; it moves the snapshot's creation time
/// to now so it becomes the newest one. The history therefore keeps the
/// same number of entries.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `snapshot_id` - The ID of the snapshot to restore
///
/// ### Returns
///
/// A Result containing the restored Snapshot if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The snapshot is not found
/// - The database update operation fails
#[instrument(skip(pool), fields(snapshot_id = %snapshot_id))]
pub async fn restore_snapshot(pool: &DbPool, snapshot_id: &str) -> Result<Snapshot> {
    debug!("Restoring snapshot");

    get_snapshot(pool, snapshot_id)?
        .ok_or_else(|| anyhow::anyhow!("Snapshot with id {} not found", snapshot_id))?;

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(snapshots::table.find(snapshot_id.to_string()))
        .set((
            snapshots::created_at.eq(now),
            snapshots::updated_at.eq(now),
        ))
        .execute_with_retry(&mut conn)
        .await?;

    drop(conn);

    let restored = get_snapshot(pool, snapshot_id)?.ok_or_else(|| {
        anyhow::anyhow!("Snapshot with id {} not found after restore", snapshot_id)
    })?;

    info!("Successfully restored snapshot with id: {}", snapshot_id);

    Ok(restored)
}
