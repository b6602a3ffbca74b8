use crate::db::{DbPool, ExecuteWithRetry};
use crate::dto::NoteQueryDto;
use crate::models::{Note, Snapshot};
use crate::schema::notes;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use super::snapshot_repo::{create_snapshot, latest_snapshot};

/// Creates a new note in the database
///
/// The initial content is stored as the note's first snapshot, so every
/// note always has at least one snapshot.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `owner_id` - The ID of the user who owns the note
/// * `title` - The title for the new note
/// * `content` - The initial content of the note
/// * `password_hash` - Hash of the read-protection password, if any
///
/// ### Returns
///
/// A Result containing the newly created Note if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails
#[instrument(skip(pool, content, password_hash), fields(owner_id = %owner_id, title = %title))]
pub async fn create_note(
    pool: &DbPool,
    owner_id: &str,
    title: String,
    content: String,
    password_hash: Option<String>,
) -> Result<Note> {
    debug!("Creating new note");

    let mut conn = pool.get()?;

    let new_note = Note::new(owner_id.to_string(), title, password_hash);

    debug!("Inserting note into database with id: {}", new_note.get_id());

    diesel::insert_into(notes::table)
        .values(new_note.clone())
        .execute_with_retry(&mut conn)
        .await?;

    // Drop the connection back to the pool
    drop(conn);

    debug!("Storing initial snapshot for note");

    create_snapshot(pool, &new_note.get_id(), content).await?;

    info!("Successfully created note with id: {}", new_note.get_id());

    Ok(new_note)
}

/// Retrieves a note from the database by its ID
///
/// Soft-deleted notes are returned as well; use [`get_active_note`] when
/// deleted notes should be invisible.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Note if found, or None if not found
#[instrument(skip(pool), fields(note_id = %note_id))]
pub fn get_note(pool: &DbPool, note_id: &str) -> Result<Option<Note>> {
    debug!("Retrieving note by id");

    let conn = &mut pool.get()?;

    let result = notes::table
        .filter(notes::id.eq(note_id))
        .first::<Note>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves an active note from the database by its ID
///
/// Returns None for soft-deleted notes as well as unknown IDs, so callers
/// cannot tell the two apart.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Note if found and active
#[instrument(skip(pool), fields(note_id = %note_id))]
pub fn get_active_note(pool: &DbPool, note_id: &str) -> Result<Option<Note>> {
    debug!("Retrieving active note by id");

    let conn = &mut pool.get()?;

    let result = notes::table
        .filter(notes::id.eq(note_id))
        .filter(notes::active.eq(true))
        .first::<Note>(conn)
        .optional()?;

    Ok(result)
}

/// Updates a note's title
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note to update
/// * `title` - The new title
///
/// ### Returns
///
/// A Result containing the updated Note if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The note is not found
/// - The database update operation fails
#[instrument(skip(pool), fields(note_id = %note_id))]
pub async fn update_note_title(pool: &DbPool, note_id: &str, title: String) -> Result<Note> {
    debug!("Updating note title");

    get_note(pool, note_id)?
        .ok_or_else(|| anyhow::anyhow!("Note with id {} not found", note_id))?;

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(notes::table.find(note_id.to_string()))
        .set((notes::title.eq(title), notes::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    drop(conn);

    let updated_note = get_note(pool, note_id)?
        .ok_or_else(|| anyhow::anyhow!("Note with id {} not found after update", note_id))?;

    info!("Successfully updated title of note with id: {}", note_id);

    Ok(updated_note)
}

/// Sets the active flag on a note
///
/// Deletion through the API is soft; it only flips this flag to false and
/// leaves the row and its snapshots in place.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note
/// * `active` - The new value of the active flag
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(note_id = %note_id, active = active))]
pub async fn set_note_active(pool: &DbPool, note_id: &str, active: bool) -> Result<()> {
    debug!("Setting active flag on note");

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(notes::table.find(note_id.to_string()))
        .set((notes::active.eq(active), notes::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    info!("Set active = {} on note with id: {}", active, note_id);

    Ok(())
}

/// Sets the important flag on a note
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note
/// * `important` - The new value of the important flag
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(note_id = %note_id, important = important))]
pub async fn set_note_important(pool: &DbPool, note_id: &str, important: bool) -> Result<()> {
    debug!("Setting important flag on note");

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(notes::table.find(note_id.to_string()))
        .set((notes::important.eq(important), notes::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    Ok(())
}

/// Sets the archived flag on a note
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `note_id` - The ID of the note
/// * `archived` - The new value of the archived flag
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(note_id = %note_id, archived = archived))]
pub async fn set_note_archived(pool: &DbPool, note_id: &str, archived: bool) -> Result<()> {
    debug!("Setting archived flag on note");

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(notes::table.find(note_id.to_string()))
        .set((notes::archived.eq(archived), notes::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    Ok(())
}

/// Retrieves all active notes, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
///
/// ### Returns
///
/// A Result containing a vector of all active Notes
#[instrument(skip(pool))]
pub fn list_active_notes(pool: &DbPool) -> Result<Vec<Note>> {
    debug!("Listing all active notes");

    let conn = &mut pool.get()?;

    let result = notes::table
        .filter(notes::active.eq(true))
        .order_by(notes::created_at.desc())
        .load::<Note>(conn)?;

    info!("Retrieved {} active notes", result.len());

    Ok(result)
}

/// Whether a note and its current content match the given filters
///
/// Title and content filters are case-insensitive substring matches; the
/// important filter is an exact match.
fn matches_filters(filters: &NoteQueryDto, note: &Note, snapshot: &Snapshot) -> bool {
    if let Some(ref title) = filters.title {
        if !note
            .get_title()
            .to_lowercase()
            .contains(&title.to_lowercase())
        {
            return false;
        }
    }

    if let Some(ref content) = filters.content {
        if !snapshot
            .get_content()
            .to_lowercase()
            .contains(&content.to_lowercase())
        {
            return false;
        }
    }

    if let Some(important) = filters.important {
        if note.is_important() != important {
            return false;
        }
    }

    true
}

/// Retrieves active notes matching the given filters, newest first
///
/// Password-protected notes never appear in listings; they can only be
/// read one at a time with the right password. Each returned note is
/// paired with its newest snapshot so callers have the current content
/// at hand.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filters` - The title, content and important filters to apply
///
/// ### Returns
///
/// A Result containing the matching Notes, each with its newest Snapshot
#[instrument(skip(pool, filters))]
pub fn list_notes_with_filters(
    pool: &DbPool,
    filters: &NoteQueryDto,
) -> Result<Vec<(Note, Snapshot)>> {
    debug!("Listing notes with filters");

    let notes = list_active_notes(pool)?;

    let mut result = Vec::new();
    for note in notes {
        if note.is_protected() {
            continue;
        }

        // Every note gets a snapshot at creation; a missing one would be a
        // corrupt row, which the listing skips rather than failing whole.
        let Some(snapshot) = latest_snapshot(pool, &note.get_id())? else {
            debug!("Note {} has no snapshot, skipping", note.get_id());
            continue;
        };

        if matches_filters(filters, &note, &snapshot) {
            result.push((note, snapshot));
        }
    }

    info!("Retrieved {} notes after filtering", result.len());

    Ok(result)
}
