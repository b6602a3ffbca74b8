use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{
        StatusCode,
        header::{self, HeaderName},
    },
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{self, Principal};
use crate::db::DbPool;
use crate::dto::{
    CreateNoteDto, DeleteNoteDto, NoteDto, NotePasswordQueryDto, NoteQueryDto, SetArchivedDto,
    SetImportantDto, UpdateNoteDto,
};
use crate::errors::ApiError;
use crate::repo;

/// Handler for creating a new note
///
/// This function handles POST requests to `/api/v1/notes`. The caller
/// becomes the note's owner; the initial content is stored as the note's
/// first snapshot. When a password is supplied the note becomes protected
/// and can only be read with that password.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `payload` - The request payload with the title, content and optional password
///
/// ### Returns
///
/// A 201 response whose body is the new note's id, with a Location header
/// pointing at the note
#[instrument(skip(pool, principal, payload), fields(owner = %principal.username, title = %payload.title))]
pub async fn create_note_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateNoteDto>,
) -> Result<(StatusCode, [(HeaderName, String); 1], String), ApiError> {
    info!("Creating new note");

    payload.validate()?;

    // Hash the view password when the note is to be protected
    let password_hash = match payload.password {
        Some(ref password) => Some(auth::hash_password(password).map_err(ApiError::Database)?),
        None => None,
    };

    let note = repo::create_note(
        &pool,
        &principal.id,
        payload.title,
        payload.content,
        password_hash,
    )
    .await
    .map_err(ApiError::Database)?;

    info!("Successfully created note with id: {}", note.get_id());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/notes/{}", note.get_id()))],
        note.get_id(),
    ))
}

/// Handler for retrieving a single note
///
/// This function handles GET requests to `/api/v1/notes/{id}`. Protected
/// notes require their view password as the `password` query parameter;
/// without it, or with the wrong one, the request is rejected. Soft-deleted
/// notes are reported as not found.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `note_id` - The ID of the note to retrieve, extracted from the URL path
/// * `query` - The optional `password` query parameter
///
/// ### Returns
///
/// The note together with its current content as JSON
#[instrument(skip(pool, query), fields(note_id = %note_id))]
pub async fn get_note_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the note ID from the URL path
    Path(note_id): Path<String>,
    // Extract the optional view password from the query string
    Query(query): Query<NotePasswordQueryDto>,
) -> Result<Json<NoteDto>, ApiError> {
    debug!("Retrieving note");

    let note = repo::get_active_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    // A protected note can only be read with its view password
    if let Some(password_hash) = note.get_password_hash() {
        let password = query.password.unwrap_or_default();
        let password_matches =
            auth::verify_password(&password, &password_hash).map_err(ApiError::Database)?;
        if !password_matches {
            debug!("View password missing or wrong");
            return Err(ApiError::Forbidden(
                "You do not have permission to access this note".to_string(),
            ));
        }
    }

    let snapshot = repo::latest_snapshot(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::Database(anyhow::anyhow!("Note {} has no snapshots", note_id)))?;

    Ok(Json(NoteDto::from_note_and_snapshot(&note, &snapshot)))
}

/// Handler for listing notes
///
/// This function handles GET requests to `/api/v1/notes`. The listing
/// covers the active, unprotected notes of all users, newest first, and
/// can be narrowed with the `title`, `content` and `important` query
/// parameters.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `query` - The optional title, content and important filters
///
/// ### Returns
///
/// The matching notes with their current content as JSON
#[instrument(skip(pool, query))]
pub async fn list_notes_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the filter query parameters
    Query(query): Query<NoteQueryDto>,
) -> Result<Json<Vec<NoteDto>>, ApiError> {
    debug!("Listing notes");

    let notes = repo::list_notes_with_filters(&pool, &query).map_err(ApiError::Database)?;

    let dtos = notes
        .iter()
        .map(|(note, snapshot)| NoteDto::from_note_and_snapshot(note, snapshot))
        .collect::<Vec<_>>();

    info!("Retrieved {} notes", dtos.len());

    Ok(Json(dtos))
}

/// Handler for updating a note
///
/// This function handles PUT requests to `/api/v1/notes/{id}`. The title
/// is only written when it actually changed, and the content only produces
/// a new snapshot when it differs from the current one, so re-sending the
/// same state never grows the history.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `note_id` - The ID of the note to update, extracted from the URL path
/// * `payload` - The request payload with the new title and content
///
/// ### Returns
///
/// A 202 response with the updated note as JSON
#[instrument(skip(pool, principal, payload), fields(note_id = %note_id, caller = %principal.username))]
pub async fn update_note_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the note ID from the URL path
    Path(note_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateNoteDto>,
) -> Result<(StatusCode, Json<NoteDto>), ApiError> {
    info!("Updating note");

    payload.validate()?;

    let mut note = repo::get_active_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    // Only touch the title when it actually changed
    if payload.title != note.get_title() {
        note = repo::update_note_title(&pool, &note_id, payload.title)
            .await
            .map_err(ApiError::Database)?;
    }

    // Only append a snapshot when the content differs from the current one
    let latest = repo::latest_snapshot(&pool, &note_id).map_err(ApiError::Database)?;
    let snapshot = match latest {
        Some(snapshot) if snapshot.get_content() == payload.content => snapshot,
        _ => repo::create_snapshot(&pool, &note_id, payload.content)
            .await
            .map_err(ApiError::Database)?,
    };

    info!("Successfully updated note with id: {}", note_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(NoteDto::from_note_and_snapshot(&note, &snapshot)),
    ))
}

/// Handler for deleting a note
///
/// This function handles DELETE requests to `/api/v1/notes`. The note to
/// delete is named in the request body. Deletion is soft: the note stops
/// being visible through the API but its row and history stay in the
/// database.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `payload` - The request payload naming the note to delete
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal, payload), fields(caller = %principal.username))]
pub async fn delete_note_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<DeleteNoteDto>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting note");

    payload.validate()?;

    let note = repo::get_active_note(&pool, &payload.id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    repo::set_note_active(&pool, &payload.id, false)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully deleted note with id: {}", payload.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for marking a note important or not important
///
/// This function handles PATCH requests to `/api/v1/notes/{id}/important`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `note_id` - The ID of the note, extracted from the URL path
/// * `payload` - The request payload with the new flag value
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal, payload), fields(note_id = %note_id, caller = %principal.username))]
pub async fn set_note_important_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the note ID from the URL path
    Path(note_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<SetImportantDto>,
) -> Result<StatusCode, ApiError> {
    info!("Setting important flag on note");

    let note = repo::get_active_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    repo::set_note_important(&pool, &note_id, payload.important)
        .await
        .map_err(ApiError::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for archiving or unarchiving a note
///
/// This function handles PATCH requests to `/api/v1/notes/{id}/archivized`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `note_id` - The ID of the note, extracted from the URL path
/// * `payload` - The request payload with the new flag value
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal, payload), fields(note_id = %note_id, caller = %principal.username))]
pub async fn set_note_archived_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the note ID from the URL path
    Path(note_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<SetArchivedDto>,
) -> Result<StatusCode, ApiError> {
    info!("Setting archived flag on note");

    let note = repo::get_active_note(&pool, &note_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    auth::require_note_write(&principal, &note)?;

    repo::set_note_archived(&pool, &note_id, payload.archived)
        .await
        .map_err(ApiError::Database)?;

    Ok(StatusCode::NO_CONTENT)
}
