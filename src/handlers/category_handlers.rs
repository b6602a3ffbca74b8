use axum::{
    Json,
    extract::{Path, State},
    http::{
        StatusCode,
        header::{self, HeaderName},
    },
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::db::DbPool;
use crate::dto::{CategoryDto, CreateCategoryDto, NoteDto, UpdateCategoryDto};
use crate::errors::ApiError;
use crate::models::Category;
use crate::repo;

/// Builds the API representation of a category
///
/// The attached notes are resolved to their current content. Protected
/// notes are left out, the same way listings leave them out.
fn build_category_dto(pool: &DbPool, category: &Category) -> Result<CategoryDto, ApiError> {
    let notes = repo::notes_for_category(pool, &category.get_id()).map_err(ApiError::Database)?;

    let mut dtos = Vec::new();
    for note in notes {
        if note.is_protected() {
            continue;
        }

        let Some(snapshot) =
            repo::latest_snapshot(pool, &note.get_id()).map_err(ApiError::Database)?
        else {
            continue;
        };

        dtos.push(NoteDto::from_note_and_snapshot(&note, &snapshot));
    }

    Ok(CategoryDto::from_category(category, dtos))
}

/// Handler for creating a new category
///
/// This function handles POST requests to `/api/v1/categories`. Categories
/// are shared between all users; any authenticated caller may create one.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `payload` - The request payload containing the category name
///
/// ### Returns
///
/// A 201 response whose body is the new category's id, with a Location
/// header pointing at the category
#[instrument(skip(pool, payload), fields(name = %payload.name))]
pub async fn create_category_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateCategoryDto>,
) -> Result<(StatusCode, [(HeaderName, String); 1], String), ApiError> {
    info!("Creating new category");

    payload.validate()?;

    let category = repo::create_category(&pool, payload.name)
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Successfully created category with id: {}",
        category.get_id()
    );

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!("/api/v1/categories/{}", category.get_id()),
        )],
        category.get_id(),
    ))
}

/// Handler for listing all categories
///
/// This function handles GET requests to `/api/v1/categories`. Each
/// category comes with the notes attached to it, resolved to their
/// current content.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
///
/// ### Returns
///
/// All categories with their notes as JSON, oldest first
#[instrument(skip(pool))]
pub async fn list_categories_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    debug!("Listing categories");

    let categories = repo::list_categories(&pool).map_err(ApiError::Database)?;

    let mut dtos = Vec::new();
    for category in &categories {
        dtos.push(build_category_dto(&pool, category)?);
    }

    info!("Retrieved {} categories", dtos.len());

    Ok(Json(dtos))
}

/// Handler for retrieving a single category
///
/// This function handles GET requests to `/api/v1/categories/{id}`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `category_id` - The ID of the category, extracted from the URL path
///
/// ### Returns
///
/// The category with its notes as JSON
#[instrument(skip(pool), fields(category_id = %category_id))]
pub async fn get_category_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the category ID from the URL path
    Path(category_id): Path<String>,
) -> Result<Json<CategoryDto>, ApiError> {
    debug!("Retrieving category");

    let category = repo::get_category(&pool, &category_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(build_category_dto(&pool, &category)?))
}

/// Handler for updating a category
///
/// This function handles PUT requests to `/api/v1/categories/{id}`. The
/// payload carries the new name and the full set of attached note ids;
/// the previous membership is replaced by the given one.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `category_id` - The ID of the category, extracted from the URL path
/// * `payload` - The request payload with the new name and note ids
///
/// ### Returns
///
/// The updated category with its notes as JSON
#[instrument(skip(pool, payload), fields(category_id = %category_id))]
pub async fn update_category_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the category ID from the URL path
    Path(category_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateCategoryDto>,
) -> Result<Json<CategoryDto>, ApiError> {
    info!("Updating category");

    payload.validate()?;

    repo::get_category(&pool, &category_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    // Every note named in the payload has to exist
    for note_id in &payload.note_ids {
        repo::get_note(&pool, note_id)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;
    }

    let category = repo::update_category(&pool, &category_id, payload.name, &payload.note_ids)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully updated category with id: {}", category_id);

    Ok(Json(build_category_dto(&pool, &category)?))
}

/// Handler for deleting a category
///
/// This function handles DELETE requests to `/api/v1/categories/{id}`.
/// Only the category and its note attachments are removed; the notes
/// themselves are untouched.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `category_id` - The ID of the category, extracted from the URL path
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool), fields(category_id = %category_id))]
pub async fn delete_category_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the category ID from the URL path
    Path(category_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting category");

    repo::get_category(&pool, &category_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    repo::delete_category(&pool, &category_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully deleted category with id: {}", category_id);

    Ok(StatusCode::NO_CONTENT)
}
