use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::{Category, CategoryNote, Note};
use crate::schema::{categories, category_notes, notes};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new category in the database
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The name of the new category
///
/// ### Returns
///
/// A Result containing the newly created Category if successful
#[instrument(skip(pool), fields(name = %name))]
pub async fn create_category(pool: &DbPool, name: String) -> Result<Category> {
    debug!("Creating new category");

    let mut conn = pool.get()?;

    let new_category = Category::new(name);

    diesel::insert_into(categories::table)
        .values(new_category.clone())
        .execute_with_retry(&mut conn)
        .await?;

    info!(
        "Successfully created category with id: {}",
        new_category.get_id()
    );

    Ok(new_category)
}

/// Retrieves a category from the database by its ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `category_id` - The ID of the category to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the Category if found, or None if
/// not found
#[instrument(skip(pool), fields(category_id = %category_id))]
pub fn get_category(pool: &DbPool, category_id: &str) -> Result<Option<Category>> {
    debug!("Retrieving category by id");

    let conn = &mut pool.get()?;

    let result = categories::table
        .filter(categories::id.eq(category_id))
        .first::<Category>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves all categories in creation order
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
///
/// ### Returns
///
/// A Result containing a vector of all Categories
#[instrument(skip(pool))]
pub fn list_categories(pool: &DbPool) -> Result<Vec<Category>> {
    debug!("Listing all categories");

    let conn = &mut pool.get()?;

    let result = categories::table
        .order_by(categories::created_at.asc())
        .load::<Category>(conn)?;

    info!("Retrieved {} categories", result.len());

    Ok(result)
}

/// Updates a category's name and replaces its note membership
///
/// The given note IDs become the category's complete membership; any
/// previous assignments not listed are removed.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `category_id` - The ID of the category to update
/// * `name` - The new name of the category
/// * `note_ids` - The IDs of the notes that belong to the category
///
/// ### Returns
///
/// A Result containing the updated Category if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The category is not found
/// - Any of the note IDs does not reference a stored note
/// - A database operation fails
#[instrument(skip(pool), fields(category_id = %category_id, note_count = note_ids.len()))]
pub async fn update_category(
    pool: &DbPool,
    category_id: &str,
    name: String,
    note_ids: &[String],
) -> Result<Category> {
    debug!("Updating category");

    get_category(pool, category_id)?
        .ok_or_else(|| anyhow::anyhow!("Category with id {} not found", category_id))?;

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(categories::table.find(category_id.to_string()))
        .set((categories::name.eq(name), categories::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    // Replace the membership wholesale; the request carries the full list
    diesel::delete(
        category_notes::table.filter(category_notes::category_id.eq(category_id.to_string())),
    )
    .execute_with_retry(&mut conn)
    .await?;

    if !note_ids.is_empty() {
        let assignments: Vec<CategoryNote> = note_ids
            .iter()
            .map(|note_id| CategoryNote::new(category_id.to_string(), note_id.clone()))
            .collect();

        diesel::insert_into(category_notes::table)
            .values(assignments)
            .execute_with_retry(&mut conn)
            .await?;
    }

    drop(conn);

    let updated_category = get_category(pool, category_id)?
        .ok_or_else(|| anyhow::anyhow!("Category with id {} not found after update", category_id))?;

    info!("Successfully updated category with id: {}", category_id);

    Ok(updated_category)
}

/// Deletes a category from the database by its ID
///
/// The join rows disappear through the cascading foreign key; the notes
/// themselves are untouched.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `category_id` - The ID of the category to delete
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(category_id = %category_id))]
pub async fn delete_category(pool: &DbPool, category_id: &str) -> Result<()> {
    debug!("Deleting category by id");

    let mut conn = pool.get()?;

    diesel::delete(categories::table.find(category_id.to_string()))
        .execute_with_retry(&mut conn)
        .await?;

    debug!("Successfully deleted category with id: {}", category_id);

    Ok(())
}

/// Retrieves the active notes assigned to a category, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `category_id` - The ID of the category
///
/// ### Returns
///
/// A Result containing a vector of the category's active Notes
#[instrument(skip(pool), fields(category_id = %category_id))]
pub fn notes_for_category(pool: &DbPool, category_id: &str) -> Result<Vec<Note>> {
    debug!("Listing notes for category");

    let conn = &mut pool.get()?;

    let result = category_notes::table
        .inner_join(notes::table)
        .filter(category_notes::category_id.eq(category_id))
        .filter(notes::active.eq(true))
        .select(Note::as_select())
        .order_by(notes::created_at.desc())
        .load::<Note>(conn)?;

    info!("Retrieved {} notes for category", result.len());

    Ok(result)
}
