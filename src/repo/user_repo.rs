use crate::db::{DbPool, ExecuteWithRetry};
use crate::models::User;
use crate::schema::users;
use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new user in the database
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `username` - The login name for the new account
/// * `password_hash` - The argon2 hash of the account password
/// * `admin` - Whether the account has administrator rights
///
/// ### Returns
///
/// A Result containing the newly created User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The database insert operation fails, including when the username is
///   already taken
#[instrument(skip(pool, password_hash), fields(username = %username))]
pub async fn create_user(
    pool: &DbPool,
    username: String,
    password_hash: String,
    admin: bool,
) -> Result<User> {
    debug!("Creating new user");

    let mut conn = pool.get()?;

    let new_user = User::new(username, password_hash, admin);

    // Insert the new user into the database
    diesel::insert_into(users::table)
        .values(new_user.clone())
        .execute_with_retry(&mut conn)
        .await?;

    info!("Successfully created user with id: {}", new_user.get_id());

    Ok(new_user)
}

/// Retrieves a user from the database by ID
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user to retrieve
///
/// ### Returns
///
/// A Result containing an Option with the User if found, or None if not found
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    debug!("Retrieving user by id");

    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::id.eq(user_id))
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a user from the database by username
///
/// The username column carries a unique index, so at most one row can
/// match.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `username` - The login name to look up
///
/// ### Returns
///
/// A Result containing an Option with the User if found, or None if not found
#[instrument(skip(pool), fields(username = %username))]
pub fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    debug!("Retrieving user by username");

    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::username.eq(username))
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves all users matching the given IDs
///
/// IDs that do not correspond to a stored user are silently skipped, so
/// the returned list can be shorter than the input.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_ids` - The IDs of the users to fetch
///
/// ### Returns
///
/// A Result containing a vector of the found Users
#[instrument(skip(pool), fields(count = user_ids.len()))]
pub fn get_users_by_ids(pool: &DbPool, user_ids: &[String]) -> Result<Vec<User>> {
    debug!("Retrieving users by ids");

    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::id.eq_any(user_ids))
        .load::<User>(conn)?;

    info!("Retrieved {} of {} requested users", result.len(), user_ids.len());

    Ok(result)
}

/// Updates a user's username and/or password hash
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user to update
/// * `username` - The new login name, if it should change
/// * `password_hash` - The new password hash, if it should change
///
/// ### Returns
///
/// A Result containing the updated User if successful
///
/// ### Errors
///
/// Returns an error if:
/// - The user is not found
/// - The database update operation fails
#[instrument(skip(pool, password_hash), fields(user_id = %user_id))]
pub async fn update_user(
    pool: &DbPool,
    user_id: &str,
    username: Option<String>,
    password_hash: Option<String>,
) -> Result<User> {
    debug!("Updating user by id");

    // Check the user exists before touching anything
    get_user(pool, user_id)?
        .ok_or_else(|| anyhow::anyhow!("User with id {} not found", user_id))?;

    let now = Utc::now().naive_utc();

    // Only the provided fields end up in the update statement
    #[derive(AsChangeset, Clone)]
    #[diesel(table_name = users)]
    struct UserChangeset {
        username: Option<String>,
        password_hash: Option<String>,
        updated_at: NaiveDateTime,
    }

    let changeset = UserChangeset {
        username,
        password_hash,
        updated_at: now,
    };

    let mut conn = pool.get()?;

    diesel::update(users::table.find(user_id.to_string()))
        .set(changeset)
        .execute_with_retry(&mut conn)
        .await?;

    drop(conn);

    let updated_user = get_user(pool, user_id)?
        .ok_or_else(|| anyhow::anyhow!("User with id {} not found after update", user_id))?;

    info!("Successfully updated user with id: {}", user_id);

    Ok(updated_user)
}

/// Sets the blocked flag on a user account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user to block or unblock
/// * `blocked` - The new value of the blocked flag
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(user_id = %user_id, blocked = blocked))]
pub async fn set_user_blocked(pool: &DbPool, user_id: &str, blocked: bool) -> Result<()> {
    debug!("Setting blocked flag on user");

    let now = Utc::now().naive_utc();

    let mut conn = pool.get()?;

    diesel::update(users::table.find(user_id.to_string()))
        .set((users::blocked.eq(blocked), users::updated_at.eq(now)))
        .execute_with_retry(&mut conn)
        .await?;

    info!("Set blocked = {} on user with id: {}", blocked, user_id);

    Ok(())
}

/// Deletes a user from the database by ID
///
/// The user's notes, and through them their snapshots, are removed by the
/// cascading foreign keys.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The ID of the user to delete
///
/// ### Returns
///
/// A Result indicating success (Ok(())) or an error
#[instrument(skip(pool), fields(user_id = %user_id))]
pub async fn delete_user(pool: &DbPool, user_id: &str) -> Result<()> {
    debug!("Deleting user by id");

    let mut conn = pool.get()?;

    diesel::delete(users::table.find(user_id.to_string()))
        .execute_with_retry(&mut conn)
        .await?;

    debug!("Successfully deleted user with id: {}", user_id);

    Ok(())
}
