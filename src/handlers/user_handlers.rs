use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{
        StatusCode,
        header::{self, HeaderName},
    },
};
use axum_extra::extract::Query;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{self, Principal};
use crate::db::DbPool;
use crate::dto::{
    BlockUserDto, CreateUserDto, UpdatePasswordDto, UpdateUserDto, UserQueryDto, UserSummaryDto,
};
use crate::errors::ApiError;
use crate::repo;

/// Handler for registering a new user account
///
/// This function handles POST requests to `/api/v1/user`. Registration is
/// open: besides the health check this is the only endpoint that does not
/// require authentication. New accounts never start with administrator
/// rights.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `payload` - The request payload containing the username and password
///
/// ### Returns
///
/// A 201 response whose body is the new account's id, with a Location
/// header pointing at the account
#[instrument(skip(pool, payload), fields(username = %payload.username))]
pub async fn create_user_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateUserDto>,
) -> Result<(StatusCode, [(HeaderName, String); 1], String), ApiError> {
    info!("Registering new user");

    payload.validate()?;

    // Reject the registration early when the username is already taken
    let existing =
        repo::get_user_by_username(&pool, &payload.username).map_err(ApiError::Database)?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }
    // TODO: also map the unique constraint violation to Conflict so
    // concurrent registrations of the same username do not surface as 500

    let password_hash = auth::hash_password(&payload.password).map_err(ApiError::Database)?;

    let user = repo::create_user(&pool, payload.username, password_hash, false)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully registered user with id: {}", user.get_id());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/user/{}", user.get_id()))],
        user.get_id(),
    ))
}

/// Handler for looking up users by id
///
/// This function handles GET requests to `/api/v1/user`. The ids to look up
/// are passed as repeated `id` query parameters; ids that do not match any
/// account are skipped.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `query` - The repeated `id` query parameters
///
/// ### Returns
///
/// The matching users as JSON, without their password hashes
#[instrument(skip(pool))]
pub async fn get_users_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the repeated `id` query parameters
    Query(query): Query<UserQueryDto>,
) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    debug!("Retrieving users by id");

    if query.id.is_empty() {
        return Err(ApiError::Validation(
            "At least one user id must be provided".to_string(),
        ));
    }

    let users = repo::get_users_by_ids(&pool, &query.id).map_err(ApiError::Database)?;

    if users.is_empty() {
        return Err(ApiError::NotFound("No users found".to_string()));
    }

    let summaries = users
        .iter()
        .map(UserSummaryDto::from_user)
        .collect::<Vec<_>>();

    info!("Retrieved {} users", summaries.len());

    Ok(Json(summaries))
}

/// Handler for updating a user account
///
/// This function handles PUT requests to `/api/v1/user/{id}`. Callers may
/// update their own account; administrators may update any account. Only
/// the fields present in the payload are changed.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `user_id` - The ID of the account to update, extracted from the URL path
/// * `payload` - The request payload with the optional new username and password
///
/// ### Returns
///
/// A confirmation message as JSON
#[instrument(skip(pool, principal, payload), fields(user_id = %user_id, caller = %principal.username))]
pub async fn update_user_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the user ID from the URL path
    Path(user_id): Path<String>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdateUserDto>,
) -> Result<Json<Value>, ApiError> {
    info!("Updating user");

    payload.validate()?;
    auth::require_user_write(&principal, &user_id)?;

    // Make sure the account exists before touching it
    repo::get_user(&pool, &user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // A changed username must stay unique across all accounts
    if let Some(ref username) = payload.username {
        let existing = repo::get_user_by_username(&pool, username).map_err(ApiError::Database)?;
        if existing.is_some_and(|other| other.get_id() != user_id) {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }
    }

    // Only hash when the caller actually sends a new password
    let password_hash = match payload.password {
        Some(ref password) => Some(auth::hash_password(password).map_err(ApiError::Database)?),
        None => None,
    };

    repo::update_user(&pool, &user_id, payload.username, password_hash)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully updated user with id: {}", user_id);

    Ok(Json(json!({ "message": "User updated successfully" })))
}

/// Handler for changing a user's password
///
/// This function handles PUT requests to `/api/v1/user/password`. The
/// caller has to prove they know the current password before the new one
/// is stored.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `payload` - The request payload with the user id and both passwords
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal, payload), fields(caller = %principal.username))]
pub async fn update_password_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<UpdatePasswordDto>,
) -> Result<StatusCode, ApiError> {
    info!("Changing user password");

    payload.validate()?;

    let user = repo::get_user(&pool, &payload.user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    auth::require_user_write(&principal, &payload.user_id)?;

    // The old password has to match before anything changes
    let old_password_matches =
        auth::verify_password(&payload.old_password, &user.get_password_hash())
            .map_err(ApiError::Database)?;
    if !old_password_matches {
        return Err(ApiError::Validation("Old password is incorrect".to_string()));
    }

    let password_hash = auth::hash_password(&payload.new_password).map_err(ApiError::Database)?;

    repo::update_user(&pool, &payload.user_id, None, Some(password_hash))
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Successfully changed password for user with id: {}",
        payload.user_id
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for deleting a user account
///
/// This function handles DELETE requests to `/api/v1/user/{id}`. Callers
/// may delete their own account; administrators may delete any account.
/// The notes owned by the account are deleted with it.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `user_id` - The ID of the account to delete, extracted from the URL path
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal), fields(user_id = %user_id, caller = %principal.username))]
pub async fn delete_user_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract the user ID from the URL path
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting user");

    auth::require_user_write(&principal, &user_id)?;

    // First check that the account exists
    repo::get_user(&pool, &user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    repo::delete_user(&pool, &user_id)
        .await
        .map_err(ApiError::Database)?;

    info!("Successfully deleted user with id: {}", user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for blocking or unblocking a user account
///
/// This function handles PUT requests to `/api/v1/user/block`. Only
/// administrators may change the blocked flag; a blocked account can no
/// longer authenticate.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `principal` - The authenticated caller
/// * `payload` - The request payload with the user id and the new flag
///
/// ### Returns
///
/// An empty 204 response on success
#[instrument(skip(pool, principal, payload), fields(caller = %principal.username))]
pub async fn block_user_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    // Extract the authenticated caller stored by the auth middleware
    Extension(principal): Extension<Principal>,
    // Extract and deserialize the JSON request body
    Json(payload): Json<BlockUserDto>,
) -> Result<StatusCode, ApiError> {
    info!("Setting user blocked flag");

    if !principal.admin {
        return Err(ApiError::Forbidden(
            "Only administrators can block users".to_string(),
        ));
    }

    payload.validate()?;

    repo::get_user(&pool, &payload.user_id)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    repo::set_user_blocked(&pool, &payload.user_id, payload.block)
        .await
        .map_err(ApiError::Database)?;

    info!(
        "Set blocked = {} for user with id: {}",
        payload.block, payload.user_id
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repo;
    use crate::test_utils::setup_test_db;

    async fn create_user(pool: &Arc<DbPool>, username: &str, password: &str, admin: bool) -> User {
        let password_hash = auth::hash_password(password).unwrap();
        repo::create_user(pool, username.to_string(), password_hash, admin)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_user_handler() {
        let pool = setup_test_db();

        let payload = CreateUserDto {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };

        // Call the handler
        let (status, [(name, location)], id) =
            create_user_handler(State(pool.clone()), Json(payload))
                .await
                .unwrap();

        // Check the response shape
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(name, header::LOCATION);
        assert_eq!(location, format!("/api/v1/user/{id}"));

        // Check the stored account
        let user = repo::get_user(&pool, &id).unwrap().unwrap();
        assert_eq!(user.get_username(), "alice");
        assert!(!user.is_admin());
        assert!(!user.is_blocked());

        // The password must be stored hashed, never as plain text
        assert_ne!(user.get_password_hash(), "secret");
        assert!(auth::verify_password("secret", &user.get_password_hash()).unwrap());
    }

    #[tokio::test]
    async fn test_create_user_handler_duplicate_username() {
        let pool = setup_test_db();

        create_user(&pool, "alice", "secret", false).await;

        let payload = CreateUserDto {
            username: "alice".to_string(),
            password: "other".to_string(),
        };

        let result = create_user_handler(State(pool.clone()), Json(payload)).await;

        assert!(matches!(result.unwrap_err(), ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_user_handler_rejects_blank_username() {
        let pool = setup_test_db();

        let payload = CreateUserDto {
            username: "   ".to_string(),
            password: "secret".to_string(),
        };

        let result = create_user_handler(State(pool.clone()), Json(payload)).await;

        assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_users_handler() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        let bob = create_user(&pool, "bob", "secret", false).await;

        let query = UserQueryDto {
            id: vec![
                alice.get_id(),
                bob.get_id(),
                // Unknown ids are skipped rather than failing the request
                "nonexistent".to_string(),
            ],
        };

        let result = get_users_handler(State(pool.clone()), Query(query))
            .await
            .unwrap();

        let summaries = result.0;
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().any(|s| s.username == "alice"));
        assert!(summaries.iter().any(|s| s.username == "bob"));
    }

    #[tokio::test]
    async fn test_get_users_handler_requires_ids() {
        let pool = setup_test_db();

        let result = get_users_handler(State(pool.clone()), Query(UserQueryDto::default())).await;

        assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_users_handler_not_found() {
        let pool = setup_test_db();

        let query = UserQueryDto {
            id: vec!["nonexistent".to_string()],
        };

        let result = get_users_handler(State(pool.clone()), Query(query)).await;

        assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_user_handler_own_account() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;

        let payload = UpdateUserDto {
            username: Some("alicia".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Path(alice.get_id()),
            Json(payload),
        )
        .await
        .unwrap();

        assert_eq!(result.0["message"], "User updated successfully");

        let updated = repo::get_user(&pool, &alice.get_id()).unwrap().unwrap();
        assert_eq!(updated.get_username(), "alicia");
        // The password hash is untouched when no new password is sent
        assert_eq!(updated.get_password_hash(), alice.get_password_hash());
    }

    #[tokio::test]
    async fn test_update_user_handler_forbidden_for_other_accounts() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        let bob = create_user(&pool, "bob", "secret", false).await;

        let payload = UpdateUserDto {
            username: Some("mallory".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&bob)),
            Path(alice.get_id()),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));

        // Alice is unchanged
        let unchanged = repo::get_user(&pool, &alice.get_id()).unwrap().unwrap();
        assert_eq!(unchanged.get_username(), "alice");
    }

    #[tokio::test]
    async fn test_update_user_handler_admin_can_update_others() {
        let pool = setup_test_db();

        let admin = create_user(&pool, "root", "secret", true).await;
        let alice = create_user(&pool, "alice", "secret", false).await;

        let payload = UpdateUserDto {
            username: Some("alicia".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Path(alice.get_id()),
            Json(payload),
        )
        .await;

        assert!(result.is_ok());

        let updated = repo::get_user(&pool, &alice.get_id()).unwrap().unwrap();
        assert_eq!(updated.get_username(), "alicia");
    }

    #[tokio::test]
    async fn test_update_user_handler_rejects_taken_username() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        create_user(&pool, "bob", "secret", false).await;

        let payload = UpdateUserDto {
            username: Some("bob".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Path(alice.get_id()),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_user_handler_accepts_own_username() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;

        // Re-sending the current username is not a conflict
        let payload = UpdateUserDto {
            username: Some("alice".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Path(alice.get_id()),
            Json(payload),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_user_handler_not_found() {
        let pool = setup_test_db();

        let admin = create_user(&pool, "root", "secret", true).await;

        let payload = UpdateUserDto {
            username: Some("ghost".to_string()),
            password: None,
        };

        let result = update_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Path("nonexistent".to_string()),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_password_handler() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "old-secret", false).await;

        let payload = UpdatePasswordDto {
            user_id: alice.get_id(),
            old_password: "old-secret".to_string(),
            new_password: "new-secret".to_string(),
        };

        let status = update_password_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Json(payload),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);

        let updated = repo::get_user(&pool, &alice.get_id()).unwrap().unwrap();
        assert!(auth::verify_password("new-secret", &updated.get_password_hash()).unwrap());
        assert!(!auth::verify_password("old-secret", &updated.get_password_hash()).unwrap());
    }

    #[tokio::test]
    async fn test_update_password_handler_wrong_old_password() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "old-secret", false).await;

        let payload = UpdatePasswordDto {
            user_id: alice.get_id(),
            old_password: "wrong".to_string(),
            new_password: "new-secret".to_string(),
        };

        let result = update_password_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));

        // The stored hash still matches the old password
        let unchanged = repo::get_user(&pool, &alice.get_id()).unwrap().unwrap();
        assert!(auth::verify_password("old-secret", &unchanged.get_password_hash()).unwrap());
    }

    #[tokio::test]
    async fn test_update_password_handler_forbidden_for_other_accounts() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        let bob = create_user(&pool, "bob", "secret", false).await;

        let payload = UpdatePasswordDto {
            user_id: alice.get_id(),
            old_password: "secret".to_string(),
            new_password: "hijacked".to_string(),
        };

        let result = update_password_handler(
            State(pool.clone()),
            Extension(Principal::from(&bob)),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_user_handler() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;

        let status = delete_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Path(alice.get_id()),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(repo::get_user(&pool, &alice.get_id()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_handler_not_found() {
        let pool = setup_test_db();

        let admin = create_user(&pool, "root", "secret", true).await;

        let result = delete_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Path("nonexistent".to_string()),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_handler_forbidden_for_other_accounts() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        let bob = create_user(&pool, "bob", "secret", false).await;

        let result = delete_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&bob)),
            Path(alice.get_id()),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));
        assert!(repo::get_user(&pool, &alice.get_id()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_block_user_handler_requires_admin() {
        let pool = setup_test_db();

        let alice = create_user(&pool, "alice", "secret", false).await;
        let bob = create_user(&pool, "bob", "secret", false).await;

        let payload = BlockUserDto {
            user_id: bob.get_id(),
            block: true,
        };

        let result = block_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&alice)),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));
        assert!(!repo::get_user(&pool, &bob.get_id()).unwrap().unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_block_user_handler() {
        let pool = setup_test_db();

        let admin = create_user(&pool, "root", "secret", true).await;
        let alice = create_user(&pool, "alice", "secret", false).await;

        let payload = BlockUserDto {
            user_id: alice.get_id(),
            block: true,
        };

        let status = block_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Json(payload),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(repo::get_user(&pool, &alice.get_id()).unwrap().unwrap().is_blocked());

        // Unblocking works the same way
        let payload = BlockUserDto {
            user_id: alice.get_id(),
            block: false,
        };

        block_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Json(payload),
        )
        .await
        .unwrap();

        assert!(!repo::get_user(&pool, &alice.get_id()).unwrap().unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_block_user_handler_not_found() {
        let pool = setup_test_db();

        let admin = create_user(&pool, "root", "secret", true).await;

        let payload = BlockUserDto {
            user_id: "nonexistent".to_string(),
            block: true,
        };

        let result = block_user_handler(
            State(pool.clone()),
            Extension(Principal::from(&admin)),
            Json(payload),
        )
        .await;

        assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
    }
}
