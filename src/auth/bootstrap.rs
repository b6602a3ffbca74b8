use anyhow::Result;
use tracing::{info, instrument};

use crate::auth::password::hash_password;
use crate::db::DbPool;
use crate::repo;

/// Username of the administrator account created on first start
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the administrator account created on first start
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Creates the default administrator account if it does not exist yet
///
/// Runs once at startup so a fresh database always contains an account
/// that can manage the others. The password should be changed right after
/// the first login.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
///
/// ### Errors
///
/// Returns an error if the lookup or the insert fails
#[instrument(skip(pool))]
pub async fn ensure_admin_user(pool: &DbPool) -> Result<()> {
    if repo::get_user_by_username(pool, DEFAULT_ADMIN_USERNAME)?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
    let user = repo::create_user(
        pool,
        DEFAULT_ADMIN_USERNAME.to_string(),
        password_hash,
        true,
    )
    .await?;

    info!(
        "Created default administrator account with id: {}",
        user.get_id()
    );
    Ok(())
}
