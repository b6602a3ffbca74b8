use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Represents a user account
///
/// This struct maps directly to the `users` table in the database.
/// The password is stored as an argon2 hash and never leaves the
/// persistence layer; API responses use DTOs that omit it.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Login name, unique across all accounts
    username: String,

    /// Argon2 hash of the user's password
    password_hash: String,

    /// Whether this account has administrator rights
    admin: bool,

    /// Whether this account is blocked from authenticating
    blocked: bool,

    /// When this user was created
    created_at: NaiveDateTime,

    /// When this user was last updated
    updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new user with the given username and password hash
    ///
    /// This method automatically generates a UUID v4 for the ID and sets
    /// the created_at and updated_at timestamps to the current time.
    /// New accounts start unblocked.
    ///
    /// ### Arguments
    ///
    /// * `username` - The login name for the account
    /// * `password_hash` - The argon2 hash of the account password
    /// * `admin` - Whether the account has administrator rights
    ///
    /// ### Returns
    ///
    /// A new `User` instance
    pub fn new(username: String, password_hash: String, admin: bool) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            admin,
            blocked: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new user with all fields specified
    ///
    /// This method is primarily used for testing and database deserialization.
    pub fn new_with_fields(
        id: String,
        username: String,
        password_hash: String,
        admin: bool,
        blocked: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            admin,
            blocked,
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        }
    }

    /// Gets the user's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the user's username
    pub fn get_username(&self) -> String {
        self.username.clone()
    }

    /// Sets the user's username
    ///
    /// ### Arguments
    ///
    /// * `username` - The new login name for the account
    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the stored password hash
    pub fn get_password_hash(&self) -> String {
        self.password_hash.clone()
    }

    /// Sets the stored password hash
    ///
    /// ### Arguments
    ///
    /// * `password_hash` - The argon2 hash of the new password
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Whether this account has administrator rights
    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Whether this account is blocked from authenticating
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Sets the blocked flag
    ///
    /// ### Arguments
    ///
    /// * `blocked` - Whether the account should be blocked
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the user's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the user's updated timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
