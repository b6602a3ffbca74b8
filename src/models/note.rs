use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Represents a note's metadata
///
/// This struct maps directly to the `notes` table in the database.
/// A note row carries ownership, lifecycle flags and the optional view
/// password; the content itself lives in the `snapshots` table, where
/// the newest snapshot is the note's current content.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Note {
    /// Unique identifier for the note (UUID v4 as string)
    id: String,

    /// The ID of the user who created the note
    owner_id: String,

    /// The title of the note
    title: String,

    /// Argon2 hash of the view password, if the note is protected
    password_hash: Option<String>,

    /// Soft-delete flag; inactive notes are treated as absent by the API
    active: bool,

    /// Whether the note is marked important
    important: bool,

    /// Whether the note has been archived
    archived: bool,

    /// When this note was created
    created_at: NaiveDateTime,

    /// When this note was last updated
    updated_at: NaiveDateTime,
}

impl Note {
    /// Creates a new active note
    ///
    /// This method automatically generates a UUID v4 for the ID and sets
    /// the created_at and updated_at timestamps to the current time. New
    /// notes start active, not important and not archived.
    ///
    /// ### Arguments
    ///
    /// * `owner_id` - The ID of the creating user
    /// * `title` - The title of the note
    /// * `password_hash` - Argon2 hash of the view password, when protected
    ///
    /// ### Returns
    ///
    /// A new `Note` instance
    pub fn new(owner_id: String, title: String, password_hash: Option<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            title,
            password_hash,
            active: true,
            important: false,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new note with all fields specified
    ///
    /// This method is primarily used for testing and database deserialization.
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_fields(
        id: String,
        owner_id: String,
        title: String,
        password_hash: Option<String>,
        active: bool,
        important: bool,
        archived: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            password_hash,
            active,
            important,
            archived,
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        }
    }

    /// Gets the note's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the user who owns the note
    pub fn get_owner_id(&self) -> String {
        self.owner_id.clone()
    }

    /// Gets the note's title
    pub fn get_title(&self) -> String {
        self.title.clone()
    }

    /// Sets the note's title
    ///
    /// ### Arguments
    ///
    /// * `title` - The new title for the note
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the view password hash, if the note is protected
    pub fn get_password_hash(&self) -> Option<String> {
        self.password_hash.clone()
    }

    /// Whether reading this note requires its view password
    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the note is active (not soft deleted)
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sets the soft-delete flag
    ///
    /// ### Arguments
    ///
    /// * `active` - false marks the note as deleted
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Whether the note is marked important
    pub fn is_important(&self) -> bool {
        self.important
    }

    /// Sets the important flag
    pub fn set_important(&mut self, important: bool) {
        self.important = important;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Whether the note has been archived
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// Sets the archived flag
    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the note's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the note's raw creation timestamp
    pub fn get_created_at_raw(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Gets the note's updated timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
