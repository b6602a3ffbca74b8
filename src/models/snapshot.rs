use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Represents one content revision of a note
///
/// This struct maps directly to the `snapshots` table in the database.
/// Snapshots are append-only: editing a note's content appends a new
/// snapshot rather than rewriting an old one. Restoring a snapshot moves
/// its created_at forward so it becomes the newest revision again.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Snapshot {
    /// Unique identifier for the snapshot (UUID v4 as string)
    id: String,

    /// The ID of the note this snapshot belongs to
    note_id: String,

    /// The full note content at the time of this revision
    content: String,

    /// When this snapshot was created (or last restored)
    created_at: NaiveDateTime,

    /// When this snapshot row was last touched
    updated_at: NaiveDateTime,
}

impl Snapshot {
    /// Creates a new snapshot for a note
    ///
    /// ### Arguments
    ///
    /// * `note_id` - The ID of the note this revision belongs to
    /// * `content` - The full content of the revision
    ///
    /// ### Returns
    ///
    /// A new `Snapshot` instance
    pub fn new(note_id: String, content: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            note_id,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new snapshot with all fields specified
    ///
    /// This method is primarily used for testing and database deserialization.
    pub fn new_with_fields(
        id: String,
        note_id: String,
        content: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            note_id,
            content,
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        }
    }

    /// Gets the snapshot's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the ID of the note this snapshot belongs to
    pub fn get_note_id(&self) -> String {
        self.note_id.clone()
    }

    /// Gets the snapshot's content
    pub fn get_content(&self) -> String {
        self.content.clone()
    }

    /// Gets the snapshot's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the snapshot's raw creation timestamp
    pub fn get_created_at_raw(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Gets the snapshot's updated timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
