use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

/// Represents an assignment of a note to a category
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::category_notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryNote {
    /// The ID of the category
    category_id: String,

    /// The ID of the note
    note_id: String,

    /// When this assignment was created
    created_at: NaiveDateTime,
}

impl CategoryNote {
    /// Creates a new category assignment
    ///
    /// ### Arguments
    ///
    /// * `category_id` - The ID of the category
    /// * `note_id` - The ID of the note
    ///
    /// ### Returns
    ///
    /// A new `CategoryNote` instance with the specified category and note IDs
    pub fn new(category_id: String, note_id: String) -> Self {
        Self {
            category_id,
            note_id,
            created_at: Utc::now().naive_utc(),
        }
    }

    /// Gets the category ID
    pub fn get_category_id(&self) -> String {
        self.category_id.clone()
    }

    /// Gets the note ID
    pub fn get_note_id(&self) -> String {
        self.note_id.clone()
    }

    /// Gets the creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }
}
