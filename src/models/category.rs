use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Represents a named grouping of notes
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    /// Unique identifier for the category (UUID v4 as string)
    id: String,

    /// The display name of the category
    name: String,

    /// When this category was created
    created_at: NaiveDateTime,

    /// When this category was last updated
    updated_at: NaiveDateTime,
}

impl Category {
    /// Creates a new category with the given name
    pub fn new(name: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new category with all fields specified
    ///
    /// This method is primarily used for testing and database deserialization.
    pub fn new_with_fields(
        id: String,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            created_at: created_at.naive_utc(),
            updated_at: updated_at.naive_utc(),
        }
    }

    /// Gets the category's ID
    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    /// Gets the category's name
    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    /// Sets the category's name
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now().naive_utc();
    }

    /// Gets the category's creation timestamp as a DateTime<Utc>
    pub fn get_created_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.created_at, Utc)
    }

    /// Gets the category's updated timestamp as a DateTime<Utc>
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
