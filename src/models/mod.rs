/// Data models module
///
/// This module defines the core data structures used throughout the application.
/// It includes database models that map to database tables, as well as methods
/// for creating and manipulating these models.

// Re-export all model types
mod user;
pub use user::User;

mod note;
pub use note::Note;

mod snapshot;
pub use snapshot::Snapshot;

mod category;
pub use category::Category;

mod category_note;
pub use category_note::CategoryNote;
