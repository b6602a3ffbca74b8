/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for interacting with the database, including
/// creating, retrieving, and updating users, notes, snapshots and
/// categories.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.

mod user_repo;
mod note_repo;
mod snapshot_repo;
mod category_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use note_repo::*;
pub use snapshot_repo::*;
pub use category_repo::*;
