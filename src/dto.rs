use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::models::{Category, Note, Snapshot, User};

/// Whether a string is empty or contains only whitespace
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Data transfer object for registering a new user
///
/// This struct is used to deserialize JSON requests for creating accounts.
#[derive(Deserialize, Debug)]
pub struct CreateUserDto {
    /// The login name for the new account
    pub username: String,

    /// The plaintext password for the new account
    pub password: String,
}

impl CreateUserDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.username) {
            return Err(ApiError::Validation("Username cannot be blank".to_string()));
        }
        if is_blank(&self.password) {
            return Err(ApiError::Validation("Password cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for updating an existing user
///
/// Both fields are optional; only the provided ones are changed.
#[derive(Deserialize, Debug)]
pub struct UpdateUserDto {
    /// The new login name, if it should change
    pub username: Option<String>,

    /// The new plaintext password, if it should change
    pub password: Option<String>,
}

impl UpdateUserDto {
    /// Checks that any provided field is filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.as_deref().is_some_and(is_blank) {
            return Err(ApiError::Validation("Username cannot be blank".to_string()));
        }
        if self.password.as_deref().is_some_and(is_blank) {
            return Err(ApiError::Validation("Password cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for changing a user's password
///
/// The old password has to match before the new one is stored.
#[derive(Deserialize, Debug)]
pub struct UpdatePasswordDto {
    /// The ID of the user whose password changes
    pub user_id: String,

    /// The current plaintext password
    pub old_password: String,

    /// The new plaintext password
    pub new_password: String,
}

impl UpdatePasswordDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.user_id) {
            return Err(ApiError::Validation("User id cannot be blank".to_string()));
        }
        if is_blank(&self.old_password) {
            return Err(ApiError::Validation(
                "Old password cannot be blank".to_string(),
            ));
        }
        if is_blank(&self.new_password) {
            return Err(ApiError::Validation(
                "New password cannot be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Data transfer object for blocking or unblocking a user
///
/// This struct is used to deserialize JSON requests on the admin-only
/// block endpoint.
#[derive(Deserialize, Debug)]
pub struct BlockUserDto {
    /// The ID of the user to block or unblock
    pub user_id: String,

    /// Whether the account should be blocked
    pub block: bool,
}

impl BlockUserDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.user_id) {
            return Err(ApiError::Validation("User id cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for querying users by ID
///
/// The `id` parameter may be repeated to fetch several users at once.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct UserQueryDto {
    /// The IDs of the users to fetch
    pub id: Vec<String>,
}

/// Data transfer object for creating a new note
///
/// This struct is used to deserialize JSON requests for creating notes.
#[derive(Deserialize, Debug)]
pub struct CreateNoteDto {
    /// The title of the note
    pub title: String,

    /// The initial content of the note
    pub content: String,

    /// An optional plaintext password protecting reads of the note
    pub password: Option<String>,
}

impl CreateNoteDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.title) {
            return Err(ApiError::Validation("Title cannot be blank".to_string()));
        }
        if is_blank(&self.content) {
            return Err(ApiError::Validation("Content cannot be blank".to_string()));
        }
        if self.password.as_deref().is_some_and(is_blank) {
            return Err(ApiError::Validation("Password cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for updating a note's title and content
#[derive(Deserialize, Debug)]
pub struct UpdateNoteDto {
    /// The new title of the note
    pub title: String,

    /// The new content of the note
    pub content: String,
}

impl UpdateNoteDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.title) {
            return Err(ApiError::Validation("Title cannot be blank".to_string()));
        }
        if is_blank(&self.content) {
            return Err(ApiError::Validation("Content cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for deleting a note
///
/// Deletion is soft; the note is marked inactive and disappears from the
/// API without its snapshots being removed.
#[derive(Deserialize, Debug)]
pub struct DeleteNoteDto {
    /// The ID of the note to delete
    pub id: String,
}

impl DeleteNoteDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.id) {
            return Err(ApiError::Validation("Id cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for toggling a note's important flag
#[derive(Deserialize, Debug)]
pub struct SetImportantDto {
    /// Whether the note is marked important
    pub important: bool,
}

/// Data transfer object for toggling a note's archived flag
#[derive(Deserialize, Debug)]
pub struct SetArchivedDto {
    /// Whether the note is archived
    pub archived: bool,
}

/// Data transfer object for filtering the note listing
///
/// All filters are optional; omitted ones match every note.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct NoteQueryDto {
    /// A case-insensitive substring the title has to contain
    pub title: Option<String>,

    /// A case-insensitive substring the content has to contain
    pub content: Option<String>,

    /// The exact important flag to filter by
    pub important: Option<bool>,
}

/// Data transfer object for the password query parameter on note reads
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct NotePasswordQueryDto {
    /// The plaintext password for a protected note
    pub password: Option<String>,
}

/// Data transfer object for creating a new category
#[derive(Deserialize, Debug)]
pub struct CreateCategoryDto {
    /// The name of the category
    pub name: String,
}

impl CreateCategoryDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.name) {
            return Err(ApiError::Validation("Name cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Data transfer object for updating a category
///
/// The provided note IDs replace the category's previous membership.
#[derive(Deserialize, Debug)]
pub struct UpdateCategoryDto {
    /// The new name of the category
    pub name: String,

    /// The IDs of the notes that belong to the category
    pub note_ids: Vec<String>,
}

impl UpdateCategoryDto {
    /// Checks that all required fields are filled in
    pub fn validate(&self) -> Result<(), ApiError> {
        if is_blank(&self.name) {
            return Err(ApiError::Validation("Name cannot be blank".to_string()));
        }
        if self.note_ids.iter().any(|id| is_blank(id)) {
            return Err(ApiError::Validation("Note id cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Response shape for a user in listings
///
/// Only the public fields of an account are exposed; the password hash
/// never appears in a response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummaryDto {
    /// The user's ID
    pub id: String,

    /// The user's login name
    pub username: String,
}

impl UserSummaryDto {
    /// Builds the response shape for a stored user
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.get_id(),
            username: user.get_username(),
        }
    }
}

/// Response shape for a note
///
/// The content comes from the note's newest snapshot; `updated_at` is the
/// later of the note's own update time and that snapshot's creation time,
/// both as epoch milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NoteDto {
    /// The note's ID
    pub id: String,

    /// The note's title
    pub title: String,

    /// The note's current content
    pub content: String,

    /// Whether the note is marked important
    pub important: bool,

    /// Whether the note is archived
    pub archived: bool,

    /// When the note was created, as epoch milliseconds
    pub created_at: i64,

    /// When the note last changed, as epoch milliseconds
    pub updated_at: i64,
}

impl NoteDto {
    /// Builds the response shape for a note and its newest snapshot
    pub fn from_note_and_snapshot(note: &Note, snapshot: &Snapshot) -> Self {
        let updated_at = note.get_updated_at().max(snapshot.get_created_at());
        Self {
            id: note.get_id(),
            title: note.get_title(),
            content: snapshot.get_content(),
            important: note.is_important(),
            archived: note.is_archived(),
            created_at: note.get_created_at().timestamp_millis(),
            updated_at: updated_at.timestamp_millis(),
        }
    }
}

/// Response shape for a single snapshot in a note's history
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDto {
    /// The snapshot's ID
    pub id: String,

    /// The ID of the note this snapshot belongs to
    pub note_id: String,

    /// The content recorded in this snapshot
    pub content: String,

    /// When the snapshot was created, as epoch milliseconds
    pub created_at: i64,
}

impl SnapshotDto {
    /// Builds the response shape for a stored snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.get_id(),
            note_id: snapshot.get_note_id(),
            content: snapshot.get_content(),
            created_at: snapshot.get_created_at().timestamp_millis(),
        }
    }
}

/// Response shape for a category together with its notes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryDto {
    /// The category's ID
    pub id: String,

    /// The category's name
    pub name: String,

    /// The notes assigned to the category
    pub notes: Vec<NoteDto>,
}

impl CategoryDto {
    /// Builds the response shape for a category and its notes
    pub fn from_category(category: &Category, notes: Vec<NoteDto>) -> Self {
        Self {
            id: category.get_id(),
            name: category.get_name(),
            notes,
        }
    }
}
