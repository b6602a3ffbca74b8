use crate::auth::principal::Principal;
use crate::errors::ApiError;
use crate::models::Note;

/// Checks that the caller may modify the given user account
///
/// Administrators may modify any account; everyone else only their own.
pub fn require_user_write(principal: &Principal, user_id: &str) -> Result<(), ApiError> {
    if principal.admin || principal.id == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to modify this user".to_string(),
        ))
    }
}

/// Checks that the caller may modify the given note
///
/// Administrators may modify any note; everyone else only notes they own.
pub fn require_note_write(principal: &Principal, note: &Note) -> Result<(), ApiError> {
    if principal.admin || principal.id == note.get_owner_id() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to access this note".to_string(),
        ))
    }
}
