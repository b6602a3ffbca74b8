use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::models::User;

/// The authenticated caller of a request
///
/// The authentication middleware resolves the Basic credentials to a user
/// and stores this in the request extensions; handlers extract it to find
/// out who is calling without touching the database again.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The ID of the authenticated user
    pub id: String,

    /// The login name of the authenticated user
    pub username: String,

    /// Whether the authenticated user has administrator rights
    pub admin: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.get_id(),
            username: user.get_username(),
            admin: user.is_admin(),
        }
    }
}

/// Parses a Basic authorization header value into credentials
///
/// ### Arguments
///
/// * `header` - The raw value of the `Authorization` header
///
/// ### Returns
///
/// The decoded username and password, or `None` if the header is not a
/// well-formed Basic credential
pub fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    // The password may itself contain colons; only the first one separates
    // it from the username.
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
