use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hashes a plaintext password for storage
///
/// Uses argon2id with a freshly generated salt, so hashing the same
/// password twice produces different strings.
///
/// ### Arguments
///
/// * `password` - The plaintext password to hash
///
/// ### Returns
///
/// The PHC-format hash string to store
///
/// ### Errors
///
/// Returns an error if the hashing operation itself fails
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("Failed to hash password: {err}"))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored hash
///
/// The comparison is constant-time inside the argon2 crate.
///
/// ### Arguments
///
/// * `password` - The plaintext password to check
/// * `hash` - The stored PHC-format hash string
///
/// ### Returns
///
/// `true` if the password matches, `false` otherwise
///
/// ### Errors
///
/// Returns an error if the stored hash is not a valid PHC string, which
/// indicates a corrupted database row rather than a wrong password
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("Stored password hash is not valid: {err}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();

        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        // A fresh salt is generated per hash
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first).unwrap());
        assert!(verify_password("hunter2", &second).unwrap());
    }

    #[test]
    fn test_invalid_stored_hash_is_an_error() {
        let result = verify_password("hunter2", "not-a-phc-string");
        assert!(result.is_err());
    }
}
