//! Authentication and access control
//!
//! Requests carry HTTP Basic credentials which the [`middleware`] resolves
//! to a [`Principal`] stored in the request extensions. Password hashing
//! lives in [`password`], per-resource permission checks in [`access`],
//! and the startup seeding of the default administrator in [`bootstrap`].

pub mod access;
pub mod bootstrap;
pub mod middleware;
pub mod password;
pub mod principal;

pub use access::{require_note_write, require_user_write};
pub use bootstrap::ensure_admin_user;
pub use middleware::{audit_log, authenticate};
pub use password::{hash_password, verify_password};
pub use principal::Principal;
