//! Name validation and security utilities.
//!
//! Stored objects live in a single flat directory, so a valid name is exactly
//! one normal path segment. Anything else would either escape the storage
//! root or address a subdirectory that never exists.

use std::path::{Component, Path};

use crate::error::{ErrorKind, Result};

/// Validates a storage name for security and correctness.
///
/// > **Note:** Backslashes are rejected on every platform, not only on
/// >           Windows, so that a name accepted here means the same thing
/// >           wherever the directory is later mounted.
///
/// # Returns
/// Returns the name unchanged if valid, or
/// [`InvalidName`](crate::error::ErrorKind::InvalidName) if invalid.
///
/// # Examples
///
/// ```
/// use storefront_storage::validate_name;
/// // Valid names
/// assert!(validate_name("42_1718000000000.png").is_ok());
/// assert!(validate_name(".hidden").is_ok());
/// // Invalid names
/// assert!(validate_name("../etc/passwd").is_err());
/// assert!(validate_name("a/b.png").is_err());
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("a\0b").is_err());
/// ```
pub fn validate(name: &str) -> Result<&str> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    // With separators already excluded the only components left to worry
    // about are `.`, `..` and (on Windows) drive prefixes like `C:`.
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == name => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidName(name.to_string())),
    }
}
