//! Error types for pagemark operations.
//!
//! The transformation pipeline itself never fails: an empty page, a missing
//! main-content node or a bad selector all degrade to a safe default. The
//! errors in this module belong to the surfaces that can genuinely fail, such
//! as explicit selector queries and loading conversion profiles.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{PagemarkError, profiles_from_json};
//!
//! match profiles_from_json("not json") {
//!     Ok(profiles) => println!("loaded {} profiles", profiles.len()),
//!     Err(PagemarkError::Json(e)) => println!("bad profile file: {}", e),
//!     Err(e) => println!("error: {}", e),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pagemark.
#[derive(Error, Debug)]
pub enum PagemarkError {
    /// A CSS selector could not be parsed.
    ///
    /// Algorithms that take caller-supplied selectors catch this per selector
    /// and skip the offending entry.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A conversion profile (or a profile collection) violates an invariant.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Profile JSON could not be read or written.
    #[error("Profile JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Wraps standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PagemarkError.
pub type Result<T> = std::result::Result<T, PagemarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PagemarkError::InvalidProfile("two default profiles".to_string());
        assert_eq!(err.to_string(), "Invalid profile: two default profiles");
    }

    #[test]
    fn test_invalid_selector_display() {
        let err = PagemarkError::InvalidSelector { selector: "[[bad".to_string(), reason: "unexpected token".to_string() };
        assert!(err.to_string().contains("[[bad"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_json_error_conversion() {
        let err: PagemarkError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, PagemarkError::Json(_)));
    }
}
