//! Git object identifier
//!
//! Object IDs are hexadecimal strings derived from the object content: 40 characters
//! for SHA-1 repositories, 64 for SHA-256 ones. Since they change whenever any part of
//! a commit changes, they are the only key used to relate staged edits to commits.
//!
//! ## Format
//!
//! - Full: 40 or 64 lowercase hex characters (e.g., "abc123...def")
//! - Short: First 7 characters (e.g., "abc1234")

use crate::artifacts::objects::{OBJECT_ID_LENGTH, SHA256_OBJECT_ID_LENGTH};

/// Git object identifier
///
/// Validated on construction; the inner string is always lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// # Arguments
    ///
    /// * `id` - 40 or 64 character hexadecimal string (surrounding whitespace is ignored)
    ///
    /// # Returns
    ///
    /// Validated ObjectId or error if invalid length/characters
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        let id = id.trim();
        if id.len() != OBJECT_ID_LENGTH && id.len() != SHA256_OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Get abbreviated form of the object ID
    ///
    /// # Returns
    ///
    /// First 7 characters of the hash (standard Git abbreviation)
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
