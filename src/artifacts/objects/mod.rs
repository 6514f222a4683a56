//! Git commit objects as read from the repository
//!
//! Only commits are modelled: their identity, ancestry and the metadata that can be
//! staged for a rewrite. Objects are read through `git cat-file --batch`, which
//! yields the raw object content regardless of loose or packed storage.

pub mod commit;
pub mod object_id;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-256 hash in hexadecimal format
pub const SHA256_OBJECT_ID_LENGTH: usize = 64;
