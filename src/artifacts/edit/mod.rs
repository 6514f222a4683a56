//! Staged metadata edits
//!
//! - `field`: editable commit attributes and their typed values
//! - `store`: per-commit staged values over a loaded snapshot, with merge mode and
//!   change notifications

pub mod field;
pub mod store;
