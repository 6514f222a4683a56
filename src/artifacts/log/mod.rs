//! Loaded branch history
//!
//! - `snapshot`: immutable head-first ancestry of a branch, with pushed/unpushed
//!   classification against its upstream
//! - `filter`: criteria narrowing a snapshot to the commits an edit applies to

pub mod filter;
pub mod snapshot;
