//! History data structures and algorithms
//!
//! - `branch`: Branch names and resolved branch references
//! - `core`: Shared utilities (pager wrapper)
//! - `edit`: Editable fields and the modification store staging edits
//! - `log`: Branch snapshots and commit filters
//! - `objects`: Commit objects and object ids
//! - `rewrite`: Rewrite planning, filter scripts, execution and queueing
//! - `timelapse`: Time domains and date redistribution

pub mod branch;
pub mod core;
pub mod edit;
pub mod log;
pub mod objects;
pub mod rewrite;
pub mod timelapse;
