//! Command implementations
//!
//! - `porcelain`: user-facing workflows (log, branches, edit, reorder) composed from
//!   snapshots, the modification store and the rewrite pipeline

pub mod porcelain;
