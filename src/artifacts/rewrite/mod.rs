//! Materializing staged edits
//!
//! - `planner`: oldest modified parent and the revision range to rewrite
//! - `escape`: two-layer shell quoting of user text, with a decode self-check
//! - `script`: identity and message filter fragments, and the full command line
//! - `executor`: asynchronous `git filter-branch` run with polled progress
//! - `queue`: sequential rewrites of several branches with combined progress

pub mod escape;
pub mod executor;
pub mod planner;
pub mod queue;
pub mod script;
