//! chisel - stage commit metadata edits and rewrite branch history in one pass
//!
//! Edits to author, committer, dates and messages are staged in memory against an
//! immutable snapshot of a branch, then materialized by a single `git filter-branch`
//! run whose progress can be polled while it executes.
//!
//! - `areas`: repository handle, references and commit loading through the git binary
//! - `artifacts`: snapshots, staged edits, rewrite planning/scripting/execution, timelapse
//! - `commands`: command-line workflows composed from the artifacts
//! - `config`: tunables for the rewrite executor and queue
//! - `errors`: the library error taxonomy

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;

pub use errors::{ChiselError, Result};

/// How `chisel log` renders each commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitDisplayFormat {
    #[default]
    Medium,
    OneLine,
}
