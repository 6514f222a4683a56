//! User-facing workflows
//!
//! Each command is a method on `Repository` writing to the repository's writer.
//!
//! ## Commands
//!
//! - `log`: Show a branch's history with local commits marked
//! - `branches`: List local branches and their upstreams
//! - `edit`: Stage author, committer, date or message edits and rewrite the branch
//! - `reorder`: Redistribute commit dates over a time domain and rewrite
//! - `write`: Shared planning, dry-run output and queued rewriting

pub mod branches;
pub mod edit;
pub mod log;
pub mod reorder;
pub mod write;
