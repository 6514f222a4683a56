//! Core repository components
//!
//! - `git`: runner for the git binary, scoped to the work tree
//! - `database`: commit ancestry and object reads
//! - `refs`: branch, HEAD and upstream resolution
//! - `repository`: explicit repository handle threaded through every component

pub mod database;
pub mod git;
pub mod refs;
pub mod repository;
