use crate::artifacts::edit::field::Field;
use crate::artifacts::objects::object_id::ObjectId;
use chrono::NaiveTime;
use std::io;
use thiserror::Error;

/// Errors raised by the staging, planning, scripting and rewrite layers
///
/// Data-model violations are returned synchronously before anything is staged.
/// Planning and timelapse errors abort before any external process is spawned.
#[derive(Error, Debug)]
pub enum ChiselError {
    #[error("field '{0}' cannot be edited")]
    InvalidField(Field),

    #[error("commit {0} is not part of the loaded history")]
    UnknownCommit(ObjectId),

    #[error("a {found} value cannot be stored in field '{field}'")]
    ValueMismatch { field: Field, found: &'static str },

    #[error("history of branch '{branch}' changed since it was loaded: {reason}")]
    StaleHistory { branch: String, reason: String },

    #[error("the timelapse domain admits no time window")]
    EmptyDomain,

    #[error("hour window {start}-{end} ends before it starts")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },

    #[error("virtual second {value} is outside of [0, {total})")]
    OutOfRange { value: i64, total: i64 },

    #[error("a rewrite of branch '{0}' is already running")]
    AlreadyRunning(String),

    #[error("history rewrite failed (exit code {exit_code:?}): {stderr}")]
    RewriteFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("escaping self-check failed for {input:?} (decoded as {decoded:?})")]
    EscapeInvariantViolation {
        input: String,
        decoded: Option<String>,
    },

    #[error("git {command} failed (exit code {exit_code}): {stderr}")]
    GitCommandFailed {
        command: String,
        stderr: String,
        exit_code: i32,
    },

    #[error("git is not installed or not in PATH")]
    GitNotFound,

    #[error("failed to parse git output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ChiselError>;
