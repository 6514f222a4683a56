//! Runner for the `git` binary
//!
//! Every repository read goes through here: the process is always started in the
//! repository work tree, never in the caller's current directory.

use crate::errors::{ChiselError, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;

pub const GIT_COMMAND: &str = "git";

#[derive(Debug, Clone)]
pub struct Git {
    work_dir: Box<Path>,
}

impl Git {
    pub fn new(work_dir: Box<Path>) -> Self {
        Git { work_dir }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(GIT_COMMAND);
        cmd.current_dir(&self.work_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(args);
        cmd
    }

    /// Run git and return its stdout, failing on a non-zero exit
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args, None)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git, returning `None` when it exits with status 1
    ///
    /// Used for queries where "not found" is reported through the exit status
    /// (`symbolic-ref --quiet`, `rev-parse --verify --quiet`).
    pub fn run_optional(&self, args: &[&str]) -> Result<Option<String>> {
        match self.output(args, None) {
            Ok(output) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Err(ChiselError::GitCommandFailed { exit_code: 1, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Run git feeding `input` on stdin, returning raw stdout bytes
    pub fn run_with_input(&self, args: &[&str], input: Vec<u8>) -> Result<Vec<u8>> {
        Ok(self.output(args, Some(input))?.stdout)
    }

    fn output(&self, args: &[&str], input: Option<Vec<u8>>) -> Result<Output> {
        debug!(args = ?args, dir = %self.work_dir.display(), "running git");

        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChiselError::GitNotFound
            } else {
                ChiselError::Io(e)
            }
        })?;

        // stdin is fed from its own thread so a large batch cannot deadlock against
        // a full stdout pipe
        let feeder = match (input, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => {
                Some(std::thread::spawn(move || stdin.write_all(&input)))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;
        let fed = match feeder.map(|feeder| feeder.join()) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(std::io::Error::other("stdin feeder thread panicked")),
            None => Ok(()),
        };

        // a failing git closes stdin early, so its exit status is the better error
        if !output.status.success() {
            return Err(ChiselError::GitCommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                exit_code: output.status.code().unwrap_or(-1),
            });
        }
        fed?;

        Ok(output)
    }
}
