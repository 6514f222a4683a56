//! Asynchronous run of `git filter-branch`
//!
//! The command line is started through `sh -c` in the work tree. Its stdout is read
//! on a tokio task as `\r`/`\n` separated records; `Rewrite <oid> (<n>/<total>)`
//! records drive a progress value that callers poll without blocking.
//!
//! A branch is claimed for the whole run: in a process-wide registry, since fcntl
//! locks do not exclude callers within one process, and with a lock file under the
//! git directory for other processes.

use crate::areas::git::Git;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::rewrite::script::RewriteScripts;
use crate::config::RewriteSettings;
use crate::errors::{ChiselError, Result};
use chrono::Local;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const PROGRESS_REGEX: &str = r"Rewrite ([0-9a-f]+) \((\d+)/(\d+)\)";

const SQUELCH_WARNING_VARIABLE: &str = "FILTER_BRANCH_SQUELCH_WARNING";
const REWRITE_TEMP_DIR: &str = ".git-rewrite";
const ORIGINAL_REFS: &str = "refs/original/";

/// Lock paths of the rewrites running in this process
static RUNNING_REWRITES: LazyLock<Mutex<HashSet<PathBuf>>> = LazyLock::new(Mutex::default);

fn running_rewrites() -> MutexGuard<'static, HashSet<PathBuf>> {
    RUNNING_REWRITES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RewriteState {
    #[default]
    Idle,
    Running,
    Finished,
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl RewriteState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RewriteState::Finished | RewriteState::Failed { .. })
    }
}

/// Side artifacts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Append the command and its output to the log file
    pub log: bool,
    /// Write a standalone script replaying the command
    pub replay_script: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: RewriteState,
    progress: f64,
    stdout: Vec<u8>,
    completed_at: Option<Instant>,
}

/// Cloneable read-only view on a run, for pollers
#[derive(Debug, Clone)]
pub struct RewriteHandle {
    shared: Arc<Mutex<Shared>>,
    settle_delay: Duration,
}

impl RewriteHandle {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RewriteState {
        self.lock().state.clone()
    }

    /// Fraction of commits rewritten so far, 0 when unknown
    pub fn progress(&self) -> f64 {
        self.lock().progress
    }

    /// True once a terminal state has settled
    pub fn is_finished(&self) -> bool {
        let shared = self.lock();
        shared.state.is_terminal()
            && shared
                .completed_at
                .is_some_and(|at| at.elapsed() >= self.settle_delay)
    }

    /// Everything printed on stdout so far
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.lock().stdout).into_owned()
    }
}

/// Runs one branch rewrite at a time
pub struct RewriteExecutor {
    work_dir: PathBuf,
    git_dir: PathBuf,
    branch: BranchName,
    settings: RewriteSettings,
    handle: RewriteHandle,
    task: Option<JoinHandle<()>>,
}

impl RewriteExecutor {
    pub fn new(repository: &Repository, branch: BranchName, settings: RewriteSettings) -> Self {
        let handle = RewriteHandle {
            shared: Arc::default(),
            settle_delay: settings.settle_delay,
        };

        RewriteExecutor {
            work_dir: repository.path().to_path_buf(),
            git_dir: repository.git_dir().to_path_buf(),
            branch,
            settings,
            handle,
            task: None,
        }
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn handle(&self) -> RewriteHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> RewriteState {
        self.handle.state()
    }

    pub fn progress(&self) -> f64 {
        self.handle.progress()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Path of the per-branch lock held for the duration of a run
    pub fn lock_path(&self) -> PathBuf {
        self.git_dir
            .join(format!("chisel-{}.lock", self.branch.file_stem()))
    }

    /// Start rewriting `range` with `scripts`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        scripts: &RewriteScripts,
        range: &str,
        options: RewriteOptions,
    ) -> Result<()> {
        if self.state() == RewriteState::Running {
            return Err(ChiselError::AlreadyRunning(self.branch.to_string()));
        }

        let pattern =
            Regex::new(PROGRESS_REGEX).map_err(|e| ChiselError::Parse(e.to_string()))?;
        let claim = BranchClaim::acquire(self.lock_path(), &self.branch)?;
        self.clean_leftovers()?;

        let command_line = scripts.command_line(range);
        if options.replay_script {
            self.write_replay_script(&command_line)?;
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .current_dir(&self.work_dir)
            .env(SQUELCH_WARNING_VARIABLE, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        info!(branch = %self.branch, range, pid = child.id(), "started history rewrite");

        {
            let mut shared = self.handle.lock();
            *shared = Shared {
                state: RewriteState::Running,
                ..Shared::default()
            };
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let shared = Arc::clone(&self.handle.shared);
        let log_file = options
            .log
            .then(|| resolve(&self.work_dir, &self.settings.log_file));
        let branch = self.branch.clone();

        self.task = Some(tokio::spawn(async move {
            let stderr_task = tokio::spawn(read_all(stderr));
            if let Some(stdout) = stdout {
                track_progress(stdout, &pattern, &shared).await;
            }

            let status = child.wait().await;
            let stderr = stderr_task.await.unwrap_or_default();

            let state = match status {
                Ok(status) if status.success() => RewriteState::Finished,
                Ok(status) => RewriteState::Failed {
                    exit_code: status.code(),
                    stderr: stderr.clone(),
                },
                Err(e) => RewriteState::Failed {
                    exit_code: None,
                    stderr: e.to_string(),
                },
            };

            let stdout = {
                let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if state == RewriteState::Finished {
                    shared.progress = 1.0;
                }
                shared.state = state.clone();
                shared.completed_at = Some(Instant::now());
                String::from_utf8_lossy(&shared.stdout).into_owned()
            };

            match &state {
                RewriteState::Failed { exit_code, .. } => {
                    warn!(%branch, ?exit_code, "history rewrite failed")
                }
                _ => info!(%branch, "history rewrite finished"),
            }

            if let Some(log_file) = log_file
                && let Err(e) = append_log(&log_file, &command_line, &stdout, &stderr).await
            {
                warn!(path = %log_file.display(), error = %e, "could not write rewrite log");
            }

            drop(claim);
        }));

        Ok(())
    }

    /// Wait for the run to end, surfacing a failure as `RewriteFailed`
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            let mut shared = self.handle.lock();
            shared.state = RewriteState::Failed {
                exit_code: None,
                stderr: e.to_string(),
            };
            shared.completed_at = Some(Instant::now());
        }

        match self.state() {
            RewriteState::Failed { exit_code, stderr } => {
                Err(ChiselError::RewriteFailed { exit_code, stderr })
            }
            _ => Ok(()),
        }
    }

    /// Remove what an earlier, possibly interrupted, run left behind
    fn clean_leftovers(&self) -> Result<()> {
        let git = Git::new(self.work_dir.clone().into_boxed_path());

        let leftovers = git.run(&["for-each-ref", "--format=%(refname)", ORIGINAL_REFS])?;
        for reference in leftovers.lines().filter(|line| !line.is_empty()) {
            debug!(reference, "deleting backup ref");
            git.run(&["update-ref", "-d", reference])?;
        }

        let original = self.git_dir.join(ORIGINAL_REFS);
        if original.exists() {
            fs::remove_dir_all(&original)?;
        }

        let temp_dir = self.work_dir.join(REWRITE_TEMP_DIR);
        if temp_dir.exists() {
            debug!(path = %temp_dir.display(), "removing rewrite directory");
            fs::remove_dir_all(&temp_dir)?;
        }

        Ok(())
    }

    fn write_replay_script(&self, command_line: &str) -> Result<()> {
        let path = resolve(&self.work_dir, &self.settings.replay_script);
        let script = format!(
            "#!/bin/sh\n\
             # Generated by chisel on {}: replays the history rewrite of {}\n\
             export {SQUELCH_WARNING_VARIABLE}=1\n\
             {command_line}\n",
            Local::now().to_rfc2822(),
            self.branch.full_ref()
        );
        fs::write(&path, script)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        info!(path = %path.display(), "wrote replay script");
        Ok(())
    }
}

/// Exclusive claim on a branch, released on drop
struct BranchClaim {
    path: PathBuf,
    guard: Option<file_guard::FileGuard<Box<File>>>,
}

impl BranchClaim {
    fn acquire(path: PathBuf, branch: &BranchName) -> Result<Self> {
        if !running_rewrites().insert(path.clone()) {
            return Err(ChiselError::AlreadyRunning(branch.to_string()));
        }

        let mut claim = BranchClaim { path, guard: None };
        claim.guard = Some(lock_file(&claim.path, branch)?);
        Ok(claim)
    }
}

impl Drop for BranchClaim {
    fn drop(&mut self) {
        // removed while still locked, so a waiter never locks a stale file
        if self.guard.is_some()
            && let Err(e) = fs::remove_file(&self.path)
        {
            debug!(path = %self.path.display(), error = %e, "could not remove lock file");
        }
        self.guard = None;
        running_rewrites().remove(&self.path);
    }
}

fn lock_file(path: &Path, branch: &BranchName) -> Result<file_guard::FileGuard<Box<File>>> {
    loop {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let guard = file_guard::try_lock(Box::new(file), file_guard::Lock::Exclusive, 0, 1)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::WouldBlock {
                    ChiselError::AlreadyRunning(branch.to_string())
                } else {
                    ChiselError::Io(e)
                }
            })?;

        if is_linked(&guard, path)? {
            return Ok(guard);
        }
        debug!(path = %path.display(), "lock file was replaced, retrying");
    }
}

/// Whether `path` still names the locked file
#[cfg(unix)]
fn is_linked(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let locked = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(current.dev() == locked.dev() && current.ino() == locked.ino()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn is_linked(_file: &File, path: &Path) -> Result<bool> {
    Ok(path.exists())
}

fn resolve(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

/// Parse one output record into a completed fraction
pub fn parse_progress(pattern: &Regex, record: &str) -> Option<f64> {
    let captures = pattern.captures(record)?;
    let done: f64 = captures[2].parse().ok()?;
    let total: f64 = captures[3].parse().ok()?;

    (total > 0.0).then(|| (done / total).clamp(0.0, 1.0))
}

async fn track_progress<R: AsyncRead + Unpin>(
    mut stdout: R,
    pattern: &Regex,
    shared: &Mutex<Shared>,
) {
    let mut buffer = [0u8; 4096];
    let mut pending = Vec::new();

    loop {
        let read = match stdout.read(&mut buffer).await {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        let chunk = &buffer[..read];
        pending.extend_from_slice(chunk);

        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.stdout.extend_from_slice(chunk);

        while let Some(end) = pending.iter().position(|b| *b == b'\r' || *b == b'\n') {
            let record = pending.drain(..=end).collect::<Vec<_>>();
            if let Some(progress) = parse_progress(pattern, &String::from_utf8_lossy(&record)) {
                shared.progress = shared.progress.max(progress);
            }
        }
    }

    if let Some(progress) = parse_progress(pattern, &String::from_utf8_lossy(&pending)) {
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.progress = shared.progress.max(progress);
    }
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut output = Vec::new();
    if let Some(mut stream) = stream
        && let Err(e) = stream.read_to_end(&mut output).await
    {
        debug!(error = %e, "stderr closed early");
    }
    String::from_utf8_lossy(&output).into_owned()
}

async fn append_log(path: &Path, command_line: &str, stdout: &str, stderr: &str) -> Result<()> {
    let record = format!(
        "==== {}\n$ {command_line}\n---- stdout\n{stdout}\n---- stderr\n{stderr}\n",
        Local::now().to_rfc2822()
    );

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(record.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
