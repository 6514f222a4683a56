//! Tunables for the rewrite executor and queue

use std::path::PathBuf;
use std::time::Duration;

/// Cadence at which running rewrites are polled
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Delay between detecting completion and reporting it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Above this many rewritten commits a progress indicator is worth showing
pub const DEFAULT_PROGRESS_THRESHOLD: usize = 80;

pub const DEFAULT_LOG_FILE: &str = "chisel.log";
pub const DEFAULT_REPLAY_SCRIPT: &str = "chisel-replay.sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSettings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub progress_threshold: usize,
    /// Relative paths are resolved against the repository work tree
    pub log_file: PathBuf,
    pub replay_script: PathBuf,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        RewriteSettings {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            progress_threshold: DEFAULT_PROGRESS_THRESHOLD,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            replay_script: PathBuf::from(DEFAULT_REPLAY_SCRIPT),
        }
    }
}

impl RewriteSettings {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_progress_threshold(mut self, progress_threshold: usize) -> Self {
        self.progress_threshold = progress_threshold;
        self
    }

    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = log_file.into();
        self
    }

    pub fn with_replay_script(mut self, replay_script: impl Into<PathBuf>) -> Self {
        self.replay_script = replay_script.into();
        self
    }
}
