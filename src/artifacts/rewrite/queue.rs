use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::rewrite::executor::{RewriteExecutor, RewriteOptions};
use crate::artifacts::rewrite::script::RewriteScripts;
use crate::config::RewriteSettings;
use crate::errors::{ChiselError, Result};
use derive_new::new;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Combined progress over every queued branch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueProgress {
    pub completed: usize,
    pub total: usize,
    /// Progress of the running job, in [0, 1]
    pub current: f64,
    pub branch: Option<BranchName>,
}

impl QueueProgress {
    /// `(completed + current) / total`, 1 for an empty queue
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        ((self.completed as f64 + self.current) / self.total as f64).clamp(0.0, 1.0)
    }
}

/// One branch rewrite waiting in the queue
#[derive(new)]
pub struct RewriteJob {
    executor: RewriteExecutor,
    scripts: RewriteScripts,
    range: String,
    options: RewriteOptions,
    /// Commits the rewrite will walk
    commits: usize,
}

impl RewriteJob {
    pub fn branch(&self) -> &BranchName {
        self.executor.branch()
    }
}

#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: BranchName,
    pub result: Result<()>,
}

/// Sequential rewrites of several branches with one progress stream
pub struct RewriteQueue {
    jobs: Vec<RewriteJob>,
    settings: RewriteSettings,
    sender: Arc<watch::Sender<QueueProgress>>,
}

impl RewriteQueue {
    pub fn new(settings: RewriteSettings) -> Self {
        let (sender, _) = watch::channel(QueueProgress::default());
        RewriteQueue {
            jobs: Vec::new(),
            settings,
            sender: Arc::new(sender),
        }
    }

    /// Queue a job; a second job on the same branch is rejected
    pub fn push(&mut self, job: RewriteJob) -> Result<()> {
        if self.jobs.iter().any(|queued| queued.branch() == job.branch()) {
            return Err(ChiselError::AlreadyRunning(job.branch().to_string()));
        }
        self.jobs.push(job);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueProgress> {
        self.sender.subscribe()
    }

    pub fn total_commits(&self) -> usize {
        self.jobs.iter().map(|job| job.commits).sum()
    }

    /// Whether the rewrite is long enough to be worth a progress indicator
    pub fn shows_progress(&self) -> bool {
        self.total_commits() > self.settings.progress_threshold
    }

    /// Run every job in order; a failing branch does not stop the others
    pub async fn run(self) -> Vec<BranchOutcome> {
        let total = self.jobs.len();
        let mut outcomes = Vec::with_capacity(total);

        for (completed, mut job) in self.jobs.into_iter().enumerate() {
            let branch = job.branch().clone();
            self.sender.send_replace(QueueProgress {
                completed,
                total,
                current: 0.0,
                branch: Some(branch.clone()),
            });

            if let Err(e) = job.executor.start(&job.scripts, &job.range, job.options) {
                warn!(%branch, error = %e, "could not start rewrite");
                outcomes.push(BranchOutcome { branch, result: Err(e) });
                continue;
            }

            let poller = {
                let handle = job.executor.handle();
                let sender = Arc::clone(&self.sender);
                let branch = branch.clone();
                let mut ticks = interval(self.settings.poll_interval);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

                tokio::spawn(async move {
                    loop {
                        ticks.tick().await;
                        sender.send_replace(QueueProgress {
                            completed,
                            total,
                            current: handle.progress(),
                            branch: Some(branch.clone()),
                        });
                        if handle.is_finished() {
                            break;
                        }
                    }
                })
            };

            let result = job.executor.wait().await;
            poller.abort();

            match &result {
                Ok(()) => info!(%branch, "branch rewritten"),
                Err(e) => warn!(%branch, error = %e, "branch rewrite failed"),
            }
            outcomes.push(BranchOutcome { branch, result });
        }

        self.sender.send_replace(QueueProgress {
            completed: total,
            total,
            current: 0.0,
            branch: None,
        });

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0.0, 1.0)]
    #[case(0, 4, 0.0, 0.0)]
    #[case(1, 4, 0.5, 0.375)]
    #[case(4, 4, 0.0, 1.0)]
    fn test_fraction(
        #[case] completed: usize,
        #[case] total: usize,
        #[case] current: f64,
        #[case] expected: f64,
    ) {
        let progress = QueueProgress {
            completed,
            total,
            current,
            branch: None,
        };

        assert_eq!(progress.fraction(), expected);
    }

    #[test]
    fn test_empty_queue() {
        let queue = RewriteQueue::new(RewriteSettings::default());

        assert!(queue.is_empty());
        assert_eq!(queue.total_commits(), 0);
        assert!(!queue.shows_progress());
    }
}
