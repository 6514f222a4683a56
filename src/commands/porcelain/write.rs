use crate::areas::repository::Repository;
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::rewrite::executor::{RewriteExecutor, RewriteOptions};
use crate::artifacts::rewrite::planner::RewritePlanner;
use crate::artifacts::rewrite::queue::{RewriteJob, RewriteQueue};
use crate::artifacts::rewrite::script::RewriteScripts;
use crate::config::RewriteSettings;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// How staged edits are written back
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub log: bool,
    pub replay_script: bool,
    /// Print the fragments and the command line instead of running them
    pub dry_run: bool,
    pub settings: RewriteSettings,
}

impl Repository {
    /// Rewrite every branch with staged edits, one after another
    pub async fn write_modifications(
        &self,
        stores: &[ModificationStore],
        opts: &WriteOptions,
    ) -> anyhow::Result<()> {
        let mut queue = RewriteQueue::new(opts.settings.clone());

        for store in stores {
            let branch = &store.snapshot().branch().name;
            let planner = RewritePlanner::new(store);

            let Some(boundary) = planner.oldest_modified_parent()? else {
                writeln!(self.writer(), "{branch}: nothing to rewrite")?;
                continue;
            };
            planner.verify_fresh(self)?;

            let range = boundary.revision_range(branch);
            let scripts = RewriteScripts::generate(store)?;
            let commits = planner.commits_to_rewrite_count()?;

            if opts.dry_run {
                self.show_plan(store, &scripts, &range, commits)?;
                continue;
            }

            let mut settings = opts.settings.clone();
            if stores.len() > 1 {
                let path = per_branch_path(&settings.replay_script, &branch.file_stem());
                settings = settings.with_replay_script(path);
            }

            queue.push(RewriteJob::new(
                RewriteExecutor::new(self, branch.clone(), settings),
                scripts,
                range,
                RewriteOptions {
                    log: opts.log,
                    replay_script: opts.replay_script,
                },
                commits,
            ))?;
        }

        if queue.is_empty() {
            return Ok(());
        }

        let indicator = queue.shows_progress().then(|| {
            let mut progress = queue.subscribe();
            tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let update = progress.borrow_and_update().clone();
                    let branch = update
                        .branch
                        .as_ref()
                        .map(|branch| branch.to_string())
                        .unwrap_or_default();
                    eprint!("\rRewriting {branch}: {:>3.0}%", update.fraction() * 100.0);
                }
            })
        });

        let outcomes = queue.run().await;
        if let Some(indicator) = indicator {
            indicator.abort();
            eprintln!();
        }

        let mut failures = 0;
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => {
                    writeln!(self.writer(), "{} {}", "rewrote".green(), outcome.branch)?
                }
                Err(e) => {
                    failures += 1;
                    writeln!(self.writer(), "{} {}: {e}", "failed".red(), outcome.branch)?
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} branch rewrite(s) failed; staged edits were not applied");
        }
        Ok(())
    }

    fn show_plan(
        &self,
        store: &ModificationStore,
        scripts: &RewriteScripts,
        range: &str,
        commits: usize,
    ) -> anyhow::Result<()> {
        let mut writer = self.writer();

        writeln!(
            writer,
            "{}: {} commit(s) to rewrite, {} modified, range {}",
            store.snapshot().branch().name.to_string().yellow(),
            commits,
            store.modified_count(),
            range
        )?;
        if let Some(identity) = scripts.identity_fragment() {
            writeln!(writer, "--env-filter:\n{identity}")?;
        }
        if let Some(message) = scripts.message_fragment() {
            writeln!(writer, "--commit-filter:\n{message}")?;
        }
        writeln!(writer, "command:\n{}", scripts.command_line(range))?;

        Ok(())
    }
}

fn per_branch_path(path: &std::path::Path, stem: &str) -> PathBuf {
    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(extension) => format!("{file_stem}-{stem}.{}", extension.to_string_lossy()),
        None => format!("{file_stem}-{stem}"),
    };
    path.with_file_name(name)
}
