use crate::CommitDisplayFormat;
use crate::areas::repository::Repository;
use crate::artifacts::log::filter::CommitFilter;
use crate::artifacts::log::snapshot::HistorySnapshot;
use crate::artifacts::objects::commit::Commit;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub branch: Option<String>,
    pub format: CommitDisplayFormat,
    pub filter: CommitFilter,
}

impl Repository {
    pub fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        let branch = self.branch_or_current(opts.branch.as_deref())?;
        let snapshot = HistorySnapshot::load(self, &branch)?;

        for commit in opts.filter.apply(&snapshot) {
            let local = !snapshot.is_pushed(commit.oid());

            match opts.format {
                CommitDisplayFormat::Medium => {
                    self.show_commit_medium(commit, local)?;
                    writeln!(self.writer())?;
                }
                CommitDisplayFormat::OneLine => self.show_commit_oneline(commit, local)?,
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, commit: &Commit, local: bool) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {}", commit.oid()).yellow(),
            local_decoration(local)
        )?;
        writeln!(
            self.writer(),
            "Author:     {}",
            commit.author().actor().display_name()
        )?;
        writeln!(
            self.writer(),
            "AuthorDate: {}",
            commit.author().readable_timestamp()
        )?;
        writeln!(
            self.writer(),
            "Commit:     {}",
            commit.committer().actor().display_name()
        )?;
        writeln!(
            self.writer(),
            "CommitDate: {}",
            commit.committer().readable_timestamp()
        )?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {}", message_line)?;
        }

        Ok(())
    }

    fn show_commit_oneline(&self, commit: &Commit, local: bool) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{} {}",
            commit.oid().to_short_oid().yellow(),
            local_decoration(local),
            commit.short_message()
        )?;

        Ok(())
    }
}

fn local_decoration(local: bool) -> String {
    if local {
        format!(" ({})", "local".red())
    } else {
        String::new()
    }
}
