use crate::areas::repository::Repository;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// List local branches, marking the checked-out one
    pub fn branches(&self) -> anyhow::Result<()> {
        let current = self.refs().current_branch()?;

        for branch in self.refs().list_branches()? {
            let branch_ref = self.refs().branch_ref(&branch)?;
            let upstream = branch_ref
                .upstream
                .as_ref()
                .map(|upstream| format!(" [{}]", short_remote_name(&upstream.name)))
                .unwrap_or_default();

            if current.as_ref() == Some(&branch) {
                writeln!(
                    self.writer(),
                    "* {} {}{}",
                    branch.to_string().green(),
                    branch_ref.head.to_short_oid(),
                    upstream
                )?;
            } else {
                writeln!(
                    self.writer(),
                    "  {} {}{}",
                    branch,
                    branch_ref.head.to_short_oid(),
                    upstream
                )?;
            }
        }

        Ok(())
    }
}

fn short_remote_name(name: &str) -> &str {
    name.strip_prefix("refs/remotes/").unwrap_or(name)
}
