//! Git references (branches, HEAD, upstreams)
//!
//! References are resolved through `git for-each-ref` and friends so that packed
//! refs, worktrees and symbolic refs behave exactly as git sees them.

use crate::areas::git::Git;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{BranchRef, Upstream};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ChiselError, Result};
use derive_new::new;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Git references manager
#[derive(Debug, Clone, new)]
pub struct Refs {
    git: Git,
}

fn parse_oid(value: &str) -> Result<ObjectId> {
    ObjectId::try_parse(value.to_string()).map_err(|e| ChiselError::Parse(format!("{e:#}")))
}

impl Refs {
    /// Branch checked out in the work tree, `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<BranchName>> {
        let name = self
            .git
            .run_optional(&["symbolic-ref", "--quiet", HEAD_REF_NAME])?;

        name.map(|name| {
            BranchName::try_parse(name.trim().to_string())
                .map_err(|e| ChiselError::Parse(format!("{e:#}")))
        })
        .transpose()
    }

    /// All local branch names, sorted by name
    pub fn list_branches(&self) -> Result<Vec<BranchName>> {
        let output = self
            .git
            .run(&["for-each-ref", "--format=%(refname)", "refs/heads/"])?;

        output
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                BranchName::try_parse(line.to_string())
                    .map_err(|e| ChiselError::Parse(format!("{e:#}")))
            })
            .collect()
    }

    /// Read the commit a branch points to
    ///
    /// # Returns
    ///
    /// Some(ObjectId) if the branch exists, None otherwise
    pub fn read_branch(&self, branch: &BranchName) -> Result<Option<ObjectId>> {
        self.read_ref(&branch.full_ref())
    }

    fn read_ref(&self, full_ref: &str) -> Result<Option<ObjectId>> {
        let output = self.git.run(&[
            "for-each-ref",
            "--format=%(objectname) %(refname)",
            full_ref,
        ])?;

        // for-each-ref also matches up to a slash: `refs/heads/a` lists `refs/heads/a/b`
        output
            .lines()
            .filter_map(|line| line.split_once(' '))
            .find(|(_, name)| *name == full_ref)
            .map(|(oid, _)| parse_oid(oid))
            .transpose()
    }

    /// Upstream configured for a branch, if any and if it has been fetched
    pub fn upstream(&self, branch: &BranchName) -> Result<Option<Upstream>> {
        let output = self.git.run(&[
            "for-each-ref",
            "--format=%(upstream)",
            &branch.full_ref(),
        ])?;

        let Some(name) = output.lines().next().map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };

        Ok(self
            .read_ref(name)?
            .map(|head| Upstream::new(name.to_string(), head)))
    }

    /// Resolve a branch with its head and upstream
    pub fn branch_ref(&self, branch: &BranchName) -> Result<BranchRef> {
        let head = self.read_branch(branch)?.ok_or_else(|| ChiselError::GitCommandFailed {
            command: "for-each-ref".to_string(),
            stderr: format!("branch {branch} not found"),
            exit_code: 1,
        })?;
        let upstream = self.upstream(branch)?;

        Ok(BranchRef::new(branch.clone(), head, upstream))
    }

    /// Resolve any revision expression to a commit id
    pub fn resolve_commit(&self, revision: &str) -> Result<ObjectId> {
        let output = self.git.run(&[
            "rev-parse",
            "--verify",
            "--end-of-options",
            &format!("{revision}^{{commit}}"),
        ])?;

        parse_oid(&output)
    }

    /// Path of the git directory (`.git` for ordinary clones)
    pub fn git_dir(&self) -> Result<std::path::PathBuf> {
        let output = self
            .git
            .run(&["rev-parse", "--path-format=absolute", "--git-dir"])?;

        Ok(std::path::PathBuf::from(output.trim()))
    }
}
