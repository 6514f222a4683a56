use crate::areas::repository::Repository;
use crate::artifacts::branch::BranchRef;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Immutable view of a branch's ancestry at load time
///
/// Commits are kept head-first in topological order: every commit appears before
/// all of its parents. A snapshot is never patched; reloading builds a new one.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    branch: BranchRef,
    commits: Vec<Commit>,
    positions: HashMap<ObjectId, usize>,
    unpushed: HashSet<ObjectId>,
}

impl HistorySnapshot {
    /// Load the ancestry of `branch` and classify commits against its upstream
    pub fn load(repository: &Repository, branch: &BranchName) -> Result<Self> {
        let branch = repository.refs().branch_ref(branch)?;
        let database = repository.database();

        let oids = database.rev_list(&branch.head, None)?;
        let commits = database.load_commits(&oids)?;

        let unpushed = match &branch.upstream {
            Some(upstream) => {
                let remote = database
                    .rev_list(&upstream.head, None)?
                    .into_iter()
                    .collect::<HashSet<_>>();
                oids.into_iter().filter(|oid| !remote.contains(oid)).collect()
            }
            None => oids.into_iter().collect(),
        };

        info!(
            branch = %branch.name,
            commits = commits.len(),
            upstream = branch.upstream.as_ref().map(|u| u.name.as_str()),
            "loaded history snapshot"
        );

        Ok(Self::from_commits(branch, commits, unpushed))
    }

    /// Build a snapshot from commits already in head-first order
    pub fn from_commits(
        branch: BranchRef,
        commits: Vec<Commit>,
        unpushed: HashSet<ObjectId>,
    ) -> Self {
        let positions = commits
            .iter()
            .enumerate()
            .map(|(position, commit)| (commit.oid().clone(), position))
            .collect();

        HistorySnapshot {
            branch,
            commits,
            positions,
            unpushed,
        }
    }

    pub fn branch(&self) -> &BranchRef {
        &self.branch
    }

    pub fn head(&self) -> &ObjectId {
        &self.branch.head
    }

    /// Commits, head first
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Commits, ancestry-earliest first
    pub fn oldest_first(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, oid: &ObjectId) -> Option<&Commit> {
        self.position(oid).map(|position| &self.commits[position])
    }

    /// Index of a commit in head-first order
    pub fn position(&self, oid: &ObjectId) -> Option<usize> {
        self.positions.get(oid).copied()
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.positions.contains_key(oid)
    }

    /// The ancestry-earliest commit
    pub fn root(&self) -> Option<&Commit> {
        self.commits.last()
    }

    pub fn is_pushed(&self, oid: &ObjectId) -> bool {
        self.contains(oid) && !self.unpushed.contains(oid)
    }

    /// Commits not reachable from the upstream, head first
    pub fn unpushed(&self) -> impl Iterator<Item = &Commit> {
        self.commits
            .iter()
            .filter(|commit| self.unpushed.contains(commit.oid()))
    }
}
