use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ChiselError, Result};
use std::fmt;
use tracing::debug;

/// Where a rewrite starts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RewriteBoundary {
    /// The root commit is modified, so the whole branch history is rewritten
    Root,
    /// Parent of the ancestry-oldest modified commit, left untouched
    Parent(ObjectId),
}

impl RewriteBoundary {
    /// Revision range handed to `git filter-branch`
    pub fn revision_range(&self, branch: &BranchName) -> String {
        match self {
            RewriteBoundary::Root => branch.full_ref(),
            RewriteBoundary::Parent(parent) => format!("{parent}..{}", branch.full_ref()),
        }
    }
}

impl fmt::Display for RewriteBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteBoundary::Root => f.write_str("root"),
            RewriteBoundary::Parent(parent) => write!(f, "{}", parent.to_short_oid()),
        }
    }
}

/// Minimal rewrite range computation over a store's staged edits
pub struct RewritePlanner<'s> {
    store: &'s ModificationStore,
}

impl<'s> RewritePlanner<'s> {
    pub fn new(store: &'s ModificationStore) -> Self {
        RewritePlanner { store }
    }

    /// Boundary of the rewrite, `None` when nothing is staged
    pub fn oldest_modified_parent(&self) -> Result<Option<RewriteBoundary>> {
        let snapshot = self.store.snapshot();
        let Some(oldest) = self.store.modified_commits().next() else {
            return Ok(None);
        };

        let boundary = match oldest.parent() {
            None => RewriteBoundary::Root,
            Some(parent) if snapshot.contains(parent) => RewriteBoundary::Parent(parent.clone()),
            Some(parent) => {
                return Err(ChiselError::StaleHistory {
                    branch: snapshot.branch().name.to_string(),
                    reason: format!("parent {parent} of {} is not loaded", oldest.oid()),
                });
            }
        };

        debug!(boundary = %boundary, oldest = %oldest.oid(), "computed rewrite boundary");
        Ok(Some(boundary))
    }

    /// Number of commits `git filter-branch` will walk
    pub fn commits_to_rewrite_count(&self) -> Result<usize> {
        let snapshot = self.store.snapshot();

        Ok(match self.oldest_modified_parent()? {
            None => 0,
            Some(RewriteBoundary::Root) => snapshot.len(),
            Some(RewriteBoundary::Parent(parent)) => {
                snapshot.position(&parent).unwrap_or(snapshot.len())
            }
        })
    }

    pub fn revision_range(&self) -> Result<Option<String>> {
        let branch = &self.store.snapshot().branch().name;
        Ok(self
            .oldest_modified_parent()?
            .map(|boundary| boundary.revision_range(branch)))
    }

    /// Fail when the branch moved on disk since the snapshot was loaded
    pub fn verify_fresh(&self, repository: &Repository) -> Result<()> {
        let snapshot = self.store.snapshot();
        let branch = &snapshot.branch().name;

        match repository.refs().read_branch(branch)? {
            Some(head) if &head == snapshot.head() => Ok(()),
            Some(head) => Err(ChiselError::StaleHistory {
                branch: branch.to_string(),
                reason: format!(
                    "head moved from {} to {}",
                    snapshot.head().to_short_oid(),
                    head.to_short_oid()
                ),
            }),
            None => Err(ChiselError::StaleHistory {
                branch: branch.to_string(),
                reason: "branch no longer exists".to_string(),
            }),
        }
    }
}
