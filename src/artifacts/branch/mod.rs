//! Branch names and resolved branch references

pub mod branch_name;

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Remote-tracking branch a local branch is configured to follow
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Upstream {
    /// Full reference name, e.g. `refs/remotes/origin/main`
    pub name: String,
    pub head: ObjectId,
}

/// A local branch resolved against the repository at load time
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct BranchRef {
    pub name: BranchName,
    pub head: ObjectId,
    pub upstream: Option<Upstream>,
}
