use crate::areas::database::Database;
use crate::areas::git::Git;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::{ChiselError, Result};
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

/// Explicit handle on one repository
///
/// Every component receives the work tree through this handle; nothing relies on
/// the process' current directory.
pub struct Repository {
    path: Box<Path>,
    git_dir: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    refs: Refs,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = Path::new(path).canonicalize()?;
        let git = Git::new(path.clone().into_boxed_path());

        // resolve the top level so that `-C sub/dir` still points at the work tree root
        let top_level = git.run(&["rev-parse", "--show-toplevel"])?;
        let path = PathBuf::from(top_level.trim());
        let git = Git::new(path.clone().into_boxed_path());

        let refs = Refs::new(git.clone());
        let git_dir = refs.git_dir()?;
        let database = Database::new(git);

        Ok(Repository {
            path: path.into_boxed_path(),
            git_dir: git_dir.into_boxed_path(),
            writer: RefCell::new(writer),
            database,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// The given branch, or the checked-out one when `None`
    pub fn branch_or_current(&self, branch: Option<&str>) -> Result<BranchName> {
        match branch {
            Some(name) => BranchName::try_parse(name.to_string())
                .map_err(|e| ChiselError::Parse(format!("{e:#}"))),
            None => self.refs.current_branch()?.ok_or_else(|| {
                ChiselError::Parse("HEAD is detached; pass a branch explicitly".to_string())
            }),
        }
    }
}
