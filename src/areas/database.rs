//! Commit reads from the object database
//!
//! Ancestry comes from `git rev-list`, object content from a single
//! `git cat-file --batch` process per load, so packed and loose objects are read
//! the same way.

use crate::areas::git::Git;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ChiselError, Result};
use derive_new::new;
use tracing::debug;

#[derive(Debug, Clone, new)]
pub struct Database {
    git: Git,
}

fn parse_error(e: anyhow::Error) -> ChiselError {
    ChiselError::Parse(format!("{e:#}"))
}

impl Database {
    /// Ancestry of `tip` in head-first topological order
    ///
    /// Children always precede their parents. Commits reachable from `exclude`
    /// are left out.
    pub fn rev_list(&self, tip: &ObjectId, exclude: Option<&ObjectId>) -> Result<Vec<ObjectId>> {
        let excluded = exclude.map(|oid| format!("^{oid}"));
        let mut args = vec!["rev-list", "--topo-order", tip.as_ref()];
        if let Some(excluded) = excluded.as_deref() {
            args.push(excluded);
        }

        self.git
            .run(&args)?
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| ObjectId::try_parse(line.to_string()).map_err(parse_error))
            .collect()
    }

    /// Read and parse the given commits, preserving order
    pub fn load_commits(&self, oids: &[ObjectId]) -> Result<Vec<Commit>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let input = oids
            .iter()
            .map(|oid| format!("{oid}\n"))
            .collect::<String>()
            .into_bytes();
        let output = self.git.run_with_input(&["cat-file", "--batch"], input)?;

        let commits = BatchReader::new(&output)
            .map(|entry| {
                let (oid, content) = entry?;
                Commit::parse(oid, content).map_err(parse_error)
            })
            .collect::<Result<Vec<_>>>()?;

        if commits.len() != oids.len() {
            return Err(ChiselError::Parse(format!(
                "expected {} commits from cat-file, got {}",
                oids.len(),
                commits.len()
            )));
        }

        debug!(count = commits.len(), "loaded commits");
        Ok(commits)
    }
}

/// Iterator over `<oid> <type> <size>\n<content>\n` records
struct BatchReader<'a> {
    data: &'a [u8],
}

impl<'a> BatchReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        BatchReader { data }
    }

    fn next_record(&mut self) -> Result<(ObjectId, &'a [u8])> {
        let header_end = self
            .data
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| ChiselError::Parse("truncated cat-file header".to_string()))?;
        let header = String::from_utf8_lossy(&self.data[..header_end]).into_owned();

        let mut parts = header.split(' ');
        let (oid, object_type, size) = match (parts.next(), parts.next(), parts.next()) {
            (Some(oid), Some(object_type), Some(size)) => (oid, object_type, size),
            _ => return Err(ChiselError::Parse(format!("unexpected cat-file header: {header}"))),
        };
        if object_type != "commit" {
            return Err(ChiselError::Parse(format!("{oid} is a {object_type}, not a commit")));
        }

        let oid = ObjectId::try_parse(oid.to_string()).map_err(parse_error)?;
        let size: usize = size
            .parse()
            .map_err(|_| ChiselError::Parse(format!("invalid object size in: {header}")))?;

        let content_start = header_end + 1;
        let content_end = content_start + size;
        if self.data.len() < content_end {
            return Err(ChiselError::Parse(format!("truncated content for {oid}")));
        }

        let content = &self.data[content_start..content_end];
        // skip the newline terminating the record
        self.data = self.data.get(content_end + 1..).unwrap_or_default();

        Ok((oid, content))
    }
}

impl<'a> Iterator for BatchReader<'a> {
    type Item = Result<(ObjectId, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let record = self.next_record();
        if record.is_err() {
            self.data = &[];
        }
        Some(record)
    }
}
