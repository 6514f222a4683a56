use crate::areas::repository::Repository;
use crate::artifacts::edit::field::{Field, FieldValue};
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::log::filter::CommitFilter;
use crate::artifacts::log::snapshot::HistorySnapshot;
use crate::artifacts::objects::commit::Actor;
use crate::artifacts::objects::object_id::ObjectId;
use crate::commands::porcelain::write::WriteOptions;
use chrono::{DateTime, FixedOffset};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub branch: Option<String>,
    /// Commits named explicitly
    pub revisions: Vec<String>,
    /// Commits selected in bulk, `None` when only revisions are given
    pub filter: Option<CommitFilter>,
    pub author: Option<Actor>,
    pub committer: Option<Actor>,
    pub author_date: Option<DateTime<FixedOffset>>,
    pub commit_date: Option<DateTime<FixedOffset>>,
    pub message: Option<String>,
    pub merge: bool,
    pub write: WriteOptions,
}

impl EditOptions {
    fn values(&self) -> Vec<(Field, FieldValue)> {
        let mut values = Vec::new();
        if let Some(author) = &self.author {
            values.push((Field::Author, FieldValue::Actor(author.clone())));
        }
        if let Some(committer) = &self.committer {
            values.push((Field::Committer, FieldValue::Actor(committer.clone())));
        }
        if let Some(date) = self.author_date {
            values.push((Field::AuthoredDate, FieldValue::Date(date)));
        }
        if let Some(date) = self.commit_date {
            values.push((Field::CommittedDate, FieldValue::Date(date)));
        }
        if let Some(message) = &self.message {
            values.push((Field::Message, FieldValue::Text(message.trim_end().to_string())));
        }
        values
    }
}

impl Repository {
    pub async fn edit(&self, opts: &EditOptions) -> anyhow::Result<()> {
        let values = opts.values();
        if values.is_empty() {
            anyhow::bail!("nothing to edit: pass at least one of --author, --committer, --author-date, --commit-date, --message");
        }

        let branch = self.branch_or_current(opts.branch.as_deref())?;
        let snapshot = HistorySnapshot::load(self, &branch)?;
        let selected = self.select_commits(&snapshot, opts)?;
        if selected.is_empty() {
            anyhow::bail!("no commit of {branch} matches the selection");
        }

        let mut store = ModificationStore::new(snapshot);
        store.set_merge(opts.merge);

        for oid in &selected {
            for (field, value) in &values {
                store.set_field(oid, *field, value.clone())?;
            }
        }

        info!(
            %branch,
            selected = selected.len(),
            modified = store.modified_count(),
            "staged edits"
        );

        self.write_modifications(std::slice::from_ref(&store), &opts.write)
            .await
    }

    /// Explicit revisions first, then bulk matches, without duplicates
    fn select_commits(
        &self,
        snapshot: &HistorySnapshot,
        opts: &EditOptions,
    ) -> anyhow::Result<Vec<ObjectId>> {
        let mut selected = Vec::new();

        for revision in &opts.revisions {
            let oid = self.refs().resolve_commit(revision)?;
            if !snapshot.contains(&oid) {
                anyhow::bail!(
                    "{revision} is not part of branch {}",
                    snapshot.branch().name
                );
            }
            if !selected.contains(&oid) {
                selected.push(oid);
            }
        }

        if let Some(filter) = &opts.filter {
            for commit in filter.apply(snapshot) {
                if !selected.contains(commit.oid()) {
                    selected.push(commit.oid().clone());
                }
            }
        }

        Ok(selected)
    }
}
