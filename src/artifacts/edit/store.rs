use crate::artifacts::edit::field::{Field, FieldValue};
use crate::artifacts::log::snapshot::HistorySnapshot;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{ChiselError, Result};
use chrono::{DateTime, Utc};
use derive_new::new;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// A single staged change
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FieldEdit {
    pub commit: ObjectId,
    pub field: Field,
    pub value: FieldValue,
}

/// Callback invoked with the edits staged by one `set_field` call
pub type Observer = Box<dyn FnMut(&[FieldEdit]) + Send>;

/// Staged per-commit field edits over an immutable snapshot
///
/// Every staged commit id belongs to the snapshot the store was built from or last
/// reloaded with.
pub struct ModificationStore {
    snapshot: HistorySnapshot,
    staged: HashMap<ObjectId, BTreeMap<Field, FieldValue>>,
    merge: bool,
    show_modifications: bool,
    dirty: bool,
    observers: Vec<Observer>,
}

impl ModificationStore {
    pub fn new(snapshot: HistorySnapshot) -> Self {
        ModificationStore {
            snapshot,
            staged: HashMap::new(),
            merge: false,
            show_modifications: true,
            dirty: false,
            observers: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &HistorySnapshot {
        &self.snapshot
    }

    /// Keep author and committer (and their dates) in sync while staging
    pub fn set_merge(&mut self, merge: bool) {
        self.merge = merge;
    }

    pub fn merge(&self) -> bool {
        self.merge
    }

    /// When off, `get` reads original values even for staged fields
    pub fn set_show_modifications(&mut self, show: bool) {
        self.show_modifications = show;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Stage `value` for `field` of `commit` if it differs from the effective value
    ///
    /// Returns the edits actually staged, mirrored fields included.
    pub fn set_field(
        &mut self,
        commit: &ObjectId,
        field: Field,
        value: FieldValue,
    ) -> Result<Vec<FieldEdit>> {
        let current = self.effective(commit, field)?;
        if value.kind() != field.kind() {
            return Err(ChiselError::ValueMismatch {
                field,
                found: value.kind(),
            });
        }

        if current == value {
            return Ok(Vec::new());
        }

        let mut edits = vec![FieldEdit::new(commit.clone(), field, value.clone())];
        if self.merge
            && let Some(mirror) = field.mirror()
        {
            edits.push(FieldEdit::new(commit.clone(), mirror, value));
        }

        self.commit_edits(&edits);
        Ok(edits)
    }

    /// Stage a date given as an instant, keeping the commit's original offset
    ///
    /// Nothing is staged when the result equals the effective value.
    pub fn stage_instant(
        &mut self,
        commit: &ObjectId,
        field: Field,
        instant: DateTime<Utc>,
    ) -> Result<Option<FieldEdit>> {
        let current = self.effective(commit, field)?;
        let original = self
            .original(commit, field)?
            .as_date()
            .ok_or(ChiselError::ValueMismatch {
                field,
                found: "date",
            })?;

        let value = FieldValue::Date(instant.with_timezone(original.offset()));
        if current == value {
            return Ok(None);
        }

        let edit = FieldEdit::new(commit.clone(), field, value);
        self.commit_edits(std::slice::from_ref(&edit));
        Ok(Some(edit))
    }

    /// Staged value if shown and present, else the loaded one
    pub fn get(&self, commit: &ObjectId, field: Field) -> Result<FieldValue> {
        if self.show_modifications
            && let Some(value) = self.staged_value(commit, field)
        {
            return Ok(value.clone());
        }
        self.original(commit, field)
    }

    pub fn original(&self, commit: &ObjectId, field: Field) -> Result<FieldValue> {
        Ok(field.read(self.commit(commit)?))
    }

    pub fn is_modified(&self, commit: &ObjectId, field: Field) -> bool {
        self.staged_value(commit, field).is_some()
    }

    /// Staged fields of one commit
    pub fn modifications(&self, commit: &ObjectId) -> Option<&BTreeMap<Field, FieldValue>> {
        self.staged.get(commit)
    }

    pub fn modified_count(&self) -> usize {
        self.staged.len()
    }

    pub fn has_modifications(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Modified commits in ancestry order, earliest first
    pub fn modified_commits(&self) -> impl Iterator<Item = &Commit> {
        self.snapshot
            .oldest_first()
            .filter(|commit| self.staged.contains_key(commit.oid()))
    }

    pub fn erase_all(&mut self) {
        debug!(commits = self.staged.len(), "erasing staged edits");
        self.staged.clear();
        self.dirty = false;
    }

    /// Swap in a freshly loaded snapshot, dropping edits of vanished commits
    pub fn reload(&mut self, snapshot: HistorySnapshot) {
        let before = self.staged.len();
        self.staged.retain(|oid, _| snapshot.contains(oid));

        let dropped = before - self.staged.len();
        if dropped > 0 {
            warn!(dropped, "staged edits dropped, their commits are gone");
        }

        self.snapshot = snapshot;
        self.dirty = !self.staged.is_empty();
    }

    fn commit(&self, oid: &ObjectId) -> Result<&Commit> {
        self.snapshot
            .get(oid)
            .ok_or_else(|| ChiselError::UnknownCommit(oid.clone()))
    }

    fn staged_value(&self, commit: &ObjectId, field: Field) -> Option<&FieldValue> {
        self.staged.get(commit).and_then(|fields| fields.get(&field))
    }

    fn effective(&self, commit: &ObjectId, field: Field) -> Result<FieldValue> {
        if !field.is_editable() {
            return Err(ChiselError::InvalidField(field));
        }
        match self.staged_value(commit, field) {
            Some(value) => Ok(value.clone()),
            None => self.original(commit, field),
        }
    }

    fn commit_edits(&mut self, edits: &[FieldEdit]) {
        for edit in edits {
            debug!(commit = %edit.commit, field = %edit.field, "staging edit");
            self.staged
                .entry(edit.commit.clone())
                .or_default()
                .insert(edit.field, edit.value.clone());
        }
        self.dirty = true;

        for observer in self.observers.iter_mut() {
            observer(edits);
        }
    }
}
