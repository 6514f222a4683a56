use crate::artifacts::objects::commit::{Actor, Commit, format_git_date};
use crate::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::str::FromStr;

/// Names accepted on the command line for each field
pub const FIELD_NAMES: phf::Map<&'static str, Field> = phf::phf_map! {
    "id" => Field::Id,
    "author" => Field::Author,
    "committer" => Field::Committer,
    "authored_date" => Field::AuthoredDate,
    "author_date" => Field::AuthoredDate,
    "committed_date" => Field::CommittedDate,
    "commit_date" => Field::CommittedDate,
    "message" => Field::Message,
};

/// Per-commit attribute that can be read, and except for `Id`, edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    Author,
    Committer,
    AuthoredDate,
    CommittedDate,
    Message,
}

impl Field {
    pub const EDITABLE: [Field; 5] = [
        Field::Author,
        Field::Committer,
        Field::AuthoredDate,
        Field::CommittedDate,
        Field::Message,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Author => "author",
            Field::Committer => "committer",
            Field::AuthoredDate => "authored_date",
            Field::CommittedDate => "committed_date",
            Field::Message => "message",
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Field::Id)
    }

    /// Field kept in sync with this one while merge mode is on
    pub fn mirror(&self) -> Option<Field> {
        match self {
            Field::Author => Some(Field::Committer),
            Field::Committer => Some(Field::Author),
            Field::AuthoredDate => Some(Field::CommittedDate),
            Field::CommittedDate => Some(Field::AuthoredDate),
            Field::Id | Field::Message => None,
        }
    }

    /// Value kind this field holds
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Author | Field::Committer => "actor",
            Field::AuthoredDate | Field::CommittedDate => "date",
            Field::Message => "text",
        }
    }

    /// Value of this field as recorded in the commit
    pub fn read(&self, commit: &Commit) -> FieldValue {
        match self {
            Field::Id => FieldValue::Id(commit.oid().clone()),
            Field::Author => FieldValue::Actor(commit.author().actor().clone()),
            Field::Committer => FieldValue::Actor(commit.committer().actor().clone()),
            Field::AuthoredDate => FieldValue::Date(commit.author().when()),
            Field::CommittedDate => FieldValue::Date(commit.committer().when()),
            Field::Message => FieldValue::Text(commit.message().to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown field: {s:?}"))
    }
}

/// Typed value of a field
///
/// Dates are equal only when both the instant and the recorded offset match, so
/// moving a commit to another timezone counts as a modification.
#[derive(Debug, Clone, Eq)]
pub enum FieldValue {
    Id(ObjectId),
    Actor(Actor),
    Date(DateTime<FixedOffset>),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Id(_) => "id",
            FieldValue::Actor(_) => "actor",
            FieldValue::Date(_) => "date",
            FieldValue::Text(_) => "text",
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match self {
            FieldValue::Actor(actor) => Some(actor),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Id(a), FieldValue::Id(b)) => a == b,
            (FieldValue::Actor(a), FieldValue::Actor(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b && a.offset() == b.offset(),
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(oid) => write!(f, "{oid}"),
            FieldValue::Actor(actor) => f.write_str(&actor.display_name()),
            FieldValue::Date(date) => f.write_str(&format_git_date(date)),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}
