//! Git commit object
//!
//! Commits are loaded read-only and never mutated; staged edits live next to them in
//! the modification store.
//!
//! ## Format
//!
//! Raw object content as printed by `git cat-file --batch`:
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  <continuation lines>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use chrono::{DateTime, FixedOffset};

/// Canonical textual date form understood by git's date parser
pub const GIT_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y %z";

/// Name and email of an author or committer
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Actor {
    name: String,
    email: String,
}

impl Actor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Actor {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Format actor name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

impl TryFrom<&str> for Actor {
    type Error = anyhow::Error;

    /// Parse "Name <email>"
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let email_start = value
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid actor format: missing '<' in {value:?}"))?;
        let email_end = value
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| anyhow::anyhow!("Invalid actor format: missing '>' in {value:?}"))?;

        let name = value[..email_start].trim().to_string();
        let email = value[email_start + 1..email_end].to_string();

        Ok(Actor { name, email })
    }
}

/// Who did something, and when
///
/// The timestamp keeps the UTC offset recorded in the commit.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Signature {
    actor: Actor,
    when: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(actor: Actor, when: DateTime<FixedOffset>) -> Self {
        Signature { actor, when }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn when(&self) -> DateTime<FixedOffset> {
        self.when
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 01 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        format_git_date(&self.when)
    }
}

impl TryFrom<&str> for Signature {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid signature format: {value:?}"));
        }

        let offset = parse_utc_offset(parts[0])?;
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp: {}", parts[1]))?;
        let actor = Actor::try_from(parts[2])?;

        let when = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {timestamp}"))?
            .with_timezone(&offset);

        Ok(Signature { actor, when })
    }
}

/// Parse a `±HHMM` offset
pub fn parse_utc_offset(value: &str) -> anyhow::Result<FixedOffset> {
    let (sign, digits) = match value.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => anyhow::bail!("Invalid timezone: {value:?}"),
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Invalid timezone: {value:?}");
    }

    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow::anyhow!("Timezone out of range: {value:?}"))
}

/// Parse a user supplied date
///
/// Accepts RFC 2822, `YYYY-MM-DD HH:MM:SS ±HHMM` and the canonical git form.
pub fn parse_date(value: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z"))
        .or_else(|_| DateTime::parse_from_str(value, GIT_DATE_FORMAT))
        .with_context(|| format!("unrecognized date: {value:?}"))
}

/// Render a date as `Weekday Mon DD HH:MM:SS YYYY ±HHMM`
pub fn format_git_date(when: &DateTime<FixedOffset>) -> String {
    when.format(GIT_DATE_FORMAT).to_string()
}

/// Git commit object
///
/// Contains only what the editor works with: identity, ancestry and the editable
/// metadata.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    oid: ObjectId,
    /// Parent commit IDs (empty for the root commit, multiple for merge commits)
    parents: Vec<ObjectId>,
    author: Signature,
    committer: Signature,
    /// Commit message without trailing whitespace
    message: String,
}

impl Commit {
    pub fn new(
        oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: String,
    ) -> Self {
        Commit {
            oid,
            parents,
            author,
            committer,
            message: message.trim_end().to_string(),
        }
    }

    /// Parse the raw content of a commit object
    ///
    /// Unknown headers (`gpgsig`, `mergetag`, `encoding`, ...) and their continuation
    /// lines are skipped.
    pub fn parse(oid: ObjectId, content: &[u8]) -> anyhow::Result<Self> {
        let content = String::from_utf8_lossy(content);
        let (headers, message) = content
            .split_once("\n\n")
            .unwrap_or((content.as_ref(), ""));

        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            if line.starts_with(' ') {
                continue;
            }

            if let Some(parent) = line.strip_prefix("parent ") {
                parents.push(ObjectId::try_parse(parent.to_string())?);
            } else if let Some(value) = line.strip_prefix("author ") {
                author = Some(Signature::try_from(value)?);
            } else if let Some(value) = line.strip_prefix("committer ") {
                committer = Some(Signature::try_from(value)?);
            }
        }

        let author = author
            .with_context(|| format!("Invalid commit object {oid}: missing author line"))?;
        let committer = committer
            .with_context(|| format!("Invalid commit object {oid}: missing committer line"))?;

        Ok(Self::new(oid, parents, author, committer, message.to_string()))
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the first line of the commit message
    ///
    /// Useful for short-form display (e.g., `chisel log --oneline`)
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }
}
