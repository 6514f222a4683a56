//! Filter fragments for `git filter-branch`
//!
//! ## Identity fragment (`--env-filter`)
//!
//! ```text
//! if [ \"\$GIT_COMMIT\" = '<oid>' ]; then
//! GIT_AUTHOR_NAME='<name>'; export GIT_AUTHOR_NAME;
//! GIT_AUTHOR_DATE='<date>'; export GIT_AUTHOR_DATE;
//! fi
//! ```
//!
//! ## Message fragment (`--commit-filter`)
//!
//! ```text
//! if [ \"\$GIT_COMMIT\" = '<oid>' ]; then printf '%s\n' '<message>' > ../message; fi;
//! git commit-tree \"\$@\"
//! ```
//!
//! Fragments are written pre-escaped for the double-quoted argument that carries
//! them on the command line.

use crate::artifacts::edit::field::{Field, FieldValue};
use crate::artifacts::edit::store::ModificationStore;
use crate::artifacts::objects::commit::format_git_date;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::rewrite::escape::{escape, shell_quote};
use crate::errors::Result;
use std::collections::BTreeMap;

pub const FILTER_BRANCH_COMMAND: &str = "git filter-branch";
const COMMIT_TREE_TAIL: &str = "git commit-tree \\\"\\$@\\\"";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewriteScripts {
    identity: Option<String>,
    message: Option<String>,
}

impl RewriteScripts {
    /// Build both fragments from the staged edits, in ancestry order
    pub fn generate(store: &ModificationStore) -> Result<Self> {
        let mut identity_blocks = Vec::new();
        let mut message_blocks = Vec::new();

        for commit in store.modified_commits() {
            let Some(fields) = store.modifications(commit.oid()) else {
                continue;
            };

            if let Some(block) = identity_block(commit.oid(), fields)? {
                identity_blocks.push(block);
            }
            if let Some(FieldValue::Text(message)) = fields.get(&Field::Message) {
                message_blocks.push(message_block(commit.oid(), message)?);
            }
        }

        let identity = (!identity_blocks.is_empty()).then(|| identity_blocks.concat());
        let message = (!message_blocks.is_empty())
            .then(|| format!("{}\n{COMMIT_TREE_TAIL}", message_blocks.join("\n")));

        Ok(RewriteScripts { identity, message })
    }

    pub fn identity_fragment(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn message_fragment(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_none() && self.message.is_none()
    }

    /// Complete `git filter-branch` invocation over `range`, for `sh -c`
    pub fn command_line(&self, range: &str) -> String {
        let mut command = String::from(FILTER_BRANCH_COMMAND);

        if let Some(identity) = &self.identity {
            command.push_str(&format!(" --env-filter \"{identity}\""));
        }
        if let Some(message) = &self.message {
            command.push_str(&format!(" --commit-filter \"{message}\""));
        }
        command.push_str(&format!(" -- {}", shell_quote(range)));

        command
    }
}

fn guard(oid: &ObjectId) -> String {
    format!("if [ \\\"\\$GIT_COMMIT\\\" = '{oid}' ]; then")
}

fn export(variable: &str, value: &str) -> Result<String> {
    Ok(format!("{variable}='{}'; export {variable};\n", escape(value)?))
}

fn identity_block(oid: &ObjectId, fields: &BTreeMap<Field, FieldValue>) -> Result<Option<String>> {
    let mut exports = String::new();

    for (field, value) in fields {
        match (field, value) {
            (Field::Author, FieldValue::Actor(actor)) => {
                exports.push_str(&export("GIT_AUTHOR_NAME", actor.name())?);
                exports.push_str(&export("GIT_AUTHOR_EMAIL", actor.email())?);
            }
            (Field::Committer, FieldValue::Actor(actor)) => {
                exports.push_str(&export("GIT_COMMITTER_NAME", actor.name())?);
                exports.push_str(&export("GIT_COMMITTER_EMAIL", actor.email())?);
            }
            (Field::AuthoredDate, FieldValue::Date(date)) => {
                exports.push_str(&export("GIT_AUTHOR_DATE", &format_git_date(date))?);
            }
            (Field::CommittedDate, FieldValue::Date(date)) => {
                exports.push_str(&export("GIT_COMMITTER_DATE", &format_git_date(date))?);
            }
            _ => {}
        }
    }

    if exports.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("{}\n{exports}fi\n", guard(oid))))
}

fn message_block(oid: &ObjectId, message: &str) -> Result<String> {
    Ok(format!(
        "{} printf '%s\\n' '{}' > ../message; fi;",
        guard(oid),
        escape(message)?
    ))
}
