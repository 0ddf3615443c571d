//! Revision pinning
//!
//! A session addresses remote state through exactly one pin: a branch
//! (always the latest head), a tag, or a commit id. After a successful write
//! the service reports the commit it produced, and tag/commit pins move to
//! that commit so the next read sees what was just written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConnectionOptions;
use crate::error::{Error, Result};

/// Tag used when the configuration names no pin at all.
pub const DEFAULT_TAG: &str = "current";

/// How a session is pinned to remote state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    Branch,
    Tag,
    Commit,
}

impl RevisionKind {
    /// Resolution priority, highest first.
    pub const PRIORITY: [RevisionKind; 3] = [Self::Branch, Self::Tag, Self::Commit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevisionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "branch" => Ok(Self::Branch),
            "tag" => Ok(Self::Tag),
            "commit" => Ok(Self::Commit),
            other => Err(Error::Configuration(format!(
                "unknown revision kind '{}' (expected branch, tag or commit)",
                other
            ))),
        }
    }
}

/// The revision pin of one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSelector {
    kind: RevisionKind,
    value: String,
}

impl RevisionSelector {
    /// Create a selector, rejecting empty identifiers.
    pub fn new(kind: RevisionKind, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "empty {} given as revision pin",
                kind
            )));
        }
        Ok(Self { kind, value })
    }

    pub fn branch(value: impl Into<String>) -> Result<Self> {
        Self::new(RevisionKind::Branch, value)
    }

    pub fn tag(value: impl Into<String>) -> Result<Self> {
        Self::new(RevisionKind::Tag, value)
    }

    pub fn commit(value: impl Into<String>) -> Result<Self> {
        Self::new(RevisionKind::Commit, value)
    }

    /// Pick the pin named by `options`.
    ///
    /// When several pins are configured, branch wins over tag, and tag over
    /// commit. With none configured the session follows `tag=current`.
    pub fn resolve(options: &ConnectionOptions) -> Result<Self> {
        for kind in RevisionKind::PRIORITY {
            let value = match kind {
                RevisionKind::Branch => options.branch.as_deref(),
                RevisionKind::Tag => options.tag.as_deref(),
                RevisionKind::Commit => options.commit.as_deref(),
            };
            if let Some(value) = value {
                return Self::new(kind, value);
            }
        }
        Ok(Self::default())
    }

    pub fn kind(&self) -> RevisionKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Query string identifying this pin, e.g. `tag=current`.
    pub fn query_fragment(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(self.kind.as_str(), &self.value)
            .finish()
    }

    /// Move the pin to `commit` after a successful write.
    ///
    /// Branch pins always float to the server head and are left alone.
    /// Returns whether the pin changed.
    pub fn advance(&mut self, commit: &str) -> bool {
        if self.kind == RevisionKind::Branch {
            return false;
        }
        if self.kind == RevisionKind::Commit && self.value == commit {
            return false;
        }
        self.kind = RevisionKind::Commit;
        self.value = commit.to_string();
        true
    }
}

impl Default for RevisionSelector {
    fn default() -> Self {
        Self {
            kind: RevisionKind::Tag,
            value: DEFAULT_TAG.to_string(),
        }
    }
}

impl fmt::Display for RevisionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_fragment())
    }
}

/// Parses `kind=value`, e.g. `branch=dev`.
impl FromStr for RevisionSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, value) = s.split_once('=').ok_or_else(|| {
            Error::Configuration(format!("revision pin '{}' is not of the form kind=value", s))
        })?;
        Self::new(kind.trim().parse()?, value.trim())
    }
}
