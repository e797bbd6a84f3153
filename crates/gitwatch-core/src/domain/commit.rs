//! Commit and per-file diff entries as returned by the remote history API.
//!
//! Field names follow the GitLab v4 payload so the adapter can deserialize
//! directly; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque commit identifier (a content hash on GitLab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 8 文字の短縮形（ログ用）
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub author_name: String,
    pub title: String,
    /// The remote's timestamp string, kept verbatim for display.
    pub committed_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub new_path: String,
    pub diff: String,
}
