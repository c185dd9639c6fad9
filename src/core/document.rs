//! Documents and document kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of artifact a document describes (`skill`, `agent`, `command`, ...).
///
/// Kinds are declared by the policy, so this is an open set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKind(String);

impl DocumentKind {
    pub fn new(name: impl Into<String>) -> Self {
        DocumentKind(name.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKind {
    fn from(s: &str) -> Self {
        DocumentKind::new(s)
    }
}

/// A document as read from disk. `path` is relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub raw_content: String,
    pub metadata_raw: Option<String>,
    pub body: String,
}

impl Document {
    /// Directory containing the document, relative to the repository root.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Forward-slash rendering of the relative path, stable across platforms.
    pub fn display_path(&self) -> String {
        display_path(&self.path)
    }
}

pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
