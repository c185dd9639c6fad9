//! Read-only view of the repository that rules may consult.

use crate::core::document::DocumentKind;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Component, Path, PathBuf};

/// Repository root plus the index of known artifact names per kind.
///
/// Built once per batch before any rule runs and shared immutably across
/// worker threads.
#[derive(Debug, Clone, Default)]
pub struct RepoContext {
    root: PathBuf,
    artifacts: FxHashMap<DocumentKind, FxHashSet<String>>,
}

impl RepoContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RepoContext {
            root: root.into(),
            artifacts: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_artifact(&mut self, kind: &DocumentKind, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.artifacts
            .entry(kind.clone())
            .or_default()
            .insert(name.to_string());
    }

    pub fn has_artifact(&self, kind: &DocumentKind, name: &str) -> bool {
        self.artifacts
            .get(kind)
            .is_some_and(|names| names.contains(name.trim()))
    }

    pub fn artifact_count(&self, kind: &DocumentKind) -> usize {
        self.artifacts.get(kind).map_or(0, |names| names.len())
    }

    /// Whether a root-relative path exists. Paths escaping the root never resolve.
    pub fn exists(&self, relative: &Path) -> bool {
        match normalize_relative(relative) {
            Some(clean) => self.root.join(clean).exists(),
            None => false,
        }
    }
}

/// Lexically resolves `.` and `..`; `None` when the path climbs above its base
/// or is absolute.
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Name an artifact is known by when derived from its path: the parent
/// directory for fixed file names (`skills/demo/SKILL.md` → `demo`), the file
/// stem otherwise (`agents/reviewer.md` → `reviewer`).
pub fn artifact_name_from_path(path: &Path, pattern: &str) -> Option<String> {
    let last_segment = pattern.rsplit('/').next().unwrap_or(pattern);
    let fixed_file_name = !last_segment.contains(['*', '?']);
    let name = if fixed_file_name {
        path.parent()?.file_name()?
    } else {
        path.file_stem()?
    };
    Some(name.to_string_lossy().to_string())
}
