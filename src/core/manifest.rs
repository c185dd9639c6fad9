//! Install manifest: which catalog entries have been applied locally.
//!
//! The manifest is a single JSON document. Every change reads the whole
//! document, edits it in memory and rewrites it atomically; one writer at a
//! time is assumed.

use crate::core::atomic;
use crate::core::error::SkillmetaError;
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MANIFEST_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub category: Option<String>,
    pub installed_at: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl InstalledEntry {
    /// Builds an entry from a catalog entry as written by the exporter.
    pub fn from_catalog_entry(entry: &serde_json::Value) -> Option<InstalledEntry> {
        let text = |v: &serde_json::Value| v.as_str().map(str::to_string);
        let name = text(&entry["identity"]["name"])?;
        Some(InstalledEntry {
            name,
            version: text(&entry["versioning"]["version"]).unwrap_or_else(|| "1.0.0".to_string()),
            category: text(&entry["identity"]["category"]),
            installed_at: time::now_iso8601(),
            source: text(&entry["source"]).unwrap_or_default(),
            description: text(&entry["identity"]["description"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub installed: Vec<InstalledEntry>,
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    MANIFEST_VERSION.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            installed: Vec::new(),
            last_sync: None,
            version: default_version(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Entries whose version or description changed.
    pub updated: Vec<String>,
    /// Installed names no current catalog knows about.
    pub missing: Vec<String>,
}

impl Manifest {
    /// Loads `path`; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Manifest, SkillmetaError> {
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let text = fs::read_to_string(path).map_err(|e| SkillmetaError::at_path(path, e))?;
        if text.trim().is_empty() {
            return Ok(Manifest::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), SkillmetaError> {
        atomic::write_json_atomic(path, self)
    }

    /// Read-modify-write of the manifest at `path`.
    pub fn update<T, F>(path: &Path, f: F) -> Result<T, SkillmetaError>
    where
        F: FnOnce(&mut Manifest) -> Result<T, SkillmetaError>,
    {
        let mut manifest = Self::load(path)?;
        let out = f(&mut manifest)?;
        manifest.save(path)?;
        Ok(out)
    }

    pub fn find(&self, name: &str) -> Option<&InstalledEntry> {
        self.installed.iter().find(|e| e.name == name)
    }

    /// Inserts or replaces by name. Returns the replaced entry.
    pub fn record(&mut self, entry: InstalledEntry) -> Option<InstalledEntry> {
        if let Some(slot) = self.installed.iter_mut().find(|e| e.name == entry.name) {
            return Some(std::mem::replace(slot, entry));
        }
        self.installed.push(entry);
        self.installed.sort_by(|a, b| a.name.cmp(&b.name));
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<InstalledEntry> {
        let idx = self.installed.iter().position(|e| e.name == name)?;
        Some(self.installed.remove(idx))
    }

    /// Refreshes installed entries from current catalog entries and stamps
    /// `lastSync`. Entries absent from the catalogs are reported, not removed.
    pub fn sync_from(&mut self, catalog_entries: &[serde_json::Value]) -> SyncSummary {
        let current: Vec<InstalledEntry> = catalog_entries
            .iter()
            .filter_map(InstalledEntry::from_catalog_entry)
            .collect();
        let mut summary = SyncSummary::default();
        for installed in &mut self.installed {
            match current.iter().find(|c| c.name == installed.name) {
                Some(latest) => {
                    let changed = installed.version != latest.version
                        || installed.description != latest.description
                        || installed.category != latest.category;
                    if changed {
                        installed.version = latest.version.clone();
                        installed.description = latest.description.clone();
                        installed.category = latest.category.clone();
                        summary.updated.push(installed.name.clone());
                    }
                }
                None => summary.missing.push(installed.name.clone()),
            }
        }
        self.last_sync = Some(time::now_iso8601());
        summary
    }
}
