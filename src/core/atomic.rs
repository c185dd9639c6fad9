//! Temp-file-then-rename writes.
//!
//! The temp file lives next to the target so the rename never crosses a
//! filesystem boundary. An interrupted write leaves either the old file or
//! the new one, never a truncated mix.

use crate::core::error::SkillmetaError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use ulid::Ulid;

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    target.with_file_name(format!(".{}.{}.tmp", name, Ulid::new()))
}

pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), SkillmetaError> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SkillmetaError::at_path(parent, e))?;
    }
    let tmp = temp_path(target);
    let written = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(SkillmetaError::at_path(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(SkillmetaError::at_path(target, e));
    }
    tracing::debug!(path = %target.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Pretty JSON with a trailing newline.
pub fn write_json_atomic<T: serde::Serialize>(
    target: &Path,
    value: &T,
) -> Result<(), SkillmetaError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_atomic(target, text.as_bytes())
}
