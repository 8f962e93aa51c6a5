//! Crash-safe persistence of the snapshot document.
//!
//! The full document is written to a temp sibling, fsynced, then renamed over
//! the final path. The final path is never opened for writing, so readers see
//! either the previous document or the new one. A failure at any point before
//! the rename leaves the previous document untouched.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::WriteError;
use crate::models::Snapshot;

#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl SnapshotWriter {
    /// `tmp_path` defaults to a hidden sibling, `data/live.json` → `data/.live.json.tmp`.
    pub fn new(path: impl Into<PathBuf>, tmp_path: Option<PathBuf>) -> Self {
        let path = path.into();
        let tmp_path = tmp_path.unwrap_or_else(|| default_tmp_path(&path));
        SnapshotWriter { path, tmp_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Serialise, stage and atomically publish `snapshot`.
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), WriteError> {
        self.stage(snapshot)?.commit()
    }

    /// Write the document durably to the temp path without publishing it.
    pub fn stage(&self, snapshot: &Snapshot) -> Result<StagedSnapshot<'_>, WriteError> {
        let data = serde_json::to_vec(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| WriteError::io(parent, e))?;
            }
        }

        // From here on the guard removes the temp file if we bail out.
        let staged = StagedSnapshot {
            writer: self,
            committed: false,
        };
        {
            let mut file =
                File::create(&self.tmp_path).map_err(|e| WriteError::io(&self.tmp_path, e))?;
            file.write_all(&data)
                .map_err(|e| WriteError::io(&self.tmp_path, e))?;
            file.sync_all()
                .map_err(|e| WriteError::io(&self.tmp_path, e))?;
        }
        debug!("Staged {} bytes at {}", data.len(), self.tmp_path.display());
        Ok(staged)
    }
}

/// A fully written temp file awaiting the atomic rename.
///
/// Dropping it without `commit` discards the temp file and leaves the
/// published document as it was.
pub struct StagedSnapshot<'a> {
    writer: &'a SnapshotWriter,
    committed: bool,
}

impl StagedSnapshot<'_> {
    pub fn commit(mut self) -> Result<(), WriteError> {
        let SnapshotWriter { path, tmp_path } = self.writer;
        fs::rename(tmp_path, path).map_err(|e| WriteError::io(path, e))?;
        self.committed = true;
        sync_parent_dir(path);
        Ok(())
    }
}

impl Drop for StagedSnapshot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.writer.tmp_path);
        }
    }
}

fn default_tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot.json".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Persist the rename itself. Best-effort: a failed directory sync does not
/// undo a completed rename.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}
