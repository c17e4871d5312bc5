//! Scratch area for uploaded files.
//!
//! Layout: `<root>/<session_id>/<uuid>.pdf`. The root is wiped at startup, a
//! session's directory when the session is created and again when it is discarded.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WipeFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of a wipe. Failures are collected, never fatal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WipeReport {
    pub removed: usize,
    pub failures: Vec<WipeFailure>,
}

impl WipeReport {
    fn record_failure(&mut self, path: &Path, error: io::Error) {
        warn!("Failed to remove {}: {error}", path.display());
        self.failures.push(WipeFailure {
            path: path.display().to_string(),
            error: error.to_string(),
        });
    }
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Removes every entry directly under `dir`, one at a time.
/// A failed removal is recorded and the remaining entries are still removed.
/// A missing `dir` is an empty wipe.
fn wipe_entries<F>(dir: &Path, mut remove: F) -> WipeReport
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    let mut report = WipeReport::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            report.record_failure(dir, e);
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.record_failure(dir, e);
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        match remove(&path, is_dir) {
            Ok(()) => report.removed += 1,
            Err(e) => report.record_failure(&path, e),
        }
    }

    report
}

async fn wipe_dir(dir: PathBuf) -> WipeReport {
    let display = dir.display().to_string();
    match tokio::task::spawn_blocking(move || wipe_entries(&dir, remove_entry)).await {
        Ok(report) => report,
        Err(e) => WipeReport {
            removed: 0,
            failures: vec![WipeFailure {
                path: display,
                error: format!("wipe task failed: {e}"),
            }],
        },
    }
}

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.root.join(session_id.to_string())
    }

    /// Clears everything under the root. Called once at startup.
    pub async fn wipe_all(&self) -> WipeReport {
        let report = wipe_dir(self.root.clone()).await;
        info!(
            "Scratch area {} wiped: {} removed, {} failed",
            self.root.display(),
            report.removed,
            report.failures.len()
        );
        report
    }

    /// Empties (creating if needed) the directory for a new session.
    pub async fn prepare_session(&self, session_id: Uuid) -> io::Result<WipeReport> {
        let dir = self.session_dir(session_id);
        let report = wipe_dir(dir.clone()).await;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(report)
    }

    /// Removes a discarded session's directory and its contents.
    pub async fn remove_session(&self, session_id: Uuid) -> WipeReport {
        let dir = self.session_dir(session_id);
        let mut report = wipe_dir(dir.clone()).await;
        match tokio::fs::remove_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => report.record_failure(&dir, e),
        }
        report
    }

    /// Writes an uploaded file under the session's directory with a generated name.
    pub async fn store(&self, session_id: Uuid, data: &[u8]) -> io::Result<PathBuf> {
        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.pdf", Uuid::new_v4()));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }
}
