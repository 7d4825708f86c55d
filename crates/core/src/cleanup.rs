use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Authoritative list of the temporary artifacts created for one request.
///
/// Every staged file (upload, fetched copy, watermark copy) is registered
/// here at creation and deleted exactly once by `release`, which handlers
/// run on success and failure paths alike. Deletion errors are logged and
/// swallowed so cleanup never masks the original failure. If a scope is
/// dropped without being released, a blocking best-effort removal runs so
/// early returns cannot leak scratch files.
#[derive(Debug, Default)]
pub struct CleanupScope {
    paths: Vec<PathBuf>,
    released: bool,
}

impl CleanupScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Number of artifacts currently owned by this scope.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every registered artifact. Idempotent: a second call is a
    /// no-op, and missing files are not an error.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for path in self.paths.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed temporary artifact {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove temporary artifact {:?}: {}", path, e),
            }
        }
    }
}

impl Drop for CleanupScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in self.paths.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove temporary artifact {:?} on drop: {}", path, e);
                }
            }
        }
    }
}

/// True when `path` sits directly inside `dir`. Used by tests to attribute
/// leftovers to a request's scratch directory.
pub fn is_within(dir: &Path, path: &Path) -> bool {
    path.parent().map(|p| p == dir).unwrap_or(false)
}
