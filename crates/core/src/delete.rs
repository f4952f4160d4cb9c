use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DeleteError;
use crate::model::{DeletionFailure, DeletionMode, DeletionOutcome, DeletionRequest};
use crate::selection::prepare_selection;

/// How a single path is removed.
pub trait DeletionBackend {
    fn mode(&self) -> DeletionMode;

    fn remove(&self, path: &Path) -> Result<(), DeleteError>;
}

/// Moves files to the platform trash.
pub struct TrashBackend;

impl DeletionBackend for TrashBackend {
    fn mode(&self) -> DeletionMode {
        DeletionMode::Trash
    }

    fn remove(&self, path: &Path) -> Result<(), DeleteError> {
        let target = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        trash::delete(&target).map_err(|err| DeleteError::Trash {
            message: err.to_string(),
        })
    }
}

pub struct PermanentBackend;

impl DeletionBackend for PermanentBackend {
    fn mode(&self) -> DeletionMode {
        DeletionMode::Permanent
    }

    fn remove(&self, path: &Path) -> Result<(), DeleteError> {
        fs::remove_file(path)?;
        Ok(())
    }
}

impl DeletionRequest {
    /// Applies selection-time filtering (dedupe, drop vanished paths).
    pub fn from_selection<I, P>(paths: I, mode: DeletionMode) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: prepare_selection(paths),
            mode,
        }
    }
}

pub fn delete_paths(request: &DeletionRequest) -> DeletionOutcome {
    match request.mode {
        DeletionMode::Trash => delete_paths_with(&TrashBackend, &request.paths),
        DeletionMode::Permanent => delete_paths_with(&PermanentBackend, &request.paths),
    }
}

/// Removes `paths` one at a time, in order.
///
/// Paths that no longer exist are omitted from `attempted`. A failed removal is
/// recorded and the batch continues; earlier removals are never rolled back.
pub fn delete_paths_with(backend: &dyn DeletionBackend, paths: &[PathBuf]) -> DeletionOutcome {
    let mut outcome = DeletionOutcome {
        mode: backend.mode(),
        attempted: 0,
        failures: Vec::new(),
    };

    for path in paths {
        if let Err(err) = fs::symlink_metadata(path) {
            if err.kind() == io::ErrorKind::NotFound {
                debug!("delete skipped, path vanished: {}", path.display());
                continue;
            }
        }

        outcome.attempted += 1;
        if let Err(err) = backend.remove(path) {
            warn!("failed to delete {}: {}", path.display(), err);
            outcome.failures.push(DeletionFailure {
                path: path.clone(),
                reason: err.to_string(),
            });
        }
    }

    info!(
        "deletion batch ({:?}): {} attempted, {} removed, {} failed",
        outcome.mode,
        outcome.attempted,
        outcome.succeeded(),
        outcome.failures.len()
    );
    outcome
}
