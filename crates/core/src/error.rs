use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::PipelineStage;

/// Fatal scan failures. Per-entry access problems never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("scan root is not a directory: {}", path.display())]
    RootNotADirectory { path: PathBuf },

    #[error("scan root is unreadable: {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan cancelled by caller")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum DistributeError {
    #[error("distribution cancelled by caller")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Distribute(#[from] DistributeError),

    #[error("failed to spawn {stage:?} worker: {source}")]
    WorkerSpawn {
        stage: PipelineStage,
        #[source]
        source: io::Error,
    },

    #[error("{stage:?} worker panicked")]
    WorkerPanicked { stage: PipelineStage },
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Scan(ScanError::Cancelled)
                | PipelineError::Distribute(DistributeError::Cancelled)
        )
    }
}

/// Reason a single path could not be deleted.
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("trash error: {message}")]
    Trash { message: String },

    #[error("{source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
