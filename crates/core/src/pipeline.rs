use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::distribute::{distribute_with_callback, DistributeOptions};
use crate::error::PipelineError;
use crate::model::{CategoryBuckets, PipelineStage, ProgressEvent, ScanResult};
use crate::scan::{run_scan_with_callback, ScanOptions};

const PROGRESS_CHANNEL_BOUND: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineOutput {
    pub result: ScanResult,
    pub buckets: CategoryBuckets,
}

/// Scans on one worker, then distributes on a second worker once the scan
/// result is complete.
///
/// Progress from both workers reaches `on_event` on the calling thread through
/// a bounded channel; the stages never overlap.
pub fn run_pipeline<F>(
    options: &ScanOptions,
    mut on_event: F,
) -> Result<PipelineOutput, PipelineError>
where
    F: FnMut(ProgressEvent),
{
    let (tx, rx) = mpsc::sync_channel(PROGRESS_CHANNEL_BOUND);
    let scan_options = options.clone();
    let scanner = thread::Builder::new()
        .name("file-sorter-scan".to_string())
        .spawn(move || {
            run_scan_with_callback(&scan_options, |event| {
                let _ = tx.send(event);
            })
        })
        .map_err(|source| PipelineError::WorkerSpawn {
            stage: PipelineStage::Scanning,
            source,
        })?;

    for event in rx {
        on_event(event);
    }
    let result = scanner
        .join()
        .map_err(|_| PipelineError::WorkerPanicked {
            stage: PipelineStage::Scanning,
        })??;

    let (tx, rx) = mpsc::sync_channel(PROGRESS_CHANNEL_BOUND);
    let distribute_options = DistributeOptions::from(options);
    let distributor = thread::Builder::new()
        .name("file-sorter-distribute".to_string())
        .spawn(move || {
            let buckets = distribute_with_callback(&result, &distribute_options, |event| {
                let _ = tx.send(event);
            });
            buckets.map(|buckets| PipelineOutput { result, buckets })
        })
        .map_err(|source| PipelineError::WorkerSpawn {
            stage: PipelineStage::Distributing,
            source,
        })?;

    for event in rx {
        on_event(event);
    }
    let output = distributor
        .join()
        .map_err(|_| PipelineError::WorkerPanicked {
            stage: PipelineStage::Distributing,
        })??;

    Ok(output)
}
