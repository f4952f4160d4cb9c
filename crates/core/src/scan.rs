use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::aggregate::ResultAggregator;
use crate::classify::{extension_of, Classifier};
use crate::config::{SorterConfig, DEFAULT_CHUNK_CAPACITY};
use crate::error::ScanError;
use crate::model::{FileRecord, PipelineStage, ProgressEvent, ScanResult};
use crate::progress::ProgressTracker;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub chunk_capacity: usize,
    pub classifier: Classifier,
    /// Checked at chunk boundaries. `None` means the scan always runs to
    /// completion or fails.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            classifier: Classifier::default(),
            cancel_flag: None,
        }
    }
}

impl ScanOptions {
    pub fn from_config(root: impl Into<PathBuf>, config: &SorterConfig) -> Self {
        Self {
            root: root.into(),
            chunk_capacity: config.chunk_capacity,
            classifier: Classifier::new(&config.classifier),
            cancel_flag: None,
        }
    }
}

pub struct ScanRunOutput {
    pub result: ScanResult,
    pub events: Vec<ProgressEvent>,
}

pub fn run_scan(options: &ScanOptions) -> Result<ScanResult, ScanError> {
    run_scan_with_callback(options, |_| {})
}

pub fn run_scan_with_events(options: &ScanOptions) -> Result<ScanRunOutput, ScanError> {
    let mut events = Vec::new();
    let result = run_scan_with_callback(options, |event| events.push(event))?;
    Ok(ScanRunOutput { result, events })
}

/// Walks `options.root` twice: once to count candidate files for the progress
/// denominator, once to build the inventory.
///
/// Entries that cannot be stat'ed are skipped without being counted; only an
/// unusable root fails the scan.
pub fn run_scan_with_callback<F>(
    options: &ScanOptions,
    mut on_event: F,
) -> Result<ScanResult, ScanError>
where
    F: FnMut(ProgressEvent),
{
    let started = Instant::now();
    let root = resolve_root(&options.root)?;
    if is_cancelled(options) {
        return Err(ScanError::Cancelled);
    }

    let total_files = candidate_entries(&root).count() as u64;
    let mut tracker = ProgressTracker::new(PipelineStage::Scanning, total_files);
    let mut aggregator = ResultAggregator::new(options.chunk_capacity);
    let mut skipped = 0_u64;

    for entry in candidate_entries(&root) {
        match read_record(&entry) {
            Some(record) => {
                let category = options.classifier.classify(&record.extension);
                let closed_chunk = aggregator.record(record, category);
                if closed_chunk && is_cancelled(options) {
                    info!("scan of {} cancelled by caller", root.display());
                    return Err(ScanError::Cancelled);
                }
            }
            None => skipped += 1,
        }
        on_event(tracker.advance());
    }

    let result = aggregator.finish();
    if let Some(event) = tracker.finish() {
        on_event(event);
    }

    info!(
        "scan complete: {} file(s), {} byte(s), {} skipped, {} ms ({})",
        result.file_count(),
        result.total_size_bytes,
        skipped,
        started.elapsed().as_millis(),
        root.display()
    );

    Ok(result)
}

fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ScanError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ScanError::RootUnreadable {
                path: root.to_path_buf(),
                source,
            })
        }
    };
    if !metadata.is_dir() {
        return Err(ScanError::RootNotADirectory {
            path: root.to_path_buf(),
        });
    }
    fs::read_dir(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()))
}

/// Every non-directory entry below `root`, in directory-listing order.
fn candidate_entries(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|item| match item {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("walk entry skipped: {err}");
                None
            }
        })
        .filter(|entry| entry.depth() > 0 && is_file_like(entry))
}

fn is_file_like(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return false;
    }
    if file_type.is_symlink() {
        // Links to directories are neither followed nor inventoried; dangling
        // links stay candidates and are skipped when their size is read.
        return !fs::metadata(entry.path())
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
    }
    true
}

fn read_record(entry: &DirEntry) -> Option<FileRecord> {
    let path = entry.path();
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => {
            debug!("skipping unreadable entry {}: {}", path.display(), err);
            return None;
        }
    };

    Some(FileRecord {
        name: entry.file_name().to_string_lossy().to_string(),
        extension: extension_of(path),
        size_bytes: metadata.len(),
        path: path.to_path_buf(),
    })
}

fn is_cancelled(options: &ScanOptions) -> bool {
    options
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}
