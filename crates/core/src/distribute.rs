use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use tracing::info;

use crate::classify::Classifier;
use crate::config::DEFAULT_CHUNK_CAPACITY;
use crate::error::DistributeError;
use crate::model::{
    Category, CategoryBuckets, DetailedRow, MediaRow, PipelineStage, ProgressEvent, ScanResult,
};
use crate::progress::ProgressTracker;
use crate::scan::ScanOptions;

#[derive(Debug, Clone)]
pub struct DistributeOptions {
    pub chunk_capacity: usize,
    pub classifier: Classifier,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for DistributeOptions {
    fn default() -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            classifier: Classifier::default(),
            cancel_flag: None,
        }
    }
}

impl From<&ScanOptions> for DistributeOptions {
    fn from(options: &ScanOptions) -> Self {
        Self {
            chunk_capacity: options.chunk_capacity,
            classifier: options.classifier.clone(),
            cancel_flag: options.cancel_flag.clone(),
        }
    }
}

pub fn distribute(
    result: &ScanResult,
    options: &DistributeOptions,
) -> Result<CategoryBuckets, DistributeError> {
    distribute_with_callback(result, options, |_| {})
}

/// Fans every record into `all` plus exactly one category bucket, walking the
/// inventory in its existing order, one chunk at a time.
pub fn distribute_with_callback<F>(
    result: &ScanResult,
    options: &DistributeOptions,
    mut on_event: F,
) -> Result<CategoryBuckets, DistributeError>
where
    F: FnMut(ProgressEvent),
{
    let started = Instant::now();
    let mut tracker = ProgressTracker::new(PipelineStage::Distributing, result.files.len() as u64);
    let mut buckets = CategoryBuckets {
        all: Vec::with_capacity(result.files.len()),
        ..CategoryBuckets::default()
    };

    for chunk in result.files.chunks(options.chunk_capacity.max(1)) {
        if is_cancelled(options) {
            info!("distribution cancelled by caller");
            return Err(DistributeError::Cancelled);
        }

        for record in chunk {
            buckets.all.push(DetailedRow::from(record));
            match options.classifier.classify(&record.extension) {
                Category::Image => buckets.images.push(MediaRow::from(record)),
                Category::Video => buckets.videos.push(MediaRow::from(record)),
                Category::Document => buckets.documents.push(DetailedRow::from(record)),
                Category::Other => buckets.other.push(DetailedRow::from(record)),
            }
            on_event(tracker.advance());
        }
    }

    if let Some(event) = tracker.finish() {
        on_event(event);
    }

    info!(
        "distribution complete: {} row(s) (images {}, videos {}, documents {}, other {}) in {} ms",
        buckets.all.len(),
        buckets.images.len(),
        buckets.videos.len(),
        buckets.documents.len(),
        buckets.other.len(),
        started.elapsed().as_millis()
    );

    Ok(buckets)
}

fn is_cancelled(options: &DistributeOptions) -> bool {
    options
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}
