pub mod aggregate;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod delete;
pub mod distribute;
pub mod doctor;
pub mod error;
pub mod model;
pub mod pipeline;
mod progress;
pub mod scan;
pub mod selection;
pub mod stats;

pub use aggregate::ResultAggregator;
pub use chunk::ChunkedSorter;
pub use classify::{extension_of, Classifier};
pub use config::{
    load_config, normalize_extension, ClassifierConfig, SorterConfig, DEFAULT_CHUNK_CAPACITY,
};
pub use delete::{delete_paths, delete_paths_with, DeletionBackend, PermanentBackend, TrashBackend};
pub use distribute::{distribute, distribute_with_callback, DistributeOptions};
pub use doctor::{collect_doctor_info, DoctorInfo};
pub use error::{DeleteError, DistributeError, PipelineError, ScanError};
pub use model::{
    Category, CategoryBuckets, CategoryCounts, DeletionFailure, DeletionMode, DeletionOutcome,
    DeletionRequest, DetailedRow, FileRecord, MediaRow, PipelineStage, ProgressEvent, ScanResult,
};
pub use pipeline::{run_pipeline, PipelineOutput};
pub use scan::{run_scan, run_scan_with_callback, run_scan_with_events, ScanOptions, ScanRunOutput};
pub use selection::{
    file_details, prepare_selection, summarize_selection, FileDetails, SelectionSummary,
};
pub use stats::{
    format_gigabytes, format_megabytes, group_thousands, render_deletion_summary,
    render_statistics_line,
};
