use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Image,
    Video,
    Document,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Image,
        Category::Video,
        Category::Document,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Document => "document",
            Category::Other => "other",
        }
    }

    /// Plural name used in statistics and selection summaries.
    pub fn label(self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Document => "Documents",
            Category::Other => "Other",
        }
    }
}

/// One discovered file. Never mutated after the scanner creates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    /// Lower-cased, with the leading `.`; empty when the name has no extension.
    pub extension: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

pub type CategoryCounts = BTreeMap<Category, u64>;

pub fn empty_counts() -> CategoryCounts {
    Category::ALL.iter().map(|category| (*category, 0)).collect()
}

/// Terminal output of one traversal.
///
/// `files` is sorted by name inside each chunk of the configured capacity, not
/// across chunk boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    pub files: Vec<FileRecord>,
    pub counts: CategoryCounts,
    pub total_size_bytes: u64,
}

impl Default for ScanResult {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            counts: empty_counts(),
            total_size_bytes: 0,
        }
    }
}

impl ScanResult {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn count(&self, category: Category) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailedRow {
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl From<&FileRecord> for DetailedRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            extension: record.extension.clone(),
            size_bytes: record.size_bytes,
            path: record.path.clone(),
        }
    }
}

/// Image and video rows drop the extension column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRow {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl From<&FileRecord> for MediaRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            size_bytes: record.size_bytes,
            path: record.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBuckets {
    pub all: Vec<DetailedRow>,
    pub images: Vec<MediaRow>,
    pub videos: Vec<MediaRow>,
    pub documents: Vec<DetailedRow>,
    pub other: Vec<DetailedRow>,
}

impl CategoryBuckets {
    pub fn len_for(&self, category: Category) -> usize {
        match category {
            Category::Image => self.images.len(),
            Category::Video => self.videos.len(),
            Category::Document => self.documents.len(),
            Category::Other => self.other.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    /// Move to the platform trash / recycle bin.
    Trash,
    /// Unlink with no recovery path.
    Permanent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionRequest {
    pub paths: Vec<PathBuf>,
    pub mode: DeletionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub mode: DeletionMode,
    /// Paths that still existed when the engine reached them.
    pub attempted: u64,
    pub failures: Vec<DeletionFailure>,
}

impl DeletionOutcome {
    pub fn succeeded(&self) -> u64 {
        self.attempted.saturating_sub(self.failures.len() as u64)
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Scanning,
    Distributing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    pub seq: u64,
    pub percent: u8,
    pub processed: u64,
    pub total: u64,
}
