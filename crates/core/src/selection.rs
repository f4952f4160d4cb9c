use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::classify::{extension_of, Classifier};
use crate::model::{empty_counts, Category, CategoryCounts};
use crate::stats::format_megabytes;

/// A path counts as present while the entry itself exists, dangling symlinks
/// included. Deletion uses the same test.
fn is_present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// De-duplicates a selection (first occurrence wins) and drops paths that no
/// longer exist.
pub fn prepare_selection<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(Into::into)
        .filter(|path| seen.insert(path.clone()))
        .filter(|path| is_present(path))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Distinct entries in the selection, existing or not.
    pub selected: usize,
    pub existing: Vec<PathBuf>,
    pub counts: CategoryCounts,
    pub total_size_bytes: u64,
    /// Set when every existing entry shares one category.
    pub uniform_category: Option<Category>,
}

pub fn summarize_selection<I, P>(paths: I, classifier: &Classifier) -> SelectionSummary
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut seen = HashSet::new();
    let mut existing = Vec::new();
    let mut counts = empty_counts();
    let mut total_size_bytes = 0_u64;

    for path in paths.into_iter().map(Into::into) {
        if !seen.insert(path.clone()) {
            continue;
        }
        let Ok(link_metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        let size = fs::metadata(&path).unwrap_or(link_metadata).len();
        *counts.entry(classifier.classify_path(&path)).or_insert(0) += 1;
        total_size_bytes = total_size_bytes.saturating_add(size);
        existing.push(path);
    }

    let mut present = counts.iter().filter(|(_, count)| **count > 0);
    let uniform_category = match (present.next(), present.next()) {
        (Some((category, _)), None) => Some(*category),
        _ => None,
    };

    SelectionSummary {
        selected: seen.len(),
        existing,
        counts,
        total_size_bytes,
        uniform_category,
    }
}

/// What the detail panel shows for a single selected file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDetails {
    pub name: String,
    pub path: PathBuf,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub modified: Option<String>,
    pub size_bytes: u64,
    pub size_text: String,
    pub extension: String,
    pub category: Category,
}

/// `None` when the file (or a symlink's target) is gone.
pub fn file_details(path: &Path, classifier: &Classifier) -> Option<FileDetails> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok().map(|time| {
        DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    });
    let extension = extension_of(path);

    Some(FileDetails {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        modified,
        size_bytes: metadata.len(),
        size_text: format_megabytes(metadata.len()),
        category: classifier.classify(&extension),
        extension,
    })
}
