use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use anyhow::Result;
use file_sorter_core::{
    delete_paths, run_pipeline, run_scan_with_events, Category, DeletionMode, DeletionRequest,
    FileRecord, PipelineStage, ScanError, ScanOptions,
};
use tempfile::TempDir;

const MB: u64 = 1024 * 1024;

fn sized_file(dir: &Path, name: &str, size: u64) -> Result<()> {
    // Sparse files keep the fixtures cheap regardless of size.
    File::create(dir.join(name))?.set_len(size)?;
    Ok(())
}

fn options(root: &Path, chunk_capacity: usize) -> ScanOptions {
    ScanOptions {
        root: root.to_path_buf(),
        chunk_capacity,
        ..ScanOptions::default()
    }
}

fn is_sorted_by_name(records: &[FileRecord]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].name.to_lowercase() <= pair[1].name.to_lowercase())
}

#[test]
fn three_file_scenario_is_sorted_and_counted() -> Result<()> {
    let temp = TempDir::new()?;
    sized_file(temp.path(), "b.txt", 10 * MB)?;
    sized_file(temp.path(), "a.jpg", 2 * MB)?;
    sized_file(temp.path(), "z.mp4", 50 * MB)?;

    let output = run_scan_with_events(&options(temp.path(), 100))?;
    let result = output.result;

    let names: Vec<&str> = result.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.txt", "z.mp4"]);
    assert_eq!(result.count(Category::Image), 1);
    assert_eq!(result.count(Category::Video), 1);
    assert_eq!(result.count(Category::Document), 1);
    assert_eq!(result.count(Category::Other), 0);
    assert_eq!(result.total_size_bytes, 62 * MB);
    Ok(())
}

#[test]
fn aggregate_invariants_hold() -> Result<()> {
    let temp = TempDir::new()?;
    let nested = temp.path().join("nested");
    fs::create_dir(&nested)?;
    for index in 0..37 {
        let dir = if index % 2 == 0 { temp.path() } else { nested.as_path() };
        let ext = ["jpg", "mov", "pdf", "log"][index % 4];
        sized_file(dir, &format!("file-{index}.{ext}"), index as u64 * 3)?;
    }

    let output = run_scan_with_events(&options(temp.path(), 8))?;
    let result = output.result;

    assert_eq!(result.counts.values().sum::<u64>(), result.files.len() as u64);
    assert_eq!(
        result.total_size_bytes,
        result.files.iter().map(|f| f.size_bytes).sum::<u64>()
    );
    let unique: HashSet<_> = result.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(unique.len(), result.files.len());

    let percents: Vec<u8> = output.events.iter().map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(percents.last(), Some(&100));
    Ok(())
}

#[test]
fn exactly_one_chunk_is_fully_sorted() -> Result<()> {
    let temp = TempDir::new()?;
    let capacity = 10;
    for index in (0..capacity).rev() {
        sized_file(temp.path(), &format!("item-{index:02}.dat"), 1)?;
    }

    let result = run_scan_with_events(&options(temp.path(), capacity))?.result;
    assert_eq!(result.files.len(), capacity);
    assert!(is_sorted_by_name(&result.files));
    Ok(())
}

#[test]
fn chunks_beyond_capacity_are_only_locally_sorted() -> Result<()> {
    let temp = TempDir::new()?;
    let capacity = 4;
    let total = 2 * capacity + 1;
    for index in 0..total {
        // Mixed case so a byte-wise sort would disagree with the name order.
        let name = if index % 2 == 0 {
            format!("Entry-{index:02}.txt")
        } else {
            format!("entry-{index:02}.txt")
        };
        sized_file(temp.path(), &name, 1)?;
    }

    let result = run_scan_with_events(&options(temp.path(), capacity))?.result;
    assert_eq!(result.files.len(), total);
    for chunk in result.files.chunks(capacity) {
        assert!(is_sorted_by_name(chunk));
    }
    Ok(())
}

#[test]
fn distribution_covers_every_record_once() -> Result<()> {
    let temp = TempDir::new()?;
    for name in ["one.png", "two.avi", "three.xlsx", "four", "five.tar.gz", "six.PDF"] {
        sized_file(temp.path(), name, 4)?;
    }

    let mut stages = Vec::new();
    let output = run_pipeline(&options(temp.path(), 2), |event| {
        stages.push((event.stage, event.percent))
    })?;
    let buckets = &output.buckets;

    assert_eq!(buckets.all.len(), output.result.files.len());
    let categorized = buckets.images.len()
        + buckets.videos.len()
        + buckets.documents.len()
        + buckets.other.len();
    assert_eq!(categorized, buckets.all.len());
    for category in Category::ALL {
        assert_eq!(
            buckets.len_for(category) as u64,
            output.result.count(category)
        );
    }

    let mut in_categories: Vec<_> = buckets
        .images
        .iter()
        .map(|row| row.path.clone())
        .chain(buckets.videos.iter().map(|row| row.path.clone()))
        .chain(buckets.documents.iter().map(|row| row.path.clone()))
        .chain(buckets.other.iter().map(|row| row.path.clone()))
        .collect();
    let mut in_all: Vec<_> = buckets.all.iter().map(|row| row.path.clone()).collect();
    in_categories.sort();
    in_all.sort();
    assert_eq!(in_categories, in_all);

    let all_order: Vec<_> = buckets.all.iter().map(|row| row.path.clone()).collect();
    let scan_order: Vec<_> = output.result.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(all_order, scan_order);

    assert_eq!(
        stages.last(),
        Some(&(PipelineStage::Distributing, 100))
    );
    Ok(())
}

#[test]
fn unreadable_root_returns_no_result() {
    let temp = TempDir::new().expect("tempdir");
    let err = run_scan_with_events(&options(&temp.path().join("absent"), 100))
        .err()
        .expect("scan fails");
    assert!(matches!(err, ScanError::RootNotFound { .. }));
}

#[cfg(unix)]
#[test]
fn root_without_read_permission_is_unreadable() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new()?;
    let root = temp.path().join("sealed");
    fs::create_dir(&root)?;
    sized_file(&root, "inside.txt", 3)?;
    fs::set_permissions(&root, fs::Permissions::from_mode(0o000))?;

    // Root can list the directory anyway.
    if fs::read_dir(&root).is_ok() {
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let outcome = run_scan_with_events(&options(&root, 100));
    fs::set_permissions(&root, fs::Permissions::from_mode(0o755))?;

    let err = outcome.err().expect("scan fails");
    assert!(matches!(err, ScanError::RootUnreadable { .. }));
    Ok(())
}

#[test]
fn delete_then_rescan_reflects_removal() -> Result<()> {
    let temp = TempDir::new()?;
    for name in ["keep.txt", "drop-1.jpg", "drop-2.jpg"] {
        sized_file(temp.path(), name, 5)?;
    }
    let before = run_scan_with_events(&options(temp.path(), 100))?.result;
    let doomed: Vec<_> = before
        .files
        .iter()
        .filter(|f| f.name.starts_with("drop"))
        .map(|f| f.path.clone())
        .collect();

    let outcome = delete_paths(&DeletionRequest::from_selection(
        doomed,
        DeletionMode::Permanent,
    ));
    assert_eq!(outcome.attempted, 2);
    assert!(outcome.is_complete_success());

    let after = run_scan_with_events(&options(temp.path(), 100))?.result;
    assert_eq!(after.files.len(), 1);
    assert_eq!(after.count(Category::Image), 0);
    assert_eq!(after.total_size_bytes, 5);
    Ok(())
}
