use crate::model::{Category, DeletionMode, DeletionOutcome, ScanResult};

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Size column text, e.g. `10.00 MB`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

pub fn format_gigabytes(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GIB)
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_statistics_line(result: &ScanResult) -> String {
    let mut out = format!(
        "Directory Statistics: {} files ({})",
        group_thousands(result.file_count() as u64),
        format_gigabytes(result.total_size_bytes)
    );
    for category in Category::ALL {
        out.push_str(&format!(
            " | {}: {}",
            category.label(),
            group_thousands(result.count(category))
        ));
    }
    out
}

pub fn render_deletion_summary(outcome: &DeletionOutcome) -> String {
    if outcome.is_complete_success() {
        let verb = match outcome.mode {
            DeletionMode::Trash => "Moved to trash",
            DeletionMode::Permanent => "Deleted permanently",
        };
        return format!("{verb}: {} file(s).", outcome.succeeded());
    }

    let mut out = format!("Failed to delete {} file(s):\n", outcome.failures.len());
    for failure in &outcome.failures {
        out.push_str(&format!("{}: {}\n", failure.path.display(), failure.reason));
    }
    out
}
