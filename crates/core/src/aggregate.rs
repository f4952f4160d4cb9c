use crate::chunk::ChunkedSorter;
use crate::model::{empty_counts, Category, CategoryCounts, FileRecord, ScanResult};

/// Running totals for one scan plus the chunked inventory being built.
#[derive(Debug)]
pub struct ResultAggregator {
    sorter: ChunkedSorter,
    counts: CategoryCounts,
    total_size_bytes: u64,
}

impl ResultAggregator {
    pub fn new(chunk_capacity: usize) -> Self {
        Self {
            sorter: ChunkedSorter::new(chunk_capacity),
            counts: empty_counts(),
            total_size_bytes: 0,
        }
    }

    /// Returns `true` when the record closed a chunk.
    pub fn record(&mut self, record: FileRecord, category: Category) -> bool {
        self.total_size_bytes = self.total_size_bytes.saturating_add(record.size_bytes);
        *self.counts.entry(category).or_insert(0) += 1;
        self.sorter.push(record)
    }

    pub fn finish(self) -> ScanResult {
        ScanResult {
            files: self.sorter.finish(),
            counts: self.counts,
            total_size_bytes: self.total_size_bytes,
        }
    }
}
