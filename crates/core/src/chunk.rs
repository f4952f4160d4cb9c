use crate::model::FileRecord;

/// Sorts records by name inside fixed-size chunks as they arrive.
///
/// Each full chunk is sorted (case-insensitive, stable) and appended to the
/// output; the trailing partial chunk is sorted on `finish`. Order across chunk
/// boundaries is discovery order, so the output is only globally sorted when
/// everything fits in one chunk.
#[derive(Debug)]
pub struct ChunkedSorter {
    capacity: usize,
    pending: Vec<FileRecord>,
    output: Vec<FileRecord>,
    flushed_chunks: u64,
}

impl ChunkedSorter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: Vec::with_capacity(capacity),
            output: Vec::new(),
            flushed_chunks: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` when this push completed and flushed a chunk.
    pub fn push(&mut self, record: FileRecord) -> bool {
        self.pending.push(record);
        if self.pending.len() >= self.capacity {
            self.flush();
            return true;
        }
        false
    }

    pub fn flushed_chunks(&self) -> u64 {
        self.flushed_chunks
    }

    pub fn finish(mut self) -> Vec<FileRecord> {
        if !self.pending.is_empty() {
            self.flush();
        }
        self.output
    }

    fn flush(&mut self) {
        self.pending
            .sort_by_cached_key(|record| record.name.to_lowercase());
        self.output.append(&mut self.pending);
        self.flushed_chunks += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::ChunkedSorter;
    use crate::model::FileRecord;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            extension: String::new(),
            size_bytes: 1,
            path: PathBuf::from("/data").join(name),
        }
    }

    fn names(records: &[FileRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn single_chunk_is_fully_sorted_case_insensitively() {
        let mut sorter = ChunkedSorter::new(10);
        for name in ["b.txt", "C.txt", "a.txt"] {
            sorter.push(record(name));
        }
        let out = sorter.finish();
        assert_eq!(names(&out), vec!["a.txt", "b.txt", "C.txt"]);
    }

    #[test]
    fn chunks_are_sorted_locally_not_globally() {
        let mut sorter = ChunkedSorter::new(2);
        for name in ["z", "y", "b", "a", "m"] {
            sorter.push(record(name));
        }
        let out = sorter.finish();
        // [y z] [a b] [m]: each chunk sorted, "z" before "a" across the boundary.
        assert_eq!(names(&out), vec!["y", "z", "a", "b", "m"]);
    }

    #[test]
    fn equal_keys_keep_discovery_order() {
        let mut sorter = ChunkedSorter::new(3);
        let mut first = record("Same");
        first.path = PathBuf::from("/one/Same");
        let mut second = record("same");
        second.path = PathBuf::from("/two/same");
        sorter.push(first);
        sorter.push(second);
        let out = sorter.finish();
        assert_eq!(out[0].path, PathBuf::from("/one/Same"));
        assert_eq!(out[1].path, PathBuf::from("/two/same"));
    }

    #[test]
    fn push_reports_chunk_flushes() {
        let mut sorter = ChunkedSorter::new(2);
        assert!(!sorter.push(record("a")));
        assert!(sorter.push(record("b")));
        assert_eq!(sorter.flushed_chunks(), 1);
    }

    #[test]
    fn zero_capacity_degrades_to_one() {
        let sorter = ChunkedSorter::new(0);
        assert_eq!(sorter.capacity(), 1);
    }
}
