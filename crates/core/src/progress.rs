use crate::model::{PipelineStage, ProgressEvent};

/// Percent bookkeeping shared by the scanner and the distributor.
///
/// `processed` may overshoot `total` when files appear between the counting
/// pass and the main pass, and undershoot it when files vanish; emitted values
/// stay clamped to `0..=100` and never decrease.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    stage: PipelineStage,
    total: u64,
    processed: u64,
    last_percent: u8,
    seq: u64,
    reached_end: bool,
}

impl ProgressTracker {
    pub(crate) fn new(stage: PipelineStage, total: u64) -> Self {
        Self {
            stage,
            total,
            processed: 0,
            last_percent: 0,
            seq: 0,
            reached_end: false,
        }
    }

    pub(crate) fn advance(&mut self) -> ProgressEvent {
        self.processed = self.processed.saturating_add(1);
        let percent = if self.total == 0 {
            100
        } else {
            (self.processed.saturating_mul(100) / self.total).min(100) as u8
        };
        self.last_percent = self.last_percent.max(percent);
        self.event()
    }

    /// Returns the terminal 100 if it has not been emitted yet.
    pub(crate) fn finish(&mut self) -> Option<ProgressEvent> {
        if self.reached_end {
            return None;
        }
        self.last_percent = 100;
        Some(self.event())
    }

    fn event(&mut self) -> ProgressEvent {
        self.seq += 1;
        if self.last_percent == 100 {
            self.reached_end = true;
        }
        ProgressEvent {
            stage: self.stage,
            seq: self.seq,
            percent: self.last_percent,
            processed: self.processed,
            total: self.total,
        }
    }
}
