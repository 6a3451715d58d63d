use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Terminal outcome of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Downloaded and saved under `path` with sequence number `sequence`.
    Success { sequence: u64, path: PathBuf },
    /// Filtered out before any download attempt.
    Rejected,
    /// Download attempted but did not complete.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRecord {
    pub document_order: usize,
    pub source_url: String,
    pub outcome: Outcome,
}

impl DownloadRecord {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn sequence(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Success { sequence, .. } => Some(sequence),
            _ => None,
        }
    }
}

/// Result of one run, also returned alongside a fatal error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    /// Records in document order.
    pub records: Vec<DownloadRecord>,
    /// Wall-clock time since the results page was requested.
    pub elapsed: Duration,
    /// The run was stopped through its shutdown handle.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn downloaded(&self) -> u64 {
        self.records.iter().filter(|r| r.is_success()).count() as u64
    }

    pub fn rejected(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Rejected)
            .count() as u64
    }

    pub fn failed(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
            .count() as u64
    }

    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// `(count, elapsed seconds)` pair reported to the caller.
    #[inline]
    pub fn totals(&self) -> (u64, f64) {
        (self.downloaded(), self.elapsed_secs())
    }

    /// Saved files in sequence order.
    pub fn saved_files(&self) -> Vec<&PathBuf> {
        let mut saved: Vec<_> = self
            .records
            .iter()
            .filter_map(|r| match &r.outcome {
                Outcome::Success { sequence, path } => Some((*sequence, path)),
                _ => None,
            })
            .collect();
        saved.sort_by_key(|(seq, _)| *seq);
        saved.into_iter().map(|(_, path)| path).collect()
    }
}
