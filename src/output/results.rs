use parking_lot::Mutex;
use serde::Serialize;

use crate::probe::outcome::{BucketEntry, ProbeOutcome, StatusEntry};

/// Actionable findings, in the order they were recorded.
///
/// Serializes with the keys of the product's JSON export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultBuckets {
    #[serde(rename = "200")]
    pub open: Vec<String>,
    #[serde(rename = "3xx")]
    pub redirect: Vec<StatusEntry>,
    #[serde(rename = "4xx_forbid")]
    pub forbidden: Vec<StatusEntry>,
}

impl ResultBuckets {
    pub fn len(&self) -> usize {
        self.open.len() + self.redirect.len() + self.forbidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn redirect_lines(&self) -> Vec<String> {
        self.redirect.iter().map(ToString::to_string).collect()
    }

    pub fn forbidden_lines(&self) -> Vec<String> {
        self.forbidden.iter().map(ToString::to_string).collect()
    }
}

/// Per-class counters, including the classes that are never bucketed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub open: usize,
    pub redirect: usize,
    pub forbidden: usize,
    pub not_found: usize,
    pub transport_errors: usize,
    /// Subset of `transport_errors` caused by cancellation.
    pub cancelled: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.open + self.redirect + self.forbidden + self.not_found + self.transport_errors
    }
}

#[derive(Default)]
struct State {
    buckets: ResultBuckets,
    tally: Tally,
}

/// Append-only store shared by every probe task.
#[derive(Default)]
pub struct ResultAggregator {
    state: Mutex<State>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: BucketEntry) {
        let mut state = self.state.lock();
        match entry {
            BucketEntry::Open(url) => {
                state.tally.open += 1;
                state.buckets.open.push(url);
            }
            BucketEntry::Redirect(e) => {
                state.tally.redirect += 1;
                state.buckets.redirect.push(e);
            }
            BucketEntry::Forbidden(e) => {
                state.tally.forbidden += 1;
                state.buckets.forbidden.push(e);
            }
        }
    }

    /// Route an outcome to its bucket, or just count it.
    pub fn record(&self, outcome: &ProbeOutcome) {
        if let Some(entry) = outcome.bucket_entry() {
            self.append(entry);
            return;
        }
        let mut state = self.state.lock();
        match outcome {
            ProbeOutcome::NotFound { .. } => state.tally.not_found += 1,
            _ => {
                state.tally.transport_errors += 1;
                if outcome.is_cancelled() {
                    state.tally.cancelled += 1;
                }
            }
        }
    }

    /// Copy of the buckets. Meaningful once every probe has settled.
    pub fn snapshot(&self) -> ResultBuckets {
        self.state.lock().buckets.clone()
    }

    pub fn tally(&self) -> Tally {
        self.state.lock().tally
    }
}
