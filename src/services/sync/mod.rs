//! Resynchronization planning for the visible window.
//!
//! The grid only ever holds records for ranges it has asked for. When the
//! visible date range scrolls outside previously-synced ground, the planner
//! hands out one padded fetch range and remembers it, so overlapping
//! window expansions while a fetch is still in flight do not trigger
//! redundant calls. A failed pass leaves coverage unchanged and is retried
//! the next time the range is needed, or immediately via [`ResyncPlanner::force`].

use chrono::{DateTime, Duration, Utc};
use log::warn;

use crate::models::settings::GridSettings;

/// Half-open UTC range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Order-normalizing constructor; swapped bounds are accepted.
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps_or_touches(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn merge(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn padded(&self, pad: Duration) -> TimeRange {
        TimeRange {
            start: self.start - pad,
            end: self.end + pad,
        }
    }
}

/// What the surrounding UI shows about background sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// At least one fetch is in flight.
    Syncing,
    /// The last pass failed. Loaded data stays interactive; the next
    /// eligible trigger retries.
    Failed { message: String },
}

/// Tracks synced coverage and in-flight fetches for one session.
#[derive(Debug)]
pub struct ResyncPlanner {
    synced: Vec<TimeRange>,
    requested: Vec<TimeRange>,
    pad: Duration,
    last_error: Option<String>,
}

impl ResyncPlanner {
    pub fn new(settings: &GridSettings) -> Self {
        Self {
            synced: Vec::new(),
            requested: Vec::new(),
            pad: Duration::days(settings.resync_pad_days.max(0)),
            last_error: None,
        }
    }

    /// Called whenever the visible range changes. Returns the padded range
    /// to fetch, or `None` when the range is already covered by synced
    /// ground or a fetch in flight.
    pub fn ensure_coverage(&mut self, visible: TimeRange) -> Option<TimeRange> {
        if self.covered(&visible) {
            return None;
        }
        let wanted = visible.padded(self.pad);
        self.requested.push(wanted);
        Some(wanted)
    }

    /// User-initiated sync: fetch the padded visible range even where it
    /// is already covered. Still deduplicated against fetches in flight.
    pub fn force(&mut self, visible: TimeRange) -> Option<TimeRange> {
        let wanted = visible.padded(self.pad);
        if coalesced(&self.requested)
            .iter()
            .any(|r| r.contains(&wanted))
        {
            return None;
        }
        self.requested.push(wanted);
        Some(wanted)
    }

    /// A fetch handed out earlier finished and its records were absorbed.
    pub fn complete(&mut self, range: TimeRange) {
        if !self.take_requested(&range) {
            warn!(
                "Sync completion for a range that was never requested: {} .. {}",
                range.start, range.end
            );
        }
        self.synced.push(range);
        self.synced = coalesced(&self.synced);
        self.last_error = None;
    }

    /// A fetch handed out earlier failed. Coverage is unchanged, so the
    /// next `ensure_coverage` for that window asks again.
    pub fn fail(&mut self, range: TimeRange, message: impl Into<String>) {
        let message = message.into();
        if !self.take_requested(&range) {
            warn!(
                "Sync failure for a range that was never requested: {} .. {}",
                range.start, range.end
            );
        }
        warn!("Background sync failed: {}", message);
        self.last_error = Some(message);
    }

    pub fn status(&self) -> SyncStatus {
        if !self.requested.is_empty() {
            return SyncStatus::Syncing;
        }
        match &self.last_error {
            Some(message) => SyncStatus::Failed {
                message: message.clone(),
            },
            None => SyncStatus::Idle,
        }
    }

    /// Coalesced ranges known to be synced.
    pub fn synced_spans(&self) -> &[TimeRange] {
        &self.synced
    }

    fn covered(&self, range: &TimeRange) -> bool {
        let mut union: Vec<TimeRange> = self.synced.clone();
        union.extend_from_slice(&self.requested);
        coalesced(&union).iter().any(|r| r.contains(range))
    }

    fn take_requested(&mut self, range: &TimeRange) -> bool {
        match self.requested.iter().position(|r| r == range) {
            Some(idx) => {
                self.requested.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Sorted, overlap-free copy of the given ranges. Touching ranges merge.
fn coalesced(ranges: &[TimeRange]) -> Vec<TimeRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if last.overlaps_or_touches(&range) => {
                *last = last.merge(&range);
            }
            _ => merged.push(range),
        }
    }
    merged
}
