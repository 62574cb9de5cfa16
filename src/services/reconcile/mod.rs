//! Merges raw event records from every producer into one deduplicated,
//! time-ordered timeline.
//!
//! Reconciliation is a pure function of its input, so it can rerun on every
//! source change (a sync pass, an optimistic patch, a preview) without
//! ordering concerns. Running it twice gives the same timeline as running
//! it once.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::event::EventRecord;

mod grouping;

pub use grouping::display_calendar_key;

/// Counters from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub raw: usize,
    pub kept: usize,
    pub duplicates_dropped: usize,
}

/// Deduplicate and sort raw records into a display timeline.
pub fn reconcile(records: Vec<EventRecord>) -> Vec<EventRecord> {
    reconcile_counted(records).0
}

/// Like [`reconcile`], also reporting what was dropped.
///
/// Duplicate keys keep the copy with the larger `recency()`; on an exact
/// recency tie the record seen first wins, so reruns over identical input
/// cannot flip the survivor.
pub fn reconcile_counted(records: Vec<EventRecord>) -> (Vec<EventRecord>, ReconcileOutcome) {
    let raw = records.len();
    let mut survivors: HashMap<String, EventRecord> = HashMap::with_capacity(raw);
    let mut duplicates_dropped = 0usize;

    for record in records {
        match survivors.entry(dedupe_key(&record)) {
            Entry::Occupied(mut slot) => {
                duplicates_dropped += 1;
                if record.recency() > slot.get().recency() {
                    slot.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    let mut events: Vec<EventRecord> = survivors.into_values().collect();
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.id.cmp(&b.id))
    });

    let outcome = ReconcileOutcome {
        raw,
        kept: events.len(),
        duplicates_dropped,
    };
    (events, outcome)
}

/// Identity under which duplicate raw records collapse.
///
/// Provider records key on calendar, external id, and the start floored to
/// the minute; flooring absorbs sub-minute jitter between sync passes while
/// occurrences of one recurring rule (always more than a minute apart) stay
/// distinct. Records without a provider id fall back to a content key.
pub fn dedupe_key(record: &EventRecord) -> String {
    match &record.external_id {
        Some(external_id) => {
            let calendar = record.calendar_id.as_deref().unwrap_or("none");
            format!(
                "provider:{}:{}:{}",
                calendar,
                external_id,
                floor_to_minute_ms(record.start.timestamp_millis())
            )
        }
        None => {
            let source_id = record.source_id.as_deref().unwrap_or("none");
            format!(
                "fallback:{}:{}:{}:{}:{}",
                record.source.as_str(),
                source_id,
                record.start.timestamp_millis(),
                record.end.timestamp_millis(),
                record.title
            )
        }
    }
}

fn floor_to_minute_ms(ms: i64) -> i64 {
    ms.div_euclid(60_000) * 60_000
}
