#![allow(dead_code)]

// Test fixtures - reusable records and a scriptable in-memory gateway
// Shared by the integration and property test binaries

use chrono::{DateTime, TimeZone, Utc};

use weekgrid::models::event::{EventDraft, EventPatch, EventRecord, EventSource};
use weekgrid::services::remote::{EditScope, EventGateway, GatewayError, SourceFilter};

/// Fixed instants inside the week of Monday 2026-03-09 (UTC).
pub mod instants {
    use super::*;

    /// Hour and minute on the Monday of the fixture week
    pub fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, hour, minute, 0).unwrap()
    }

    /// Hour and minute on an arbitrary day of March 2026
    pub fn march(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }
}

/// Record builders mirroring what the different producers emit.
pub mod records {
    use super::*;
    use chrono::Duration;

    /// A provider-synced meeting with a stable external id
    pub fn external_meeting(id: &str, external_id: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord::builder()
            .id(id)
            .title("Weekly standup")
            .start(start)
            .end(start + Duration::minutes(30))
            .source(EventSource::External)
            .external_id(external_id)
            .calendar_id("primary")
            .last_synced_at(instants::march(1, 0, 0))
            .build()
            .unwrap()
    }

    /// The same provider occurrence seen again through another sync pass,
    /// with drifted start and a fresher sync marker
    pub fn jittered_copy(of: &EventRecord, jitter_secs: i64, synced_at: DateTime<Utc>) -> EventRecord {
        let mut copy = of.clone();
        copy.id = format!("{}-copy", of.id);
        copy.start = of.start + Duration::seconds(jitter_secs);
        copy.end = of.end + Duration::seconds(jitter_secs);
        copy.last_synced_at = Some(synced_at);
        copy
    }

    /// A hand-placed block with no provider identity
    pub fn manual_block(id: &str, title: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord::builder()
            .id(id)
            .title(title)
            .start(start)
            .end(start + Duration::hours(1))
            .source(EventSource::Manual)
            .build()
            .unwrap()
    }

    /// One occurrence of a weekly recurring series
    pub fn series_occurrence(id: &str, series_id: &str, start: DateTime<Utc>) -> EventRecord {
        EventRecord::builder()
            .id(id)
            .title("Weekly standup")
            .start(start)
            .end(start + Duration::minutes(30))
            .source(EventSource::External)
            .external_id(id)
            .calendar_id("primary")
            .recurrence_rule("FREQ=WEEKLY;BYDAY=MO")
            .recurring_series_id(series_id)
            .build()
            .unwrap()
    }
}

/// In-memory event store implementing the gateway contract, with
/// scriptable one-shot failures and call recording.
pub struct FakeGateway {
    pub store: Vec<EventRecord>,
    pub fail_next_move: bool,
    pub fail_next_list: bool,
    pub move_calls: Vec<(String, EditScope)>,
    pub push_calls: Vec<(String, EditScope)>,
    next_id: u32,
}

impl FakeGateway {
    pub fn new(store: Vec<EventRecord>) -> Self {
        Self {
            store,
            fail_next_move: false,
            fail_next_list: false,
            move_calls: Vec::new(),
            push_calls: Vec::new(),
            next_id: 1,
        }
    }

    pub fn record(&self, id: &str) -> Option<&EventRecord> {
        self.store.iter().find(|r| r.id == id)
    }
}

impl EventGateway for FakeGateway {
    fn create_event(&mut self, draft: &EventDraft) -> Result<EventRecord, GatewayError> {
        let record = EventRecord::builder()
            .id(format!("created-{}", self.next_id))
            .title(draft.title.clone())
            .start(draft.start)
            .end(draft.end)
            .all_day(draft.all_day)
            .source(EventSource::Manual)
            .build()
            .map_err(GatewayError::Rejected)?;
        self.next_id += 1;
        self.store.push(record.clone());
        Ok(record)
    }

    fn update_event(
        &mut self,
        id: &str,
        patch: &EventPatch,
        _scope: EditScope,
    ) -> Result<(), GatewayError> {
        let Some(record) = self.store.iter_mut().find(|r| r.id == id) else {
            return Err(GatewayError::UnknownEvent(id.to_string()));
        };
        patch.apply_to(record);
        Ok(())
    }

    fn delete_event(&mut self, id: &str, scope: EditScope) -> Result<(), GatewayError> {
        let Some(target) = self.store.iter().find(|r| r.id == id).cloned() else {
            return Err(GatewayError::UnknownEvent(id.to_string()));
        };
        match (scope, &target.recurring_series_id) {
            (EditScope::Series, Some(series_id)) => {
                self.store
                    .retain(|r| r.recurring_series_id.as_deref() != Some(series_id.as_str()));
            }
            _ => self.store.retain(|r| r.id != id),
        }
        Ok(())
    }

    fn move_resize_event(
        &mut self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: EditScope,
    ) -> Result<(), GatewayError> {
        if self.fail_next_move {
            self.fail_next_move = false;
            return Err(GatewayError::Rejected("calendar is read-only".to_string()));
        }
        let Some(record) = self.store.iter_mut().find(|r| r.id == id) else {
            return Err(GatewayError::UnknownEvent(id.to_string()));
        };
        record.start = start;
        record.end = end;
        self.move_calls.push((id.to_string(), scope));
        Ok(())
    }

    fn push_to_provider(&mut self, id: &str, scope: EditScope) -> Result<(), GatewayError> {
        self.push_calls.push((id.to_string(), scope));
        Ok(())
    }

    fn list_events(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: SourceFilter,
    ) -> Result<Vec<EventRecord>, GatewayError> {
        if self.fail_next_list {
            self.fail_next_list = false;
            return Err(GatewayError::Unavailable("provider offline".to_string()));
        }
        Ok(self
            .store
            .iter()
            .filter(|r| r.start < end && r.end > start && filter.matches(r.source))
            .cloned()
            .collect())
    }
}
