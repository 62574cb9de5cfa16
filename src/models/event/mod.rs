// Event record module
// One reconciled calendar occurrence, whatever producer it came from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer that placed an event on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Synced from the external calendar provider
    External,
    /// Placed by the task scheduler
    Task,
    /// Placed by the habit scheduler
    Habit,
    /// Created by hand in the grid
    Manual,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Task => "task",
            Self::Habit => "habit",
            Self::Manual => "manual",
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::External, Self::Task, Self::Habit, Self::Manual]
    }
}

/// Free/busy marker carried through from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyStatus {
    Free,
    Busy,
    Tentative,
}

impl Default for BusyStatus {
    fn default() -> Self {
        Self::Busy
    }
}

/// Provider visibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Default,
    Public,
    Private,
    Confidential,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Default
    }
}

/// One calendar occurrence as it arrives from a source or leaves reconciliation.
///
/// `recurrence_rule` is present only on the series-defining instance;
/// `recurring_series_id` is present on every instance of a series, the first
/// one included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub busy_status: BusyStatus,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Create a record with the required fields, validated.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: EventSource,
    ) -> Result<Self, String> {
        let record = Self {
            id: id.into(),
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            all_day: false,
            source,
            source_id: None,
            external_id: None,
            calendar_id: None,
            color: None,
            busy_status: BusyStatus::default(),
            visibility: Visibility::default(),
            recurrence_rule: None,
            recurring_series_id: None,
            last_synced_at: None,
            updated_at: None,
        };
        record.validate()?;
        Ok(record)
    }

    /// Create a builder for records with optional fields.
    pub fn builder() -> EventRecordBuilder {
        EventRecordBuilder::new()
    }

    /// Validate the record.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Event title cannot be empty".to_string());
        }

        if self.end <= self.start {
            return Err("Event end time must be after start time".to_string());
        }

        if let Some(ref color) = self.color {
            if !color.starts_with('#') || (color.len() != 7 && color.len() != 4) {
                return Err("Color must be in hex format (#RRGGBB or #RGB)".to_string());
            }
        }

        Ok(())
    }

    /// True when this occurrence belongs to a recurring series.
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some() || self.recurring_series_id.is_some()
    }

    /// Duration of the occurrence.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Freshness marker used to pick between duplicate copies of one
    /// occurrence: the later of the last sync pass and the last edit.
    /// Records with neither marker rank lowest.
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at.max(self.updated_at)
    }
}

/// Builder for event records.
pub struct EventRecordBuilder {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    all_day: bool,
    source: EventSource,
    source_id: Option<String>,
    external_id: Option<String>,
    calendar_id: Option<String>,
    color: Option<String>,
    busy_status: BusyStatus,
    visibility: Visibility,
    recurrence_rule: Option<String>,
    recurring_series_id: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl EventRecordBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            title: None,
            description: None,
            location: None,
            start: None,
            end: None,
            all_day: false,
            source: EventSource::Manual,
            source_id: None,
            external_id: None,
            calendar_id: None,
            color: None,
            busy_status: BusyStatus::default(),
            visibility: Visibility::default(),
            recurrence_rule: None,
            recurring_series_id: None,
            last_synced_at: None,
            updated_at: None,
        }
    }

    /// Explicit identity. When omitted, `build` generates a v4 UUID, which is
    /// how manually created entries get a client-side identity before the
    /// mutation round trip confirms them.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn source(mut self, source: EventSource) -> Self {
        self.source = source;
        self
    }

    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn busy_status(mut self, busy_status: BusyStatus) -> Self {
        self.busy_status = busy_status;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn recurrence_rule(mut self, rule: impl Into<String>) -> Self {
        self.recurrence_rule = Some(rule.into());
        self
    }

    pub fn recurring_series_id(mut self, series_id: impl Into<String>) -> Self {
        self.recurring_series_id = Some(series_id.into());
        self
    }

    pub fn last_synced_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_synced_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn build(self) -> Result<EventRecord, String> {
        let title = self.title.ok_or("Event title is required")?;
        let start = self.start.ok_or("Event start time is required")?;
        let end = self.end.ok_or("Event end time is required")?;
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let record = EventRecord {
            id,
            title,
            description: self.description,
            location: self.location,
            start,
            end,
            all_day: self.all_day,
            source: self.source,
            source_id: self.source_id,
            external_id: self.external_id,
            calendar_id: self.calendar_id,
            color: self.color,
            busy_status: self.busy_status,
            visibility: self.visibility,
            recurrence_rule: self.recurrence_rule,
            recurring_series_id: self.recurring_series_id,
            last_synced_at: self.last_synced_at,
            updated_at: self.updated_at,
        };

        record.validate()?;
        Ok(record)
    }
}

impl Default for EventRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Field set accepted by the create mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            all_day: false,
            color: None,
            recurrence_rule: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Event title cannot be empty".to_string());
        }
        if self.end <= self.start {
            return Err("Event end time must be after start time".to_string());
        }
        Ok(())
    }
}

/// Partial field set accepted by the update mutation. Unset fields are left
/// untouched by the mutation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.all_day.is_none()
            && self.color.is_none()
            && self.recurrence_rule.is_none()
    }

    /// Overwrite the record's fields with the set ones, leaving the rest
    /// untouched.
    pub fn apply_to(&self, record: &mut EventRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            record.location = Some(location.clone());
        }
        if let Some(start) = self.start {
            record.start = start;
        }
        if let Some(end) = self.end {
            record.end = end;
        }
        if let Some(all_day) = self.all_day {
            record.all_day = all_day;
        }
        if let Some(color) = &self.color {
            record.color = Some(color.clone());
        }
        if let Some(rule) = &self.recurrence_rule {
            record.recurrence_rule = Some(rule.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 14, 0, 0).unwrap()
    }

    fn sample_end() -> DateTime<Utc> {
        sample_start() + Duration::hours(1)
    }

    #[test]
    fn test_new_record_success() {
        let record =
            EventRecord::new("evt-1", "Standup", sample_start(), sample_end(), EventSource::Manual)
                .unwrap();

        assert_eq!(record.id, "evt-1");
        assert_eq!(record.title, "Standup");
        assert_eq!(record.source, EventSource::Manual);
        assert!(!record.all_day);
        assert!(!record.is_recurring());
    }

    #[test]
    fn test_new_record_empty_title() {
        let result =
            EventRecord::new("evt-1", "  ", sample_start(), sample_end(), EventSource::Manual);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), "Event title cannot be empty");
    }

    #[test]
    fn test_new_record_invalid_times() {
        let result = EventRecord::new(
            "evt-1",
            "Standup",
            sample_end(),
            sample_start(),
            EventSource::Manual,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_generates_uuid_when_id_missing() {
        let record = EventRecord::builder()
            .title("Dentist")
            .start(sample_start())
            .end(sample_end())
            .build()
            .unwrap();

        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_builder_with_optional_fields() {
        let record = EventRecord::builder()
            .id("prov-9")
            .title("Offsite")
            .description("Quarterly planning")
            .location("Lisbon")
            .start(sample_start())
            .end(sample_end())
            .source(EventSource::External)
            .external_id("ext-abc")
            .calendar_id("work")
            .color("#33B679")
            .busy_status(BusyStatus::Tentative)
            .visibility(Visibility::Private)
            .build()
            .unwrap();

        assert_eq!(record.external_id.as_deref(), Some("ext-abc"));
        assert_eq!(record.calendar_id.as_deref(), Some("work"));
        assert_eq!(record.busy_status, BusyStatus::Tentative);
        assert_eq!(record.visibility, Visibility::Private);
    }

    #[test]
    fn test_builder_missing_title() {
        let result = EventRecord::builder()
            .start(sample_start())
            .end(sample_end())
            .build();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), "Event title is required");
    }

    #[test]
    fn test_validate_invalid_color() {
        let mut record =
            EventRecord::new("evt-1", "Standup", sample_start(), sample_end(), EventSource::Task)
                .unwrap();
        record.color = Some("green".to_string());

        let result = record.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("hex format"));
    }

    #[test]
    fn test_validate_valid_short_color() {
        let mut record =
            EventRecord::new("evt-1", "Standup", sample_start(), sample_end(), EventSource::Task)
                .unwrap();
        record.color = Some("#3B6".to_string());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_is_recurring_via_rule_or_series_id() {
        let mut record =
            EventRecord::new("evt-1", "Gym", sample_start(), sample_end(), EventSource::Habit)
                .unwrap();
        assert!(!record.is_recurring());

        record.recurrence_rule = Some("FREQ=WEEKLY;BYDAY=MO".to_string());
        assert!(record.is_recurring());

        record.recurrence_rule = None;
        record.recurring_series_id = Some("series-7".to_string());
        assert!(record.is_recurring());
    }

    #[test]
    fn test_recency_prefers_later_marker() {
        let mut record =
            EventRecord::new("evt-1", "Standup", sample_start(), sample_end(), EventSource::External)
                .unwrap();
        assert_eq!(record.recency(), None);

        let synced = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let edited = Utc.with_ymd_and_hms(2026, 3, 9, 13, 0, 0).unwrap();
        record.last_synced_at = Some(synced);
        record.updated_at = Some(edited);

        assert_eq!(record.recency(), Some(edited));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let record = EventRecord::builder()
            .id("prov-1")
            .title("Sync")
            .start(sample_start())
            .end(sample_end())
            .source(EventSource::External)
            .external_id("abc")
            .build()
            .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"allDay\""));
        assert!(json.contains("\"externalId\""));
        assert!(json.contains("\"source\":\"external\""));

        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_draft_validation() {
        let draft = EventDraft::new("Lunch", sample_start(), sample_end());
        assert!(draft.validate().is_ok());

        let bad = EventDraft::new("", sample_start(), sample_end());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(EventPatch::default().is_empty());

        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..EventPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_apply_overwrites_only_set_fields() {
        let mut record = EventRecord::builder()
            .title("Lunch")
            .location("Cafe")
            .start(sample_start())
            .end(sample_end())
            .build()
            .unwrap();

        let patch = EventPatch {
            title: Some("Team lunch".to_string()),
            end: Some(sample_end() + Duration::minutes(30)),
            ..EventPatch::default()
        };
        patch.apply_to(&mut record);

        assert_eq!(record.title, "Team lunch");
        assert_eq!(record.end, sample_end() + Duration::minutes(30));
        assert_eq!(record.location.as_deref(), Some("Cafe"));
        assert_eq!(record.start, sample_start());
    }
}
