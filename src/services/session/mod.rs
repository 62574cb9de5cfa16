//! Session orchestration: one instance per open calendar view.
//!
//! Owns the raw record store, the reconciled timeline, and the gesture,
//! move-resolution, sync-planning and signal components, and routes
//! between them. All remote work goes through the [`EventGateway`] handle
//! the caller passes in, so the session itself stays single-threaded and
//! fully testable with a mock store.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use thiserror::Error;

use crate::models::event::{EventDraft, EventPatch, EventRecord};
use crate::models::settings::GridSettings;
use crate::services::clock::TimeZoneClock;
use crate::services::interaction::{
    GestureOutcome, InteractionController, PointerMove, PointerPress, PreviewRange,
};
use crate::services::moves::{
    CommitAction, MoveError, MoveResolver, PendingSeriesDecision, ScopedMutation,
};
use crate::services::reconcile::{display_calendar_key, reconcile_counted, ReconcileOutcome};
use crate::services::recurrence::{describe_rule, infer_rule, parse_rule};
use crate::services::remote::{EditScope, EventGateway, GatewayError, SourceFilter};
use crate::services::signals::{CalendarSignal, SignalBus};
use crate::services::sync::{ResyncPlanner, SyncStatus, TimeRange};
use crate::utils::date::{overlaps_range, week_start};

/// Title given to events placed by a bare drag, before the user renames
/// them in the editor.
const DEFAULT_EVENT_TITLE: &str = "New event";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown event id '{0}'")]
    UnknownEvent(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// What the session did in response to a resolved gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureReaction {
    /// Click on an event body; a preview signal was published.
    Preview { event_id: String },
    /// Click on an empty slot.
    SlotClick {
        date: NaiveDate,
        instant: DateTime<Utc>,
    },
    /// A drag on empty space created this event.
    Created { event_id: String },
    /// Move/resize dispatched; the overlay shows the new range until the
    /// authoritative data catches up.
    MutationDispatched { event_id: String },
    /// Recurring target; the user must pick single or series.
    ScopePrompt(PendingSeriesDecision),
    /// The record already has a change in flight.
    Busy { event_id: String },
    /// The mutation failed; the display reverted to the last known range.
    MutationFailed { message: String },
}

/// One open calendar view over the week grid.
pub struct CalendarSession {
    settings: GridSettings,
    clock: TimeZoneClock,
    controller: InteractionController,
    resolver: MoveResolver,
    planner: ResyncPlanner,
    bus: SignalBus,
    raw: Vec<EventRecord>,
    timeline: Vec<EventRecord>,
    last_outcome: ReconcileOutcome,
    visible: Option<TimeRange>,
    pinned: HashSet<String>,
}

impl CalendarSession {
    pub fn new(settings: GridSettings) -> Self {
        let clock = TimeZoneClock::from_settings(&settings);
        let controller = InteractionController::new(&settings);
        let planner = ResyncPlanner::new(&settings);
        Self {
            settings,
            clock,
            controller,
            resolver: MoveResolver::new(),
            planner,
            bus: SignalBus::new(),
            raw: Vec::new(),
            timeline: Vec::new(),
            last_outcome: ReconcileOutcome::default(),
            visible: None,
            pinned: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn clock(&self) -> &TimeZoneClock {
        &self.clock
    }

    /// Reconciled, overlay-adjusted records for rendering, ordered by
    /// start time.
    pub fn events(&self) -> &[EventRecord] {
        &self.timeline
    }

    pub fn reconcile_outcome(&self) -> ReconcileOutcome {
        self.last_outcome
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.planner.status()
    }

    pub fn pending_decision(&self) -> Option<&PendingSeriesDecision> {
        self.resolver.pending()
    }

    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.bus
    }

    /// Take the signals published since the last drain.
    pub fn drain_signals(&mut self) -> Vec<CalendarSignal> {
        self.bus.drain()
    }

    /// UTC bounds of a grid day column, for the renderer building press
    /// targets.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        self.clock.day_bounds(date)
    }

    /// UTC range of the week containing the date, Monday through Sunday
    /// in the session zone. This is the window handed to
    /// [`CalendarSession::set_visible_range`] by a week view.
    pub fn week_range(&self, date: NaiveDate) -> TimeRange {
        let first = week_start(date);
        let (start, _) = self.clock.day_bounds(first);
        let (_, end) = self.clock.day_bounds(first + Duration::days(6));
        TimeRange::new(start, end)
    }

    /// Events overlapping one day column, in timeline order.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&EventRecord> {
        let (day_start, day_end) = self.clock.day_bounds(date);
        self.timeline
            .iter()
            .filter(|r| overlaps_range(r.start, r.end, day_start, day_end))
            .collect()
    }

    /// Events keyed by display calendar, for legend and color assignment.
    pub fn grouped_by_calendar(&self) -> BTreeMap<String, Vec<&EventRecord>> {
        let mut groups: BTreeMap<String, Vec<&EventRecord>> = BTreeMap::new();
        for record in &self.timeline {
            groups
                .entry(display_calendar_key(record))
                .or_default()
                .push(record);
        }
        groups
    }

    /// Human-readable cadence line for the detail panel. Falls back to
    /// inferring a rule from sibling occurrences when the record belongs
    /// to a series but carries no rule of its own.
    pub fn series_summary(&self, event_id: &str) -> Option<String> {
        let record = self.timeline.iter().find(|r| r.id == event_id)?;
        let anchor = self.clock.date_of(record.start);

        if let Some(rule) = &record.recurrence_rule {
            let spec = parse_rule(rule);
            return Some(describe_rule(
                spec.as_ref(),
                anchor,
                record.recurring_series_id.is_some(),
            ));
        }

        if let Some(series_id) = &record.recurring_series_id {
            let dates: Vec<NaiveDate> = self
                .timeline
                .iter()
                .filter(|r| r.recurring_series_id.as_deref() == Some(series_id.as_str()))
                .map(|r| self.clock.date_of(r.start))
                .collect();
            let inferred = infer_rule(&dates);
            let spec = inferred.as_deref().and_then(parse_rule);
            return Some(describe_rule(spec.as_ref(), anchor, true));
        }

        Some(describe_rule(None, anchor, false))
    }

    // ---- visible range and sync ----

    /// Called whenever the rendered date range changes. Fetches through
    /// the gateway when the range leaves synced ground; fetch failures
    /// surface through [`CalendarSession::sync_status`] without blocking
    /// anything already loaded.
    pub fn set_visible_range(&mut self, visible: TimeRange, gateway: &mut dyn EventGateway) {
        self.visible = Some(visible);
        if let Some(fetch) = self.planner.ensure_coverage(visible) {
            self.run_fetch(fetch, gateway);
        }
    }

    /// User-initiated sync of the current window, coverage or not.
    pub fn force_sync(&mut self, gateway: &mut dyn EventGateway) {
        let Some(visible) = self.visible else {
            return;
        };
        if let Some(fetch) = self.planner.force(visible) {
            self.run_fetch(fetch, gateway);
        }
    }

    fn run_fetch(&mut self, fetch: TimeRange, gateway: &mut dyn EventGateway) {
        match gateway.list_events(fetch.start, fetch.end, SourceFilter::All) {
            Ok(records) => {
                info!(
                    "Synced {} raw records for {} .. {}",
                    records.len(),
                    fetch.start,
                    fetch.end
                );
                self.raw
                    .retain(|r| r.start < fetch.start || r.start >= fetch.end);
                self.raw.extend(records);
                self.planner.complete(fetch);
                self.rebuild();
            }
            Err(err) => {
                self.planner.fail(fetch, err.to_string());
            }
        }
    }

    /// Absorb records handed in by a push-style producer (task placement,
    /// habit generation) without a gateway round trip. An incoming record
    /// replaces any raw record with the same id.
    pub fn ingest(&mut self, records: Vec<EventRecord>) {
        for record in records {
            match self.raw.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => *slot = record,
                None => self.raw.push(record),
            }
        }
        self.rebuild();
    }

    // ---- pointer input ----

    pub fn pointer_down(&mut self, press: PointerPress) {
        self.controller.pointer_down(press);
    }

    pub fn pointer_move(&mut self, movement: PointerMove) -> Option<PreviewRange> {
        self.controller.pointer_move(movement)
    }

    pub fn pointer_cancel(&mut self, pointer_id: u64) {
        self.controller.pointer_cancel(pointer_id);
    }

    pub fn drag_preview(&self) -> Option<PreviewRange> {
        self.controller.preview()
    }

    /// Resolve the active gesture and carry out what it asked for.
    pub fn pointer_up(
        &mut self,
        pointer_id: u64,
        gateway: &mut dyn EventGateway,
    ) -> Option<GestureReaction> {
        let outcome = self.controller.pointer_up(pointer_id)?;
        match outcome {
            GestureOutcome::Click {
                date,
                instant,
                event_id,
            } => Some(match event_id {
                Some(event_id) => {
                    self.bus.publish(CalendarSignal::PreviewEvent {
                        event_id: event_id.clone(),
                    });
                    GestureReaction::Preview { event_id }
                }
                None => GestureReaction::SlotClick { date, instant },
            }),
            GestureOutcome::CreateRange { start, end } => {
                let draft = EventDraft::new(DEFAULT_EVENT_TITLE, start, end);
                Some(match self.create_event(draft, gateway) {
                    Ok(record) => GestureReaction::Created {
                        event_id: record.id,
                    },
                    Err(err) => GestureReaction::MutationFailed {
                        message: format!("Failed to create event: {err}"),
                    },
                })
            }
            GestureOutcome::MoveRange {
                event_id,
                start,
                end,
            }
            | GestureOutcome::ResizeRange {
                event_id,
                start,
                end,
            } => Some(self.commit_range(event_id, start, end, gateway)),
        }
    }

    fn commit_range(
        &mut self,
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        gateway: &mut dyn EventGateway,
    ) -> GestureReaction {
        let Some(record) = self.timeline.iter().find(|r| r.id == event_id).cloned() else {
            warn!("Gesture committed against unknown event '{}'", event_id);
            return GestureReaction::MutationFailed {
                message: "The event is no longer on the calendar".to_string(),
            };
        };

        match self.resolver.commit(&record, start, end) {
            Ok(CommitAction::Mutate(mutation)) => self.dispatch_move(mutation, gateway),
            Ok(CommitAction::AwaitDecision(decision)) => {
                self.rebuild();
                GestureReaction::ScopePrompt(decision)
            }
            Err(MoveError::RecordBusy(id)) => GestureReaction::Busy { event_id: id },
            Err(err) => {
                warn!("Gesture on '{}' rejected: {}", event_id, err);
                GestureReaction::Busy { event_id }
            }
        }
    }

    // ---- scope decisions ----

    /// The user picked single or series for the pending decision.
    pub fn confirm_scope(
        &mut self,
        scope: EditScope,
        gateway: &mut dyn EventGateway,
    ) -> Option<GestureReaction> {
        match self.resolver.confirm_pending(scope) {
            Ok(mutation) => Some(self.dispatch_move(mutation, gateway)),
            Err(err) => {
                warn!("Scope confirmation ignored: {}", err);
                None
            }
        }
    }

    /// The user backed out of the pending decision; the display reverts.
    pub fn cancel_scope(&mut self) {
        if self.resolver.cancel_pending().is_some() {
            self.rebuild();
        }
    }

    fn dispatch_move(
        &mut self,
        mutation: ScopedMutation,
        gateway: &mut dyn EventGateway,
    ) -> GestureReaction {
        let ScopedMutation {
            event_id,
            start,
            end,
            scope,
        } = mutation;
        match gateway.move_resize_event(&event_id, start, end, scope) {
            Ok(()) => {
                mirror_to_provider(gateway, &event_id, scope);
                self.rebuild();
                GestureReaction::MutationDispatched { event_id }
            }
            Err(err) => {
                self.resolver.mutation_failed(&event_id);
                self.rebuild();
                GestureReaction::MutationFailed {
                    message: format!("Failed to save the new time: {err}"),
                }
            }
        }
    }

    // ---- mutation completion reports ----

    /// An asynchronously completing gateway acknowledged a dispatched
    /// move/resize. The overlay stays until a refresh carries the new
    /// range; gateways that complete inline can skip this and let the
    /// refresh clear the patch on its own.
    pub fn mutation_succeeded(&mut self, event_id: &str) {
        self.resolver.mutation_resolved(event_id);
    }

    /// A dispatched move/resize failed after the fact. The display springs
    /// back to the last known server range.
    pub fn mutation_failed(&mut self, event_id: &str, message: &str) -> Option<GestureReaction> {
        let reverted = self.resolver.mutation_failed(event_id)?;
        warn!(
            "Change to event '{}' failed after dispatch, reverting to {} .. {}: {}",
            event_id, reverted.prior_start, reverted.prior_end, message
        );
        self.rebuild();
        Some(GestureReaction::MutationFailed {
            message: format!("Failed to save the new time: {message}"),
        })
    }

    // ---- pinned events ----

    /// Flip an event's pinned flag and publish the signal. Returns the new
    /// state.
    pub fn toggle_pin(&mut self, event_id: &str) -> bool {
        let now_pinned = if self.pinned.remove(event_id) {
            false
        } else {
            self.pinned.insert(event_id.to_string());
            true
        };
        self.bus.publish(CalendarSignal::TogglePin {
            event_id: event_id.to_string(),
        });
        now_pinned
    }

    pub fn is_pinned(&self, event_id: &str) -> bool {
        self.pinned.contains(event_id)
    }

    // ---- direct mutations ----

    pub fn create_event(
        &mut self,
        draft: EventDraft,
        gateway: &mut dyn EventGateway,
    ) -> Result<EventRecord, SessionError> {
        draft.validate().map_err(SessionError::Validation)?;
        let record = gateway.create_event(&draft)?;
        mirror_to_provider(gateway, &record.id, EditScope::Single);
        self.raw.push(record.clone());
        self.rebuild();
        Ok(record)
    }

    pub fn update_event(
        &mut self,
        id: &str,
        patch: EventPatch,
        scope: EditScope,
        gateway: &mut dyn EventGateway,
    ) -> Result<(), SessionError> {
        if patch.is_empty() {
            return Ok(());
        }
        let Some(target) = self.raw.iter().find(|r| r.id == id).cloned() else {
            return Err(SessionError::UnknownEvent(id.to_string()));
        };
        gateway.update_event(id, &patch, scope)?;
        mirror_to_provider(gateway, id, scope);

        match (scope, &target.recurring_series_id) {
            (EditScope::Series, Some(series_id)) => {
                for record in self
                    .raw
                    .iter_mut()
                    .filter(|r| r.recurring_series_id.as_deref() == Some(series_id.as_str()))
                {
                    patch.apply_to(record);
                }
            }
            _ => {
                for record in self.raw.iter_mut().filter(|r| r.id == id) {
                    patch.apply_to(record);
                }
            }
        }
        self.rebuild();
        Ok(())
    }

    pub fn delete_event(
        &mut self,
        id: &str,
        scope: EditScope,
        gateway: &mut dyn EventGateway,
    ) -> Result<(), SessionError> {
        let Some(target) = self.raw.iter().find(|r| r.id == id).cloned() else {
            return Err(SessionError::UnknownEvent(id.to_string()));
        };
        gateway.delete_event(id, scope)?;
        mirror_to_provider(gateway, id, scope);

        match (scope, &target.recurring_series_id) {
            (EditScope::Series, Some(series_id)) => {
                self.raw
                    .retain(|r| r.recurring_series_id.as_deref() != Some(series_id.as_str()));
            }
            _ => self.raw.retain(|r| r.id != id),
        }
        self.rebuild();
        Ok(())
    }

    // ---- reconciliation ----

    fn rebuild(&mut self) {
        let (mut timeline, outcome) = reconcile_counted(self.raw.clone());
        if outcome.duplicates_dropped > 0 {
            debug!(
                "Reconciled {} raw records into {}, dropped {} duplicates",
                outcome.raw, outcome.kept, outcome.duplicates_dropped
            );
        }
        for id in self.resolver.observe_authoritative(&timeline) {
            debug!("Optimistic change on '{}' confirmed by refreshed data", id);
        }
        self.resolver.apply_to(&mut timeline);
        self.last_outcome = outcome;
        self.timeline = timeline;
    }
}

fn mirror_to_provider(gateway: &mut dyn EventGateway, id: &str, scope: EditScope) {
    if let Err(err) = gateway.push_to_provider(id, scope) {
        warn!(
            "Provider mirror for event '{}' failed, next sync will reconcile: {}",
            id, err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventSource;
    use crate::services::interaction::PressTarget;
    use crate::services::remote::MockEventGateway;
    use chrono::TimeZone;
    use mockall::predicate::always;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    fn session() -> CalendarSession {
        CalendarSession::new(GridSettings {
            time_zone: Some("UTC".to_string()),
            ..GridSettings::default()
        })
    }

    fn visible_week() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap(),
        )
    }

    fn plain_event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EventRecord {
        EventRecord::builder()
            .id(id)
            .title("Standup")
            .start(start)
            .end(end)
            .source(EventSource::Manual)
            .build()
            .unwrap()
    }

    fn recurring_event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EventRecord {
        EventRecord::builder()
            .id(id)
            .title("Standup")
            .start(start)
            .end(end)
            .source(EventSource::External)
            .external_id("ext-1")
            .calendar_id("work")
            .recurrence_rule("FREQ=WEEKLY;BYDAY=MO")
            .recurring_series_id("series-9")
            .build()
            .unwrap()
    }

    fn seed(session: &mut CalendarSession, records: Vec<EventRecord>) {
        let mut gateway = MockEventGateway::new();
        gateway
            .expect_list_events()
            .times(1)
            .returning(move |_, _, _| Ok(records.clone()));
        session.set_visible_range(visible_week(), &mut gateway);
    }

    fn drag(
        session: &mut CalendarSession,
        gateway: &mut MockEventGateway,
        target: PressTarget,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Option<GestureReaction> {
        session.pointer_down(PointerPress {
            pointer_id: 7,
            position: (50.0, 50.0),
            date: date(),
            instant: from,
            target,
        });
        session.pointer_move(PointerMove {
            pointer_id: 7,
            position: (50.0, 150.0),
            date: date(),
            instant: to,
        });
        session.pointer_up(7, gateway)
    }

    #[test]
    fn test_visible_range_fetches_once_until_coverage_moves() {
        let mut session = session();
        let mut gateway = MockEventGateway::new();
        gateway
            .expect_list_events()
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        session.set_visible_range(visible_week(), &mut gateway);
        session.set_visible_range(visible_week(), &mut gateway);
        assert_eq!(session.sync_status(), SyncStatus::Idle);
    }

    #[test]
    fn test_sync_failure_is_visible_and_retried() {
        let mut session = session();
        let mut gateway = MockEventGateway::new();
        gateway
            .expect_list_events()
            .times(1)
            .returning(|_, _, _| Err(GatewayError::Unavailable("offline".to_string())));
        gateway
            .expect_list_events()
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        session.set_visible_range(visible_week(), &mut gateway);
        assert!(matches!(session.sync_status(), SyncStatus::Failed { .. }));

        // same window triggers the retry; success clears the status
        session.set_visible_range(visible_week(), &mut gateway);
        assert_eq!(session.sync_status(), SyncStatus::Idle);
    }

    #[test]
    fn test_drag_create_dispatches_and_mirrors() {
        let mut session = session();
        let mut gateway = MockEventGateway::new();
        gateway.expect_create_event().times(1).returning(|draft| {
            Ok(EventRecord::builder()
                .id("evt-new")
                .title(draft.title.clone())
                .start(draft.start)
                .end(draft.end)
                .source(EventSource::Manual)
                .build()
                .unwrap())
        });
        gateway
            .expect_push_to_provider()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Ok(()));

        let reaction = drag(
            &mut session,
            &mut gateway,
            PressTarget::EmptyCell,
            at(10, 0),
            at(11, 0),
        );
        assert_eq!(
            reaction,
            Some(GestureReaction::Created {
                event_id: "evt-new".to_string()
            })
        );
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].title, "New event");
        assert_eq!(session.events()[0].start, at(10, 0));
        assert_eq!(session.events()[0].end, at(11, 0));
    }

    #[test]
    fn test_move_shows_overlay_until_data_converges() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_move_resize_event()
            .withf(|id, start, end, scope| {
                id == "evt-1"
                    && *start == Utc.with_ymd_and_hms(2026, 3, 9, 11, 0, 0).unwrap()
                    && *end == Utc.with_ymd_and_hms(2026, 3, 9, 11, 30, 0).unwrap()
                    && *scope == EditScope::Single
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));

        let reaction = drag(
            &mut session,
            &mut gateway,
            PressTarget::EventBody {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                end: at(10, 30),
            },
            at(10, 0),
            at(11, 0),
        );
        assert_eq!(
            reaction,
            Some(GestureReaction::MutationDispatched {
                event_id: "evt-1".to_string()
            })
        );
        // overlay already shows the new range
        assert_eq!(session.events()[0].start, at(11, 0));

        // refreshed data carries the new range; the patch clears and the
        // record unlocks for the next gesture
        let mut refresh_gateway = MockEventGateway::new();
        refresh_gateway
            .expect_list_events()
            .times(1)
            .returning(|_, _, _| Ok(vec![plain_event("evt-1", at(11, 0), at(11, 30))]));
        session.force_sync(&mut refresh_gateway);

        assert_eq!(session.events()[0].start, at(11, 0));
        let mut second = MockEventGateway::new();
        second
            .expect_move_resize_event()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        second
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));
        let reaction = drag(
            &mut session,
            &mut second,
            PressTarget::EventBody {
                event_id: "evt-1".to_string(),
                start: at(11, 0),
                end: at(11, 30),
            },
            at(11, 0),
            at(12, 0),
        );
        assert!(matches!(
            reaction,
            Some(GestureReaction::MutationDispatched { .. })
        ));
    }

    #[test]
    fn test_failed_move_reverts_with_message() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_move_resize_event()
            .times(1)
            .returning(|_, _, _, _| Err(GatewayError::Rejected("conflict".to_string())));

        let reaction = drag(
            &mut session,
            &mut gateway,
            PressTarget::EventBody {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                end: at(10, 30),
            },
            at(10, 0),
            at(11, 0),
        );
        assert!(matches!(
            reaction,
            Some(GestureReaction::MutationFailed { .. })
        ));
        assert_eq!(session.events()[0].start, at(10, 0));
    }

    #[test]
    fn test_recurring_resize_waits_for_scope() {
        let mut session = session();
        seed(
            &mut session,
            vec![recurring_event("evt-1", at(10, 0), at(10, 30))],
        );

        // no gateway expectations: nothing may be dispatched yet
        let mut gateway = MockEventGateway::new();
        let (_, day_end) = session.day_bounds(date());
        let reaction = drag(
            &mut session,
            &mut gateway,
            PressTarget::EndHandle {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                day_end,
            },
            at(10, 30),
            at(11, 30),
        );
        match reaction {
            Some(GestureReaction::ScopePrompt(decision)) => {
                assert_eq!(decision.event_id, "evt-1");
                assert_eq!(decision.proposed_end, at(11, 30));
            }
            other => panic!("Expected ScopePrompt, got {other:?}"),
        }
        assert!(session.pending_decision().is_some());
        // display shows the proposal while the decision is open
        assert_eq!(session.events()[0].end, at(11, 30));

        let mut confirm_gateway = MockEventGateway::new();
        confirm_gateway
            .expect_move_resize_event()
            .withf(|id, _, end, scope| {
                id == "evt-1"
                    && *end == Utc.with_ymd_and_hms(2026, 3, 9, 11, 30, 0).unwrap()
                    && *scope == EditScope::Series
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        confirm_gateway
            .expect_push_to_provider()
            .withf(|_, scope| *scope == EditScope::Series)
            .times(1)
            .returning(|_, _| Ok(()));

        let reaction = session.confirm_scope(EditScope::Series, &mut confirm_gateway);
        assert!(matches!(
            reaction,
            Some(GestureReaction::MutationDispatched { .. })
        ));
        assert!(session.pending_decision().is_none());
    }

    #[test]
    fn test_cancelled_scope_decision_reverts_display() {
        let mut session = session();
        seed(
            &mut session,
            vec![recurring_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        let (_, day_end) = session.day_bounds(date());
        drag(
            &mut session,
            &mut gateway,
            PressTarget::EndHandle {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                day_end,
            },
            at(10, 30),
            at(11, 30),
        );
        assert_eq!(session.events()[0].end, at(11, 30));

        session.cancel_scope();
        assert_eq!(session.events()[0].end, at(10, 30));
        assert!(session.pending_decision().is_none());
    }

    #[test]
    fn test_second_gesture_on_in_flight_record_is_busy() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_move_resize_event()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));

        let target = PressTarget::EventBody {
            event_id: "evt-1".to_string(),
            start: at(10, 0),
            end: at(10, 30),
        };
        drag(
            &mut session,
            &mut gateway,
            target.clone(),
            at(10, 0),
            at(11, 0),
        );

        // no convergence yet, the record is still locked
        let reaction = drag(&mut session, &mut gateway, target, at(11, 0), at(12, 0));
        assert_eq!(
            reaction,
            Some(GestureReaction::Busy {
                event_id: "evt-1".to_string()
            })
        );
    }

    #[test]
    fn test_click_on_event_publishes_preview_signal() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        session.pointer_down(PointerPress {
            pointer_id: 3,
            position: (40.0, 40.0),
            date: date(),
            instant: at(10, 15),
            target: PressTarget::EventBody {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                end: at(10, 30),
            },
        });
        let reaction = session.pointer_up(3, &mut gateway);

        assert_eq!(
            reaction,
            Some(GestureReaction::Preview {
                event_id: "evt-1".to_string()
            })
        );
        assert_eq!(
            session.drain_signals(),
            vec![CalendarSignal::PreviewEvent {
                event_id: "evt-1".to_string()
            }]
        );
    }

    #[test]
    fn test_gesture_on_vanished_event_reports_failure() {
        let mut session = session();
        let mut gateway = MockEventGateway::new();

        let reaction = drag(
            &mut session,
            &mut gateway,
            PressTarget::EventBody {
                event_id: "ghost".to_string(),
                start: at(10, 0),
                end: at(10, 30),
            },
            at(10, 0),
            at(11, 0),
        );
        assert!(matches!(
            reaction,
            Some(GestureReaction::MutationFailed { .. })
        ));
    }

    #[test]
    fn test_series_summary_formats_rule() {
        let mut session = session();
        seed(
            &mut session,
            vec![recurring_event("evt-1", at(10, 0), at(10, 30))],
        );

        assert_eq!(
            session.series_summary("evt-1").as_deref(),
            Some("Every week on Mon")
        );
    }

    #[test]
    fn test_series_summary_infers_when_rule_is_missing() {
        let mut session = session();
        let mut occurrences = Vec::new();
        for day in [2, 9, 16] {
            let start = Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap();
            let end = start + chrono::Duration::minutes(30);
            occurrences.push(
                EventRecord::builder()
                    .id(format!("occ-{day}"))
                    .title("Standup")
                    .start(start)
                    .end(end)
                    .source(EventSource::External)
                    .external_id(format!("ext-{day}"))
                    .recurring_series_id("series-9")
                    .build()
                    .unwrap(),
            );
        }
        seed(&mut session, occurrences);

        assert_eq!(
            session.series_summary("occ-9").as_deref(),
            Some("Every week on Mon")
        );
    }

    #[test]
    fn test_delete_series_removes_all_occurrences() {
        let mut session = session();
        let series: Vec<EventRecord> = [2, 9]
            .iter()
            .map(|day| {
                let start = Utc.with_ymd_and_hms(2026, 3, *day, 10, 0, 0).unwrap();
                EventRecord::builder()
                    .id(format!("occ-{day}"))
                    .title("Standup")
                    .start(start)
                    .end(start + chrono::Duration::minutes(30))
                    .source(EventSource::External)
                    .external_id(format!("ext-{day}"))
                    .recurring_series_id("series-9")
                    .build()
                    .unwrap()
            })
            .collect();
        seed(&mut session, series);
        assert_eq!(session.events().len(), 2);

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_delete_event()
            .withf(|id, scope| id == "occ-2" && *scope == EditScope::Series)
            .times(1)
            .returning(|_, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));

        session
            .delete_event("occ-2", EditScope::Series, &mut gateway)
            .unwrap();
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_update_patch_applies_locally_after_dispatch() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_update_event()
            .times(1)
            .returning(|_, _, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));

        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..EventPatch::default()
        };
        session
            .update_event("evt-1", patch, EditScope::Single, &mut gateway)
            .unwrap();
        assert_eq!(session.events()[0].title, "Renamed");
    }

    #[test]
    fn test_week_range_spans_monday_through_sunday() {
        let session = session();
        let range = session.week_range(NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_events_on_filters_by_day_column() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        assert_eq!(session.events_on(date()).len(), 1);
        assert!(session
            .events_on(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
            .is_empty());
    }

    #[test]
    fn test_grouped_by_calendar_splits_sources() {
        let mut session = session();
        let external = recurring_event("evt-1", at(10, 0), at(10, 30));
        let manual = plain_event("evt-2", at(12, 0), at(12, 30));
        seed(&mut session, vec![external, manual]);

        let groups = session.grouped_by_calendar();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains_key("default"));
        assert!(groups.contains_key("manual"));
    }

    #[test]
    fn test_toggle_pin_flips_state_and_publishes() {
        let mut session = session();
        assert!(session.toggle_pin("evt-1"));
        assert!(session.is_pinned("evt-1"));
        assert!(!session.toggle_pin("evt-1"));
        assert!(!session.is_pinned("evt-1"));

        assert_eq!(
            session.drain_signals(),
            vec![
                CalendarSignal::TogglePin {
                    event_id: "evt-1".to_string()
                },
                CalendarSignal::TogglePin {
                    event_id: "evt-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_ingest_upserts_by_id() {
        let mut session = session();
        session.ingest(vec![plain_event("evt-1", at(10, 0), at(10, 30))]);
        assert_eq!(session.events().len(), 1);

        // a replacement placement for the same id, plus a new record
        session.ingest(vec![
            plain_event("evt-1", at(14, 0), at(14, 30)),
            plain_event("evt-2", at(9, 0), at(9, 30)),
        ]);
        assert_eq!(session.events().len(), 2);
        assert_eq!(session.events()[1].id, "evt-1");
        assert_eq!(session.events()[1].start, at(14, 0));
    }

    #[test]
    fn test_late_failure_report_reverts_display() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_move_resize_event()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));
        drag(
            &mut session,
            &mut gateway,
            PressTarget::EventBody {
                event_id: "evt-1".to_string(),
                start: at(10, 0),
                end: at(10, 30),
            },
            at(10, 0),
            at(11, 0),
        );
        assert_eq!(session.events()[0].start, at(11, 0));

        let reaction = session.mutation_failed("evt-1", "quota exceeded");
        match reaction {
            Some(GestureReaction::MutationFailed { message }) => {
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("Expected MutationFailed, got {other:?}"),
        }
        assert_eq!(session.events()[0].start, at(10, 0));

        // a second report has nothing left to revert
        assert_eq!(session.mutation_failed("evt-1", "again"), None);
    }

    #[test]
    fn test_ack_keeps_record_locked_until_refresh() {
        let mut session = session();
        seed(
            &mut session,
            vec![plain_event("evt-1", at(10, 0), at(10, 30))],
        );

        let mut gateway = MockEventGateway::new();
        gateway
            .expect_move_resize_event()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        gateway
            .expect_push_to_provider()
            .times(1)
            .returning(|_, _| Ok(()));
        let target = PressTarget::EventBody {
            event_id: "evt-1".to_string(),
            start: at(10, 0),
            end: at(10, 30),
        };
        drag(
            &mut session,
            &mut gateway,
            target.clone(),
            at(10, 0),
            at(11, 0),
        );
        session.mutation_succeeded("evt-1");

        // acknowledged but not yet reflected in a refresh: still locked
        let reaction = drag(&mut session, &mut gateway, target, at(11, 0), at(12, 0));
        assert_eq!(
            reaction,
            Some(GestureReaction::Busy {
                event_id: "evt-1".to_string()
            })
        );
    }
}
