//! Optimistic move/resize resolution.
//!
//! A committed gesture never rewrites the timeline directly. Non-recurring
//! events dispatch a single-scope mutation immediately; recurring events
//! park the proposal behind a scope decision (this occurrence or the whole
//! series). Either way the new range is shown at once as a display overlay,
//! reverted on failure or cancellation, and dropped once the authoritative
//! record has caught up with it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use thiserror::Error;

use crate::models::event::EventRecord;
use crate::services::remote::EditScope;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("Event '{0}' already has a change in flight")]
    RecordBusy(String),

    #[error("Another scope decision is already pending")]
    DecisionPending,

    #[error("No scope decision is pending")]
    NothingPending,
}

/// Lifecycle of one optimistic patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPhase {
    /// Recurring target; the user has not picked an edit scope yet. The
    /// server has not been told anything.
    AwaitingScope,
    /// Mutation dispatched, completion not yet reported.
    InFlight,
    /// Mutation acknowledged; waiting for the authoritative record to
    /// reflect the new range.
    Converging,
}

/// Display-state override for one record, kept until the round trip is
/// confirmed. `prior_start`/`prior_end` are the last known server range
/// the UI falls back to on revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticPatch {
    pub event_id: String,
    pub prior_start: DateTime<Utc>,
    pub prior_end: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub phase: PatchPhase,
}

/// A move or resize of a recurring event awaiting the user's choice of
/// scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSeriesDecision {
    pub event_id: String,
    pub series_id: Option<String>,
    pub proposed_start: DateTime<Utc>,
    pub proposed_end: DateTime<Utc>,
}

/// A mutation ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedMutation {
    pub event_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub scope: EditScope,
}

/// What a committed gesture turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitAction {
    /// Dispatch now.
    Mutate(ScopedMutation),
    /// Recurring target; ask the user for a scope first.
    AwaitDecision(PendingSeriesDecision),
}

/// Tracks optimistic patches and the pending scope decision. One record
/// carries at most one live patch, which blocks further gestures on that
/// record until the first change resolves.
#[derive(Debug, Default)]
pub struct MoveResolver {
    patches: HashMap<String, OptimisticPatch>,
    pending: Option<PendingSeriesDecision>,
}

impl MoveResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the record has a live patch; a second conflicting
    /// gesture must not start until it resolves.
    pub fn is_locked(&self, event_id: &str) -> bool {
        self.patches.contains_key(event_id)
    }

    pub fn pending(&self) -> Option<&PendingSeriesDecision> {
        self.pending.as_ref()
    }

    pub fn patch_for(&self, event_id: &str) -> Option<&OptimisticPatch> {
        self.patches.get(event_id)
    }

    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    /// Resolve a committed move/resize into an action. Non-recurring
    /// records mutate immediately with single scope; recurring records
    /// surface a [`PendingSeriesDecision`] and hold the mutation back.
    pub fn commit(
        &mut self,
        record: &EventRecord,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CommitAction, MoveError> {
        if self.is_locked(&record.id) {
            return Err(MoveError::RecordBusy(record.id.clone()));
        }

        if record.is_recurring() {
            if self.pending.is_some() {
                return Err(MoveError::DecisionPending);
            }
            self.insert_patch(record, start, end, PatchPhase::AwaitingScope);
            let decision = PendingSeriesDecision {
                event_id: record.id.clone(),
                series_id: record.recurring_series_id.clone(),
                proposed_start: start,
                proposed_end: end,
            };
            self.pending = Some(decision.clone());
            Ok(CommitAction::AwaitDecision(decision))
        } else {
            self.insert_patch(record, start, end, PatchPhase::InFlight);
            Ok(CommitAction::Mutate(ScopedMutation {
                event_id: record.id.clone(),
                start,
                end,
                scope: EditScope::Single,
            }))
        }
    }

    /// The user picked a scope: release the held mutation and move the
    /// patch in flight.
    pub fn confirm_pending(&mut self, scope: EditScope) -> Result<ScopedMutation, MoveError> {
        let decision = self.pending.take().ok_or(MoveError::NothingPending)?;
        if let Some(patch) = self.patches.get_mut(&decision.event_id) {
            patch.phase = PatchPhase::InFlight;
        }
        Ok(ScopedMutation {
            event_id: decision.event_id,
            start: decision.proposed_start,
            end: decision.proposed_end,
            scope,
        })
    }

    /// The user backed out: drop the overlay so the last known server
    /// range shows again. Returns the reverted patch.
    pub fn cancel_pending(&mut self) -> Option<OptimisticPatch> {
        let decision = self.pending.take()?;
        self.patches.remove(&decision.event_id)
    }

    /// The mutation service reported completion for this record.
    pub fn mutation_resolved(&mut self, event_id: &str) {
        match self.patches.get_mut(event_id) {
            Some(patch) if patch.phase == PatchPhase::InFlight => {
                patch.phase = PatchPhase::Converging;
            }
            Some(patch) => {
                warn!(
                    "Ignoring mutation ack for event '{}' in phase {:?}",
                    event_id, patch.phase
                );
            }
            None => {
                warn!("Ignoring mutation ack for unknown event '{}'", event_id);
            }
        }
    }

    /// The mutation service reported failure: drop the overlay so the
    /// record springs back. Returns the reverted patch so the caller can
    /// tell the user what was undone.
    pub fn mutation_failed(&mut self, event_id: &str) -> Option<OptimisticPatch> {
        self.patches.remove(event_id)
    }

    /// Convergence check against a fresh authoritative list: a dispatched
    /// patch whose record now carries the optimistic range has completed
    /// its round trip and is dropped. Patches still awaiting a scope
    /// decision are exempt, since the server was never told about them.
    /// Returns the ids cleared.
    pub fn observe_authoritative(&mut self, records: &[EventRecord]) -> Vec<String> {
        let mut cleared = Vec::new();
        for record in records {
            let converged = self.patches.get(&record.id).map_or(false, |patch| {
                patch.phase != PatchPhase::AwaitingScope
                    && patch.start == record.start
                    && patch.end == record.end
            });
            if converged {
                self.patches.remove(&record.id);
                cleared.push(record.id.clone());
            }
        }
        cleared
    }

    /// Overlay live patches onto a display list. Only `start`/`end` are
    /// overridden; everything else stays authoritative.
    pub fn apply_to(&self, records: &mut [EventRecord]) {
        for record in records.iter_mut() {
            if let Some(patch) = self.patches.get(&record.id) {
                record.start = patch.start;
                record.end = patch.end;
            }
        }
    }

    fn insert_patch(
        &mut self,
        record: &EventRecord,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        phase: PatchPhase,
    ) {
        self.patches.insert(
            record.id.clone(),
            OptimisticPatch {
                event_id: record.id.clone(),
                prior_start: record.start,
                prior_end: record.end,
                start,
                end,
                phase,
            },
        );
    }
}
