//! Boundary to the external event store.
//!
//! The grid core consumes two remote contracts: a mutation service that
//! applies scoped event changes, and a range query whose raw results are
//! reconciled client-side. Every local mutation is additionally mirrored
//! to the external provider with the same scope. Implementations own
//! transport and queueing; the core sees plain dispatch results and stays
//! single-threaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::event::{EventDraft, EventPatch, EventRecord, EventSource};

/// Whether an edit touches one occurrence or the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    Single,
    Series,
}

impl EditScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Series => "series",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Mutation rejected: {0}")]
    Rejected(String),

    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown event id '{0}'")]
    UnknownEvent(String),
}

/// Source narrowing for the range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Only(EventSource),
}

impl SourceFilter {
    pub fn matches(&self, source: EventSource) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == source,
        }
    }
}

/// External event store the session talks to.
///
/// One method per remote operation; the caller decides sequencing. All
/// methods take `&mut self` so queue-backed implementations need no
/// interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait EventGateway {
    /// Create a new event from validated draft fields. Returns the stored
    /// record, id assigned.
    fn create_event(&mut self, draft: &EventDraft) -> Result<EventRecord, GatewayError>;

    /// Apply a partial update with the given scope.
    fn update_event(
        &mut self,
        id: &str,
        patch: &EventPatch,
        scope: EditScope,
    ) -> Result<(), GatewayError>;

    /// Delete an event with the given scope.
    fn delete_event(&mut self, id: &str, scope: EditScope) -> Result<(), GatewayError>;

    /// Apply a new start/end produced by a drag gesture.
    fn move_resize_event(
        &mut self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: EditScope,
    ) -> Result<(), GatewayError>;

    /// Mirror a local mutation to the external provider with the same
    /// scope.
    fn push_to_provider(&mut self, id: &str, scope: EditScope) -> Result<(), GatewayError>;

    /// Range query returning raw records for client-side reconciliation.
    fn list_events(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: SourceFilter,
    ) -> Result<Vec<EventRecord>, GatewayError>;
}
