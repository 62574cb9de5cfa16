//! Typed cross-component signals.
//!
//! The detail panel and other surrounding chrome talk to the grid core
//! through these messages instead of ad hoc named events, so the boundary
//! is a closed enum the compiler checks. The bus is a plain queue: any
//! component publishes, the frame loop drains once per pass and routes.

use std::collections::VecDeque;

/// Requests exchanged between the grid core and the surrounding panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSignal {
    /// Show the event in the preview pane without opening an editor
    PreviewEvent { event_id: String },
    /// Open the full editor for the event
    EditEvent { event_id: String },
    /// Ask for the event to be deleted
    DeleteEvent { event_id: String },
    /// Pin or unpin the event in the detail panel
    TogglePin { event_id: String },
}

impl CalendarSignal {
    /// The event the signal is about.
    pub fn event_id(&self) -> &str {
        match self {
            Self::PreviewEvent { event_id }
            | Self::EditEvent { event_id }
            | Self::DeleteEvent { event_id }
            | Self::TogglePin { event_id } => event_id,
        }
    }
}

/// Single-threaded signal queue. Publish from anywhere that holds a
/// mutable handle; drain from the frame loop.
#[derive(Debug, Default)]
pub struct SignalBus {
    queue: VecDeque<CalendarSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, signal: CalendarSignal) {
        self.queue.push_back(signal);
    }

    /// Take everything published since the last drain, in publish order.
    pub fn drain(&mut self) -> Vec<CalendarSignal> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
