//! Pointer-driven gesture state machine for the week grid: drag to create,
//! drag to move, and drag to resize, with snapping and a movement threshold
//! separating clicks from drags.
//!
//! One controller instance serves one grid region and holds the whole
//! gesture state itself, so several calendar instances can coexist and
//! gestures stay deterministic under test. The renderer translates raw
//! pointer events into grid coordinates (day column, instant under the
//! cursor, what was hit) and feeds them in; nothing here blocks or awaits.

mod snap;

pub use snap::{is_on_step, snap_to_step, snapped_range};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::settings::GridSettings;

/// What sat under the pointer when it went down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressTarget {
    /// An empty slot. Dragging creates a new event.
    EmptyCell,
    /// The body of an existing event. Dragging moves it, keeping its
    /// duration.
    EventBody {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The bottom handle of an existing event. Dragging adjusts its end,
    /// never below one step past the start and never past the end of the
    /// containing day.
    EndHandle {
        event_id: String,
        start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    },
}

impl PressTarget {
    fn kind(&self) -> GestureKind {
        match self {
            Self::EmptyCell => GestureKind::Create,
            Self::EventBody { .. } => GestureKind::Move,
            Self::EndHandle { .. } => GestureKind::Resize,
        }
    }

    fn event_id(&self) -> Option<&str> {
        match self {
            Self::EmptyCell => None,
            Self::EventBody { event_id, .. } | Self::EndHandle { event_id, .. } => {
                Some(event_id)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Create,
    Move,
    Resize,
}

/// A pointer press in grid coordinates.
#[derive(Debug, Clone)]
pub struct PointerPress {
    pub pointer_id: u64,
    pub position: (f32, f32),
    pub date: NaiveDate,
    pub instant: DateTime<Utc>,
    pub target: PressTarget,
}

/// A pointer movement in grid coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerMove {
    pub pointer_id: u64,
    pub position: (f32, f32),
    pub date: NaiveDate,
    pub instant: DateTime<Utc>,
}

/// The snapped overlay range shown while a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// What a resolved gesture asks the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The pointer never travelled past the threshold: open details
    /// rather than mutate anything.
    Click {
        date: NaiveDate,
        instant: DateTime<Utc>,
        event_id: Option<String>,
    },
    CreateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    MoveRange {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    ResizeRange {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// In-progress gesture. Created on pointer-down, mutated on pointer-move,
/// consumed on pointer-up or discarded on pointer-cancel.
#[derive(Debug, Clone)]
struct DragState {
    target: PressTarget,
    pointer_id: u64,
    origin_position: (f32, f32),
    origin_instant: DateTime<Utc>,
    current_instant: DateTime<Utc>,
    target_date: NaiveDate,
    moved_past_threshold: bool,
}

/// Gesture state machine for one grid region.
pub struct InteractionController {
    step: Duration,
    threshold_px: f32,
    drag: Option<DragState>,
}

impl InteractionController {
    pub fn new(settings: &GridSettings) -> Self {
        Self {
            step: Duration::minutes(i64::from(settings.snap_step_minutes)),
            threshold_px: settings.drag_threshold_px,
            drag: None,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    pub fn active_kind(&self) -> Option<GestureKind> {
        self.drag.as_ref().map(|d| d.target.kind())
    }

    /// Arm a gesture. Ignored while another gesture is active, whatever
    /// pointer it came from; the region accepts one gesture at a time.
    pub fn pointer_down(&mut self, press: PointerPress) {
        if self.drag.is_some() {
            return;
        }
        let origin_instant = snap_to_step(press.instant, self.step);
        self.drag = Some(DragState {
            target: press.target,
            pointer_id: press.pointer_id,
            origin_position: press.position,
            origin_instant,
            current_instant: origin_instant,
            target_date: press.date,
            moved_past_threshold: false,
        });
    }

    /// Track movement. Events from a pointer other than the one that armed
    /// the gesture are ignored. Returns the preview overlay once the
    /// pointer has travelled past the click threshold.
    pub fn pointer_move(&mut self, movement: PointerMove) -> Option<PreviewRange> {
        {
            let drag = self.drag.as_mut()?;
            if drag.pointer_id != movement.pointer_id {
                return None;
            }
            drag.current_instant = movement.instant;
            drag.target_date = movement.date;
            if !drag.moved_past_threshold
                && past_threshold(drag.origin_position, movement.position, self.threshold_px)
            {
                drag.moved_past_threshold = true;
            }
        }
        self.preview()
    }

    /// The overlay for the gesture in progress, if it has become a drag.
    pub fn preview(&self) -> Option<PreviewRange> {
        let drag = self.drag.as_ref()?;
        if drag.moved_past_threshold {
            Some(self.preview_of(drag))
        } else {
            None
        }
    }

    /// Resolve the gesture. A press that never travelled past the
    /// threshold resolves to a click; anything else commits the final
    /// snapped range.
    pub fn pointer_up(&mut self, pointer_id: u64) -> Option<GestureOutcome> {
        if !self
            .drag
            .as_ref()
            .map_or(false, |d| d.pointer_id == pointer_id)
        {
            return None;
        }
        let drag = self.drag.take()?;

        if !drag.moved_past_threshold {
            return Some(GestureOutcome::Click {
                date: drag.target_date,
                instant: drag.origin_instant,
                event_id: drag.target.event_id().map(str::to_string),
            });
        }

        let preview = self.preview_of(&drag);
        Some(match drag.target {
            PressTarget::EmptyCell => GestureOutcome::CreateRange {
                start: preview.start,
                end: preview.end,
            },
            PressTarget::EventBody { event_id, .. } => GestureOutcome::MoveRange {
                event_id,
                start: preview.start,
                end: preview.end,
            },
            PressTarget::EndHandle { event_id, .. } => GestureOutcome::ResizeRange {
                event_id,
                start: preview.start,
                end: preview.end,
            },
        })
    }

    /// Discard the gesture with no side effect.
    pub fn pointer_cancel(&mut self, pointer_id: u64) {
        if self
            .drag
            .as_ref()
            .map_or(false, |d| d.pointer_id == pointer_id)
        {
            self.drag = None;
        }
    }

    fn preview_of(&self, drag: &DragState) -> PreviewRange {
        match &drag.target {
            PressTarget::EmptyCell => {
                let (start, end) =
                    snapped_range(drag.origin_instant, drag.current_instant, self.step);
                PreviewRange { start, end }
            }
            PressTarget::EventBody { start, end, .. } => {
                let delta = drag.current_instant - drag.origin_instant;
                let new_start = snap_to_step(*start + delta, self.step);
                PreviewRange {
                    start: new_start,
                    end: new_start + (*end - *start),
                }
            }
            PressTarget::EndHandle { start, day_end, .. } => {
                let floor = *start + self.step;
                let ceiling = (*day_end).max(floor);
                let new_end = snap_to_step(drag.current_instant, self.step)
                    .clamp(floor, ceiling);
                PreviewRange {
                    start: *start,
                    end: new_end,
                }
            }
        }
    }
}

fn past_threshold(origin: (f32, f32), current: (f32, f32), threshold: f32) -> bool {
    let dx = current.0 - origin.0;
    let dy = current.1 - origin.1;
    dx * dx + dy * dy > threshold * threshold
}
