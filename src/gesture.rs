//! Drag gesture state machine.
//!
//! Turns pick-up / enter / leave / drop / cancel events into semantic
//! transitions. The tracker never touches the collection: a drop only
//! reports what was dropped where, and the caller decides whether that is a
//! mutation. `T` is the drop target type: another item for the tile grid, a
//! group for the task board.

use std::fmt::Debug;

use tracing::debug;

use crate::model::{GroupId, ItemId};

/// Where the dragged item was picked up from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub group: GroupId,
    pub position: usize,
}

/// Transient state of one pick-up-to-drop interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureSession<T> {
    pub item: ItemId,
    pub origin: Origin,
    pub hover: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureState<T> {
    Idle,
    Dragging { item: ItemId },
    Hovering { item: ItemId, target: T },
}

/// Visual side effect of a handled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    /// Event not applicable in the current state
    Ignored,
    /// Mark `item` as being dragged
    PickedUp { item: ItemId },
    /// Clear `previous` (if any) and highlight `current`
    Highlight { previous: Option<T>, current: T },
    /// Clear the highlight on a target the pointer left
    Unhighlight { target: T },
    /// Dropped onto a target; the caller computes the mutation
    Dropped {
        item: ItemId,
        origin: Origin,
        target: T,
    },
    /// Gesture ended without a target (cancel, or drop outside any target)
    Reverted {
        item: ItemId,
        highlighted: Option<T>,
    },
}

/// Single-gesture drag tracker
#[derive(Debug, Clone)]
pub struct GestureTracker<T> {
    session: Option<GestureSession<T>>,
}

impl<T> Default for GestureTracker<T> {
    fn default() -> Self {
        GestureTracker { session: None }
    }
}

impl<T: Clone + PartialEq + Debug> GestureTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState<T> {
        match &self.session {
            None => GestureState::Idle,
            Some(GestureSession {
                item,
                hover: None,
                ..
            }) => GestureState::Dragging { item: *item },
            Some(GestureSession {
                item,
                hover: Some(target),
                ..
            }) => GestureState::Hovering {
                item: *item,
                target: target.clone(),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&GestureSession<T>> {
        self.session.as_ref()
    }

    /// Item currently being dragged
    pub fn dragged(&self) -> Option<ItemId> {
        self.session.as_ref().map(|s| s.item)
    }

    /// Target currently highlighted
    pub fn hovered(&self) -> Option<&T> {
        self.session.as_ref().and_then(|s| s.hover.as_ref())
    }

    /// IDLE → DRAGGING. Ignored while another gesture is active.
    pub fn pick_up(&mut self, item: ItemId, origin: Origin) -> Transition<T> {
        if let Some(active) = &self.session {
            debug!(item = %item, active = %active.item, "pick-up ignored: gesture already active");
            return Transition::Ignored;
        }
        debug!(item = %item, group = %origin.group, position = origin.position, "pick-up");
        self.session = Some(GestureSession {
            item,
            origin,
            hover: None,
        });
        Transition::PickedUp { item }
    }

    /// Pointer entered a valid drop target.
    pub fn enter(&mut self, target: T) -> Transition<T> {
        let Some(session) = &mut self.session else {
            return Transition::Ignored;
        };
        if session.hover.as_ref() == Some(&target) {
            return Transition::Ignored;
        }
        let previous = session.hover.replace(target.clone());
        Transition::Highlight {
            previous,
            current: target,
        }
    }

    /// Pointer left `target`. Leaving anything but the highlighted target is
    /// ignored, since enter events for the next target may arrive first.
    pub fn leave(&mut self, target: &T) -> Transition<T> {
        let Some(session) = &mut self.session else {
            return Transition::Ignored;
        };
        if session.hover.as_ref() != Some(target) {
            return Transition::Ignored;
        }
        session.hover = None;
        Transition::Unhighlight {
            target: target.clone(),
        }
    }

    /// End the gesture. Reports `Dropped` when a target is highlighted,
    /// `Reverted` otherwise.
    pub fn drop(&mut self) -> Transition<T> {
        let Some(session) = self.session.take() else {
            return Transition::Ignored;
        };
        match session.hover {
            Some(target) => {
                debug!(item = %session.item, ?target, "drop");
                Transition::Dropped {
                    item: session.item,
                    origin: session.origin,
                    target,
                }
            }
            None => {
                debug!(item = %session.item, "drop outside any target");
                Transition::Reverted {
                    item: session.item,
                    highlighted: None,
                }
            }
        }
    }

    /// Abort the gesture without any mutation.
    pub fn cancel(&mut self) -> Transition<T> {
        let Some(session) = self.session.take() else {
            return Transition::Ignored;
        };
        debug!(item = %session.item, "gesture cancelled");
        Transition::Reverted {
            item: session.item,
            highlighted: session.hover,
        }
    }
}
