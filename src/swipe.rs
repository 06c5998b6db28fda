//! Per-row swipe gesture state machine.
//!
//! A row starts `Idle`. A primary-button press captures the pointer and moves
//! the row into `Dragging`; the offset follows the pointer 1:1 up to the width
//! of the tray on that side and is damped beyond it. Releasing snaps the row
//! to a fully revealed tray or back to rest. Taps are disambiguated from drags
//! so one physical gesture never both reveals a tray and selects the row.

use crate::error::SwipeConfigError;

/// Minimum committed offset, in device-independent pixels, to reveal a tray.
pub const SWIPE_THRESHOLD: f32 = 60.0;
/// Width reserved for each action button in a tray.
pub const ACTION_ITEM_WIDTH: f32 = 80.0;
/// Movement below this distance still counts as a tap.
pub const JITTER_THRESHOLD: f32 = 10.0;
/// Fraction of the drag applied past the edge of a tray.
pub const OVERDRAG_DAMPING: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    pub threshold: f32,
    pub item_width: f32,
    pub jitter: f32,
    pub damping: f32,
    pub right_actions: usize,
    pub left_actions: usize,
}

impl SwipeConfig {
    pub fn new(right_actions: usize, left_actions: usize) -> Self {
        Self {
            threshold: SWIPE_THRESHOLD,
            item_width: ACTION_ITEM_WIDTH,
            jitter: JITTER_THRESHOLD,
            damping: OVERDRAG_DAMPING,
            right_actions,
            left_actions,
        }
    }

    pub fn validate(self) -> Result<Self, SwipeConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(SwipeConfigError::Threshold(self.threshold));
        }
        if !self.item_width.is_finite() || self.item_width <= 0.0 {
            return Err(SwipeConfigError::ItemWidth(self.item_width));
        }
        if !self.jitter.is_finite() || self.jitter <= 0.0 {
            return Err(SwipeConfigError::Jitter(self.jitter));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(SwipeConfigError::Damping(self.damping));
        }
        Ok(self)
    }

    /// Full offset of a revealed right tray (positive drag).
    pub fn right_extent(&self) -> f32 {
        self.item_width * self.right_actions as f32
    }

    /// Full offset magnitude of a revealed left tray (negative drag).
    pub fn left_extent(&self) -> f32 {
        self.item_width * self.left_actions as f32
    }

    pub fn action_count(&self, side: SwipeSide) -> usize {
        match side {
            SwipeSide::Right => self.right_actions,
            SwipeSide::Left => self.left_actions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub button: PointerButton,
    pub x: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeSide {
    /// Revealed by a positive (rightward) drag.
    Right,
    /// Revealed by a negative (leftward) drag.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeState {
    Idle,
    Dragging { pointer_id: u64, origin_x: f32 },
    Revealed(SwipeSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTap {
    /// Ordinary tap: select or toggle-select the row.
    Select,
    /// The tap closed an open tray.
    CloseTray,
    /// The tap ended a drag and must be ignored.
    Consumed,
}

#[derive(Debug, Clone)]
pub struct SwipeController {
    config: SwipeConfig,
    state: SwipeState,
    translate_x: f32,
    displayed_x: f32,
    has_moved: bool,
    selection_mode: bool,
}

impl SwipeController {
    pub fn new(config: SwipeConfig) -> Result<Self, SwipeConfigError> {
        Ok(Self {
            config: config.validate()?,
            state: SwipeState::Idle,
            translate_x: 0.0,
            displayed_x: 0.0,
            has_moved: false,
            selection_mode: false,
        })
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    /// Resting offset the row is at or settling toward.
    pub fn offset(&self) -> f32 {
        self.translate_x
    }

    /// Offset to draw this frame.
    pub fn displayed_offset(&self) -> f32 {
        self.displayed_x
    }

    pub fn is_settling(&self) -> bool {
        self.displayed_x != self.translate_x
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.state, SwipeState::Dragging { .. })
    }

    pub fn revealed(&self) -> Option<SwipeSide> {
        match self.state {
            SwipeState::Revealed(side) => Some(side),
            _ => None,
        }
    }

    pub fn set_selection_mode(&mut self, enabled: bool) {
        self.selection_mode = enabled;
        if enabled {
            self.state = SwipeState::Idle;
            self.translate_x = 0.0;
            self.displayed_x = 0.0;
            self.has_moved = false;
        }
    }

    /// Returns whether the pointer was captured.
    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        if self.selection_mode || event.button != PointerButton::Primary || self.is_captured() {
            return false;
        }
        self.state = SwipeState::Dragging {
            pointer_id: event.pointer_id,
            origin_x: event.x,
        };
        self.has_moved = false;
        tracing::trace!(pointer = event.pointer_id, x = event.x, "swipe captured");
        true
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        let SwipeState::Dragging {
            pointer_id,
            origin_x,
        } = self.state
        else {
            return;
        };
        if pointer_id != event.pointer_id {
            return;
        }

        let delta = event.x - origin_x;
        if delta.abs() > self.config.jitter {
            self.has_moved = true;
        }
        self.translate_x = self.resist(delta);
        // no animation while the finger is down
        self.displayed_x = self.translate_x;
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> SwipeState {
        self.release(event.pointer_id)
    }

    pub fn pointer_cancel(&mut self, event: PointerEvent) -> SwipeState {
        self.release(event.pointer_id)
    }

    fn release(&mut self, pointer: u64) -> SwipeState {
        match self.state {
            SwipeState::Dragging { pointer_id, .. } if pointer_id == pointer => {}
            _ => return self.state,
        }

        let threshold = self.config.threshold;
        let (target, state) = if self.translate_x > threshold && self.config.right_actions > 0 {
            (
                self.config.right_extent(),
                SwipeState::Revealed(SwipeSide::Right),
            )
        } else if self.translate_x < -threshold && self.config.left_actions > 0 {
            (
                -self.config.left_extent(),
                SwipeState::Revealed(SwipeSide::Left),
            )
        } else {
            (0.0, SwipeState::Idle)
        };

        tracing::debug!(from = self.translate_x, to = target, "swipe released");
        self.translate_x = target;
        self.state = state;
        self.state
    }

    /// Damps motion past the edge of the tray on the side being dragged.
    fn resist(&self, delta: f32) -> f32 {
        let max_right = self.config.right_extent();
        let max_left = -self.config.left_extent();
        if delta > max_right {
            max_right + (delta - max_right) * self.config.damping
        } else if delta < max_left {
            max_left + (delta - max_left) * self.config.damping
        } else {
            delta
        }
    }

    /// Tap on the row body, delivered after the pointer was released.
    pub fn tap(&mut self) -> RowTap {
        if self.has_moved {
            self.has_moved = false;
            return RowTap::Consumed;
        }
        if self.translate_x != 0.0 {
            self.close();
            return RowTap::CloseTray;
        }
        RowTap::Select
    }

    /// Activates action `index` of the open tray on `side`.
    pub fn invoke_action(&mut self, side: SwipeSide, index: usize) -> Option<usize> {
        if self.revealed() != Some(side) || index >= self.config.action_count(side) {
            return None;
        }
        self.close();
        Some(index)
    }

    pub fn close(&mut self) {
        self.translate_x = 0.0;
        self.state = SwipeState::Idle;
    }

    /// Moves the drawn offset `fraction` of the way to the resting offset.
    pub fn advance(&mut self, fraction: f32) {
        if !self.is_settling() {
            return;
        }
        let remaining = self.translate_x - self.displayed_x;
        if remaining.abs() < 0.5 || fraction >= 1.0 {
            self.displayed_x = self.translate_x;
        } else {
            self.displayed_x += remaining * fraction.max(0.0);
        }
    }
}
