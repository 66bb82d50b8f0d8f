use std::collections::HashMap;
use std::fmt;

use glam::DVec2;
use serde::Deserialize;

use crate::api::types::{ControlId, DrawableId, GroupId};
use crate::core::surface::Surface;

/// Movement restriction applied while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Free,
    Horizontal,
    Vertical,
}

impl Axis {
    /// Restrict a move from `start` to `target`.
    pub fn constrain(self, start: DVec2, target: DVec2) -> DVec2 {
        match self {
            Axis::Free => target,
            Axis::Horizontal => DVec2::new(target.x, start.y),
            Axis::Vertical => DVec2::new(start.x, target.y),
        }
    }
}

/// Round `pos` to the nearest multiple of `grid` on both axes.
/// Non-positive grids leave the position untouched.
pub fn snap_to_grid(pos: DVec2, grid: f64) -> DVec2 {
    if grid <= 0.0 || !grid.is_finite() {
        return pos;
    }
    (pos / grid).round() * grid
}

/// Attribute bag for a control.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Disabled controls are skipped by hit testing (default: true).
    pub enabled: bool,
    /// Can be dragged (default: true).
    pub movable: bool,
    /// `detach` is a no-op when false (default: true).
    pub removable: bool,
    /// Takes focus on drag begin (default: true).
    pub focusable: bool,
    pub axis: Axis,
    /// Grid size applied to the final position of a drag.
    pub snap: Option<f64>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            movable: true,
            removable: true,
            focusable: true,
            axis: Axis::Free,
            snap: None,
        }
    }
}

/// Pointer and lifecycle notifications a control can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Inside,
    Outside,
    LeftClick,
    RightClick,
    DragBegin,
    DragEnd,
    Focus,
    LostFocus,
    Attach,
    Detach,
}

/// Callback attached to a [`ControlEvent`]. Receives the surface so it can
/// attach, detach or animate entities, including its own control.
pub type ControlCallback = Box<dyn FnMut(&mut Surface, ControlId)>;

/// Per-event callbacks.
///
/// A callback is taken out of its slot while it runs and put back afterwards,
/// so it may freely re-enter the surface.
#[derive(Default)]
pub struct ControlHandlers {
    slots: HashMap<ControlEvent, ControlCallback>,
}

impl ControlHandlers {
    pub fn set(&mut self, event: ControlEvent, callback: ControlCallback) {
        self.slots.insert(event, callback);
    }

    pub fn clear(&mut self, event: ControlEvent) {
        self.slots.remove(&event);
    }

    pub fn has(&self, event: ControlEvent) -> bool {
        self.slots.contains_key(&event)
    }

    pub(crate) fn take(&mut self, event: ControlEvent) -> Option<ControlCallback> {
        self.slots.remove(&event)
    }

    /// Put a callback back unless it was replaced while running.
    pub(crate) fn restore(&mut self, event: ControlEvent, callback: ControlCallback) {
        self.slots.entry(event).or_insert(callback);
    }
}

impl fmt::Debug for ControlHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

/// Pointer-driven behavior bound to exactly one drawable.
#[derive(Debug)]
pub struct Control {
    pub(crate) id: Option<ControlId>,
    pub enabled: bool,
    pub movable: bool,
    pub removable: bool,
    pub focusable: bool,
    pub axis: Axis,
    pub snap: Option<f64>,
    pub(crate) drawable: Option<DrawableId>,
    pub(crate) group: Option<GroupId>,
    pub(crate) handlers: ControlHandlers,
}

impl Control {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            id: None,
            enabled: config.enabled,
            movable: config.movable,
            removable: config.removable,
            focusable: config.focusable,
            axis: config.axis,
            snap: config.snap,
            drawable: None,
            group: None,
            handlers: ControlHandlers::default(),
        }
    }

    /// Drawable to bind when the control is attached.
    pub fn with_drawable(mut self, drawable: DrawableId) -> Self {
        self.drawable = Some(drawable);
        self
    }

    /// Register a callback for `event`, replacing any previous one.
    pub fn on(
        mut self,
        event: ControlEvent,
        f: impl FnMut(&mut Surface, ControlId) + 'static,
    ) -> Self {
        self.handlers.set(event, Box::new(f));
        self
    }

    pub fn id(&self) -> Option<ControlId> {
        self.id
    }

    pub fn drawable(&self) -> Option<DrawableId> {
        self.drawable
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn handlers(&self) -> &ControlHandlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut ControlHandlers {
        &mut self.handlers
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}
