//! Pointer state machine: hover, press, drag, click, focus and resize.
//!
//! All timing is driven by host timestamps passed to
//! [`Surface::advance`]: the press-to-drag delay is a [`Timeout`], the
//! redraw-while-dragging loop an [`Interval`], and resize events are
//! debounced with a [`Timeout`] that restarts on every event.

use glam::DVec2;

use super::surface::Surface;
use super::time::{Interval, Timeout};
use crate::api::types::{ControlId, DrawableId};
use crate::components::control::{snap_to_grid, ControlEvent};
use crate::components::hooks::PointerEvent;
use crate::components::group::Membership;
use crate::input::queue::{InputEvent, MouseButton};

/// An active drag. At most one exists per surface.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Drag {
    pub control: ControlId,
    /// The dragged control's drawable.
    pub leader: DrawableId,
    /// Pointer position minus leader position at drag begin.
    pub grab_offset: DVec2,
    /// Leader position at drag begin, the anchor for axis restriction.
    pub start: DVec2,
    pub interval: Interval,
}

#[derive(Debug, Default)]
pub(crate) struct Interaction {
    pub pointer: DVec2,
    pub pointer_down: bool,
    /// Control under the pointer at press time.
    pub down_target: Option<ControlId>,
    pub down_button: Option<MouseButton>,
    /// Pending press-to-drag delay.
    pub arm: Option<(Timeout, ControlId)>,
    pub drag: Option<Drag>,
    pub focus: Option<ControlId>,
    /// Latest resize request and its debounce deadline.
    pub resize: Option<(Timeout, DVec2)>,
}

impl Interaction {
    pub fn has_timers(&self) -> bool {
        self.arm.is_some() || self.drag.is_some() || self.resize.is_some()
    }

    /// Drop every reference to a control that is going away.
    pub fn forget(&mut self, id: ControlId) {
        if self.focus == Some(id) {
            self.focus = None;
        }
        if self.down_target == Some(id) {
            self.down_target = None;
        }
        if self.arm.is_some_and(|(_, c)| c == id) {
            self.arm = None;
        }
        if self.drag.is_some_and(|d| d.control == id) {
            log::debug!("drag of {:?} cancelled by detach", id);
            self.drag = None;
        }
    }
}

impl Surface {
    /// Fire due timers: press-to-drag, the drag redraw interval and the
    /// resize debounce.
    pub fn advance(&mut self, now: f64) {
        self.clock = Some(now);

        if let Some((timeout, control)) = self.interaction.arm {
            if timeout.is_due(now) {
                self.interaction.arm = None;
                let pointer = self.interaction.pointer;
                if self.interaction.pointer_down && self.pick(pointer) == Some(control) {
                    self.begin_drag(control, now);
                }
            }
        }

        let steps = match self.interaction.drag.as_mut() {
            Some(drag) => drag.interval.poll(now),
            None => 0,
        };
        if steps > 0 {
            self.refresh();
        }

        if let Some((timeout, size)) = self.interaction.resize {
            if timeout.is_due(now) {
                self.interaction.resize = None;
                self.apply_resize(size);
            }
        }
    }

    /// Feed one input event. Touch maps onto the left mouse button.
    pub fn dispatch(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::PointerMove { x, y } | InputEvent::TouchMove { x, y } => {
                self.pointer_move(DVec2::new(x, y))
            }
            InputEvent::PointerDown { x, y, button } => {
                self.pointer_down(DVec2::new(x, y), button, now)
            }
            InputEvent::TouchStart { x, y } => {
                self.pointer_down(DVec2::new(x, y), MouseButton::Left, now)
            }
            InputEvent::PointerUp { x, y, button } => self.pointer_up(DVec2::new(x, y), button),
            InputEvent::TouchEnd { x, y } => self.pointer_up(DVec2::new(x, y), MouseButton::Left),
            InputEvent::Resize { width, height } => {
                self.resize(DVec2::new(width, height), now)
            }
        }
    }

    pub fn pointer(&self) -> DVec2 {
        self.interaction.pointer
    }

    /// Topmost enabled, hoverable control under `at`. Sticky drawables win
    /// over non-sticky ones since they render on top.
    pub fn pick(&mut self, at: DVec2) -> Option<ControlId> {
        self.sort_if_dirty();
        let radius = self.config().hit_radius;
        let mut fallback = None;
        for id in self.hit_order().to_vec() {
            let Some(control) = self.controls.get(id.key()) else {
                continue;
            };
            if !control.enabled {
                continue;
            }
            let Some(d) = control.drawable.and_then(|d| self.drawables.get(d.key())) else {
                continue;
            };
            if !d.visible || !d.hoverable {
                continue;
            }
            if let Some(r) = radius {
                let p = d.position();
                if (p.x - at.x).abs() > r || (p.y - at.y).abs() > r {
                    continue;
                }
            }
            if !d.is_hover(at) {
                continue;
            }
            if d.sticky {
                return Some(id);
            }
            fallback.get_or_insert(id);
        }
        fallback
    }

    /// Recompute hover for every control. `Outside` fires for controls that
    /// lost the pointer before `Inside` fires for the one that gained it.
    fn update_hover(&mut self) {
        let pointer = self.interaction.pointer;
        let hit = self.pick(pointer);
        let mut lost = Vec::new();
        let mut gained = Vec::new();
        for id in self.hit_order().to_vec() {
            let Some(drawable) = self.controls.get(id.key()).and_then(|c| c.drawable) else {
                continue;
            };
            let Some(d) = self.drawables.get_mut(drawable.key()) else {
                continue;
            };
            let hover = hit == Some(id);
            if d.hover && !hover {
                lost.push(id);
            } else if !d.hover && hover {
                gained.push(id);
            }
            d.hover = hover;
        }
        for id in lost {
            self.fire(id, ControlEvent::Outside);
        }
        for id in gained {
            self.fire(id, ControlEvent::Inside);
        }
    }

    pub fn pointer_move(&mut self, at: DVec2) {
        self.interaction.pointer = at;
        if self.interaction.drag.is_some() {
            self.drag_to(at);
        }
        self.update_hover();
        self.each_pointer_hook(|hook, surface| {
            hook.on_move(
                surface,
                PointerEvent {
                    position: at,
                    button: None,
                },
            )
        });
    }

    /// Press. Arms the drag delay when the pointer is over a movable,
    /// enabled control with the left button and nothing is being dragged.
    pub fn pointer_down(&mut self, at: DVec2, button: MouseButton, now: f64) {
        self.interaction.pointer = at;
        self.update_hover();
        let target = self.pick(at);
        self.interaction.pointer_down = true;
        self.interaction.down_button = Some(button);
        self.interaction.down_target = target;

        if let Some(id) = target {
            let movable = self.controls.get(id.key()).is_some_and(|c| c.movable);
            if button == MouseButton::Left && movable && self.interaction.drag.is_none() {
                let delay = self.config().drag_delay_ms;
                self.interaction.arm = Some((Timeout::after(now, delay), id));
                log::trace!("armed drag of {:?}", id);
            }
        }

        self.each_pointer_hook(|hook, surface| {
            hook.on_down(
                surface,
                PointerEvent {
                    position: at,
                    button: Some(button),
                },
            )
        });
    }

    /// Release. Always cancels the drag delay and the drag interval. Ends a
    /// drag, or reports a click when press and release hit the same control.
    pub fn pointer_up(&mut self, at: DVec2, button: MouseButton) {
        self.interaction.pointer = at;
        self.interaction.arm = None;
        let drag = self.interaction.drag.take();
        let down_target = self.interaction.down_target.take();
        self.interaction.pointer_down = false;
        self.interaction.down_button = None;

        match drag {
            Some(drag) => self.end_drag(drag, at),
            None => {
                if down_target.is_some() && self.pick(at) == down_target {
                    let event = match button {
                        MouseButton::Left => Some(ControlEvent::LeftClick),
                        MouseButton::Right => Some(ControlEvent::RightClick),
                        MouseButton::Middle => None,
                    };
                    if let (Some(id), Some(event)) = (down_target, event) {
                        self.fire(id, event);
                    }
                }
            }
        }

        self.each_pointer_hook(|hook, surface| {
            hook.on_up(
                surface,
                PointerEvent {
                    position: at,
                    button: Some(button),
                },
            )
        });
        self.refresh();
    }

    /// The control being dragged, if any.
    pub fn dragging(&self) -> Option<ControlId> {
        self.interaction.drag.map(|d| d.control)
    }

    pub fn is_dragging(&self, id: ControlId) -> bool {
        self.dragging() == Some(id)
    }

    fn begin_drag(&mut self, id: ControlId, now: f64) {
        let Some(control) = self.controls.get(id.key()) else {
            return;
        };
        let focusable = control.focusable;
        let Some(leader) = control.drawable else {
            return;
        };
        let Some(start) = self.drawables.get(leader.key()).map(|d| d.position()) else {
            return;
        };

        if let Some(group) = self.drawable_group(leader) {
            let grouped = self
                .group(group)
                .map(|g| g.grouped().to_vec())
                .unwrap_or_default();
            let mut offsets = Vec::new();
            for member in self.member_drawables(&grouped) {
                if member == leader {
                    continue;
                }
                if let Some(d) = self.drawables.get(member.key()) {
                    offsets.push((member, d.position() - start));
                }
            }
            if let Some(g) = self.groups.get_mut(group.key()) {
                g.offsets = offsets.into_iter().collect();
            }
        }

        self.interaction.drag = Some(Drag {
            control: id,
            leader,
            grab_offset: self.interaction.pointer - start,
            start,
            interval: Interval::new(self.config().drag_interval_ms, now),
        });
        log::debug!("drag begin {:?}", id);
        self.to_front(leader);
        if focusable {
            self.set_focus(id);
        }
        self.fire(id, ControlEvent::DragBegin);
        self.refresh();
    }

    /// Where the leader goes for a pointer at `at`, after axis restriction.
    fn drag_target(&self, drag: &Drag, at: DVec2) -> DVec2 {
        let axis = self
            .controls
            .get(drag.control.key())
            .map(|c| c.axis)
            .unwrap_or_default();
        axis.constrain(drag.start, at - drag.grab_offset)
    }

    fn drag_to(&mut self, at: DVec2) {
        let Some(drag) = self.interaction.drag else {
            return;
        };
        let target = self.drag_target(&drag, at);
        self.place_dragged(&drag, target);
    }

    fn end_drag(&mut self, drag: Drag, at: DVec2) {
        let mut target = self.drag_target(&drag, at);
        if let Some(grid) = self.controls.get(drag.control.key()).and_then(|c| c.snap) {
            target = snap_to_grid(target, grid);
        }
        self.place_dragged(&drag, target);
        if let Some(group) = self.drawable_group(drag.leader) {
            if let Some(g) = self.groups.get_mut(group.key()) {
                g.offsets.clear();
            }
        }
        log::debug!("drag end {:?} at {:?}", drag.control, target);
        self.fire(drag.control, ControlEvent::DragEnd);
    }

    /// Move the leader to `target` and grouped members to their offsets.
    fn place_dragged(&mut self, drag: &Drag, target: DVec2) {
        if let Some(d) = self.drawables.get_mut(drag.leader.key()) {
            d.set_position(target);
        }
        let Some(group) = self.drawable_group(drag.leader) else {
            return;
        };
        let offsets: Vec<(DrawableId, DVec2)> = match self.groups.get(group.key()) {
            Some(g) => g.offsets.iter().map(|(d, o)| (*d, *o)).collect(),
            None => return,
        };
        for (member, offset) in offsets {
            if let Some(d) = self.drawables.get_mut(member.key()) {
                d.set_position(target + offset);
            }
        }
    }

    // -- Focus --

    /// The focused control, if any.
    pub fn focus(&self) -> Option<ControlId> {
        self.interaction.focus
    }

    /// Move focus to `id`: `LostFocus` on the previous holder, then `Focus`
    /// on the new one. Focusing the current holder or a missing control does
    /// nothing. A `LostFocus` callback that moves focus itself wins over
    /// this call.
    pub fn set_focus(&mut self, id: ControlId) {
        if self.interaction.focus == Some(id) || !self.controls.contains(id.key()) {
            return;
        }
        if let Some(previous) = self.interaction.focus.take() {
            self.fire(previous, ControlEvent::LostFocus);
            if let Some(current) = self.interaction.focus {
                log::debug!("focus moved to {:?} while leaving {:?}", current, previous);
                return;
            }
        }
        // LostFocus may have detached the new target.
        if !self.controls.contains(id.key()) {
            return;
        }
        self.interaction.focus = Some(id);
        self.fire(id, ControlEvent::Focus);
    }

    pub fn remove_focus(&mut self) {
        if let Some(previous) = self.interaction.focus.take() {
            self.fire(previous, ControlEvent::LostFocus);
        }
    }

    // -- Resize --

    /// Request a new surface size. Applied once no further request arrives
    /// for the debounce period.
    pub fn resize(&mut self, size: DVec2, now: f64) {
        let delay = self.config().resize_debounce_ms;
        self.interaction.resize = Some((Timeout::after(now, delay), size));
    }

    /// Resize immediately, notifying drawables that reach past the old or
    /// the new extent.
    pub fn apply_resize(&mut self, size: DVec2) {
        let old = self.size;
        if old == size {
            return;
        }
        self.size = size;
        let mut notified = 0;
        for key in self.drawables.keys() {
            if let Some(d) = self.drawables.get_mut(key) {
                if d.exceeds(old) || d.exceeds(size) {
                    d.resized(old, size);
                    notified += 1;
                }
            }
        }
        log::debug!("resized {:?} -> {:?}, {} drawables notified", old, size, notified);
        self.refresh();
    }

    /// Whether a drawable is in any group as a grouped (co-moving) member.
    pub fn is_grouped(&self, id: DrawableId) -> bool {
        self.drawable_group(id)
            .and_then(|g| self.group(g))
            .is_some_and(|g| g.membership(id.into()) == Some(Membership::Grouped))
    }
}
