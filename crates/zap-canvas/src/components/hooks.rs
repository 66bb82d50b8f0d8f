//! Lifecycle objects with no drawable of their own.

use glam::DVec2;

use crate::api::types::{PointerHookId, RenderHookId};
use crate::core::surface::Surface;
use crate::input::queue::MouseButton;
use crate::renderer::traits::DrawContext;

/// Runs once per rendered frame, around the drawable pass.
pub trait RenderHook {
    fn on_attach(&mut self, _surface: &mut Surface, _id: RenderHookId) {}

    /// Before any drawable is drawn. Draw calls land below every drawable.
    fn before_draw(&mut self, _surface: &mut Surface, _ctx: &mut dyn DrawContext) {}

    /// After the last drawable. Draw calls land on top of everything.
    fn after_draw(&mut self, _surface: &mut Surface, _ctx: &mut dyn DrawContext) {}

    fn on_detach(&mut self, _surface: &mut Surface, _id: RenderHookId) {}
}

/// Pointer position and button as seen by a [`PointerHook`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: DVec2,
    /// `None` for moves.
    pub button: Option<MouseButton>,
}

/// Runs once per pointer event, after the surface has handled it.
pub trait PointerHook {
    fn on_attach(&mut self, _surface: &mut Surface, _id: PointerHookId) {}

    fn on_move(&mut self, _surface: &mut Surface, _event: PointerEvent) {}

    fn on_down(&mut self, _surface: &mut Surface, _event: PointerEvent) {}

    fn on_up(&mut self, _surface: &mut Surface, _event: PointerEvent) {}

    fn on_detach(&mut self, _surface: &mut Surface, _id: PointerHookId) {}
}
