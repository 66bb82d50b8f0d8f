pub mod animation;
pub mod api;
pub mod components;
pub mod core;
pub mod input;
pub mod renderer;

// Re-export key types at crate root for convenience
pub use api::app::{App, SurfaceConfig};
pub use api::error::CanvasError;
pub use api::types::{
    ComponentId, ControlId, DrawableId, EntityId, EntityKind, GroupId, Key, PointerHookId,
    RenderHookId,
};
pub use animation::easing::Easing;
pub use animation::effects::{Effect, Frame, Smuggler};
pub use animation::tween::{Tween, TweenId, TweenSpec, TweenState};
pub use components::component::{Component, ComponentConfig, Composite};
pub use components::control::{Axis, Control, ControlConfig, ControlEvent};
pub use components::drawable::{Drawable, DrawableConfig};
pub use components::group::{Group, GroupConfig, Membership};
pub use components::hooks::{PointerEvent, PointerHook, RenderHook};
pub use components::shape::{Bounds, Ellipse, Geometry, Rect, Shape, ShapeKind};
pub use core::surface::{Entity, EntityRef, FrameStats, Surface};
pub use core::time::{Interval, Timeout};
pub use core::transform::{Angle, Transform};
pub use input::queue::{InputEvent, InputQueue, MouseButton};
pub use renderer::traits::{Color, DrawContext, RenderTarget, Style};
pub use renderer::vector::{VectorTarget, VectorVertex};

// Geometry types appear in the public API (Shape::generate, DrawContext).
pub use glam::DVec2;
pub use lyon::path::Path;
