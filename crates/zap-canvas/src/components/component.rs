use glam::DVec2;
use serde::Deserialize;

use crate::api::types::{ComponentId, EntityId, GroupId};
use crate::core::surface::Surface;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Propagated to every drawable the component adopts.
    pub sticky: bool,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            sticky: false,
        }
    }
}

/// Lifecycle of a reusable composite.
///
/// `on_attach` creates the children (attach them, then
/// [`Surface::adopt`] them); `on_detach` may tear down anything it wants.
/// Children still attached after `on_detach` returns are detached by the
/// surface.
pub trait Component {
    fn on_attach(&mut self, _surface: &mut Surface, _id: ComponentId) {}

    fn on_detach(&mut self, _surface: &mut Surface, _id: ComponentId) {}
}

/// A positioned container bundling drawables and controls.
pub struct Composite {
    pub(crate) id: Option<ComponentId>,
    pub position: DVec2,
    pub size: DVec2,
    pub sticky: bool,
    pub(crate) group: Option<GroupId>,
    pub(crate) children: Vec<EntityId>,
    /// Taken out while a lifecycle hook runs.
    pub(crate) behavior: Option<Box<dyn Component>>,
}

impl Composite {
    pub fn new(config: ComponentConfig, behavior: impl Component + 'static) -> Self {
        Self {
            id: None,
            position: DVec2::new(config.x, config.y),
            size: DVec2::new(config.width, config.height),
            sticky: config.sticky,
            group: None,
            children: Vec::new(),
            behavior: Some(Box::new(behavior)),
        }
    }

    pub fn id(&self) -> Option<ComponentId> {
        self.id
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Adopted entities, in adoption order.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("sticky", &self.sticky)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
