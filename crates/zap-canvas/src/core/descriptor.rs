//! Attaching entities from JSON attribute bags.
//!
//! A bag is an object tagged by `"kind"`; the remaining keys fill the
//! matching config struct, with unknown keys ignored and missing keys taking
//! their defaults:
//!
//! ```json
//! { "kind": "control", "axis": "horizontal",
//!   "drawable": { "shape": "ellipse", "x": 40, "y": 40, "width": 20 } }
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::surface::Surface;
use crate::api::error::CanvasError;
use crate::api::types::EntityId;
use crate::components::component::{Component, ComponentConfig, Composite};
use crate::components::control::{Control, ControlConfig};
use crate::components::drawable::{Drawable, DrawableConfig};
use crate::components::group::{Group, GroupConfig};
use crate::components::shape::ShapeKind;

#[derive(Debug, Deserialize)]
struct DrawableDescriptor {
    #[serde(default)]
    shape: ShapeKind,
    #[serde(flatten)]
    config: DrawableConfig,
}

impl DrawableDescriptor {
    fn build(self) -> Drawable {
        Drawable::new(self.config, self.shape.build())
    }
}

#[derive(Debug, Deserialize)]
struct ControlDescriptor {
    /// Attached first, then bound to the control.
    #[serde(default)]
    drawable: Option<DrawableDescriptor>,
    #[serde(flatten)]
    config: ControlConfig,
}

/// Behavior for components created from a bag: children are adopted later.
struct Plain;

impl Component for Plain {}

impl Surface {
    /// Parse and attach one entity.
    pub fn attach_from_json(&mut self, json: &str) -> Result<EntityId, CanvasError> {
        let value: Value = serde_json::from_str(json)?;
        self.attach_value(value)
    }

    pub fn attach_value(&mut self, mut value: Value) -> Result<EntityId, CanvasError> {
        let kind = match value.as_object_mut().and_then(|o| o.remove("kind")) {
            Some(Value::String(kind)) => kind,
            Some(other) => return Err(CanvasError::UnsupportedEntityKind(other.to_string())),
            None => return Err(CanvasError::UnsupportedEntityKind(String::new())),
        };

        let id = match kind.as_str() {
            "drawable" => {
                let descriptor: DrawableDescriptor = serde_json::from_value(value)?;
                self.attach_drawable(descriptor.build()).into()
            }
            "control" => {
                let descriptor: ControlDescriptor = serde_json::from_value(value)?;
                let mut control = Control::new(descriptor.config);
                if let Some(drawable) = descriptor.drawable {
                    control = control.with_drawable(self.attach_drawable(drawable.build()));
                }
                self.attach_control(control).into()
            }
            "group" => {
                let config: GroupConfig = serde_json::from_value(value)?;
                self.attach_group(Group::new(config)).into()
            }
            "component" => {
                let config: ComponentConfig = serde_json::from_value(value)?;
                self.attach_component(Composite::new(config, Plain)).into()
            }
            _ => return Err(CanvasError::UnsupportedEntityKind(kind)),
        };
        log::debug!("attached {:?} from descriptor", id);
        Ok(id)
    }
}
