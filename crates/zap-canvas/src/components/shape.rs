//! Shape generators: the pluggable part of a drawable.
//!
//! A shape turns a size into a local path plus bounding box, centered on the
//! drawable's origin. The drawable owns the transform and style; the shape
//! only knows its outline.

use std::fmt::Debug;

use glam::DVec2;
use lyon::math::{point, vector, Box2D};
use lyon::path::{Path, Winding};
use serde::Deserialize;

use crate::renderer::traits::{DrawContext, Style};

/// Axis-aligned box in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top_left: DVec2,
    pub bottom_right: DVec2,
}

impl Bounds {
    /// Box of the given size centered on the origin.
    pub fn centered(size: DVec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            top_left: -half,
            bottom_right: half,
        }
    }

    pub fn size(&self) -> DVec2 {
        self.bottom_right - self.top_left
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.top_left.x
            && p.x <= self.bottom_right.x
            && p.y >= self.top_left.y
            && p.y <= self.bottom_right.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::centered(DVec2::ZERO)
    }
}

/// Output of [`Shape::generate`].
#[derive(Debug, Clone)]
pub struct Geometry {
    pub path: Path,
    pub bounds: Bounds,
}

impl Geometry {
    pub fn empty() -> Self {
        Self {
            path: Path::new(),
            bounds: Bounds::default(),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::empty()
    }
}

/// Outline generator plugged into a [`Drawable`](super::drawable::Drawable).
pub trait Shape: Debug {
    /// Build the local path and bounds for a drawable of `size`.
    fn generate(&self, size: DVec2) -> Geometry;

    /// Issue draw calls. The drawable has already set transform and style.
    fn draw(&self, ctx: &mut dyn DrawContext, geometry: &Geometry, style: &Style) {
        if style.fill.is_some() {
            ctx.fill(&geometry.path);
        }
        if style.stroke.is_some() && style.line_width > 0.0 {
            ctx.stroke(&geometry.path);
        }
    }

    /// The surface was resized across this shape's extent.
    /// The drawable regenerates its geometry right after this returns.
    fn on_resize(&mut self, _old: DVec2, _new: DVec2) {}
}

/// Rectangle centered on the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rect;

impl Shape for Rect {
    fn generate(&self, size: DVec2) -> Geometry {
        let bounds = Bounds::centered(size);
        let mut builder = Path::builder();
        builder.add_rectangle(
            &Box2D::new(
                point(bounds.top_left.x as f32, bounds.top_left.y as f32),
                point(bounds.bottom_right.x as f32, bounds.bottom_right.y as f32),
            ),
            Winding::Positive,
        );
        Geometry {
            path: builder.build(),
            bounds,
        }
    }
}

/// Ellipse inscribed in the drawable's size.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ellipse;

impl Shape for Ellipse {
    fn generate(&self, size: DVec2) -> Geometry {
        let bounds = Bounds::centered(size);
        let radii = bounds.bottom_right;
        // Degenerate radii yield an empty outline rather than a NaN path.
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return Geometry {
                path: Path::new(),
                bounds,
            };
        }
        let mut builder = Path::builder();
        builder.add_ellipse(
            point(0.0, 0.0),
            vector(radii.x as f32, radii.y as f32),
            lyon::math::Angle::radians(0.0),
            Winding::Positive,
        );
        Geometry {
            path: builder.build(),
            bounds,
        }
    }
}

/// Built-in shape selector used by JSON descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
}

impl ShapeKind {
    pub fn build(self) -> Box<dyn Shape> {
        match self {
            ShapeKind::Rect => Box::new(Rect),
            ShapeKind::Ellipse => Box::new(Ellipse),
        }
    }
}
