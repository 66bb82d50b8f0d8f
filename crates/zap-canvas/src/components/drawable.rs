use glam::DVec2;
use lyon::algorithms::hit_test::hit_test_path;
use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::{FillRule, PathEvent};
use serde::Deserialize;

use super::shape::{Bounds, Ellipse, Geometry, Rect, Shape};
use crate::api::types::{ControlId, DrawableId, GroupId};
use crate::core::transform::{Angle, Transform};
use crate::renderer::traits::{Color, DrawContext, Style};

/// Flattening tolerance for hit tests, in local units.
const HIT_TOLERANCE: f32 = 0.1;

/// Attribute bag for a drawable. Missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawableConfig {
    /// Center position in surface pixels.
    pub x: f64,
    pub y: f64,
    /// Default: 10 x 10.
    pub width: f64,
    pub height: f64,
    /// Initial rotation in degrees.
    pub angle: f64,
    /// Default: opaque white. `null` disables the fill pass.
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub line_width: f64,
    pub alpha: f64,
    pub shadow_blur: f64,
    pub shadow_color: Color,
    pub visible: bool,
    /// Render above every non-sticky drawable.
    pub sticky: bool,
    /// Take part in pointer hit testing.
    pub hoverable: bool,
}

impl Default for DrawableConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            angle: 0.0,
            fill: Some(Color::WHITE),
            stroke: None,
            line_width: 1.0,
            alpha: 1.0,
            shadow_blur: 0.0,
            shadow_color: Color::TRANSPARENT,
            visible: true,
            sticky: false,
            hoverable: true,
        }
    }
}

/// A positioned, styled, pathed visual node.
///
/// The local path is centered on the origin; `transform` places it on the
/// surface. Geometry is not invalidated automatically: call
/// [`generate`](Self::generate) after changing `size` or the shape.
#[derive(Debug)]
pub struct Drawable {
    pub(crate) id: Option<DrawableId>,
    pub transform: Transform,
    pub size: DVec2,
    pub style: Style,
    pub visible: bool,
    pub sticky: bool,
    pub hoverable: bool,
    pub(crate) hover: bool,
    pub(crate) draw_index: u64,
    pub(crate) group: Option<GroupId>,
    pub(crate) control: Option<ControlId>,
    shape: Box<dyn Shape>,
    geometry: Geometry,
}

impl Drawable {
    pub fn new(config: DrawableConfig, shape: Box<dyn Shape>) -> Self {
        let mut transform = Transform::from_translation(DVec2::new(config.x, config.y));
        if config.angle != 0.0 {
            transform.rotate(Angle::Degrees(config.angle));
        }
        let mut drawable = Self {
            id: None,
            transform,
            size: DVec2::new(config.width, config.height),
            style: Style {
                fill: config.fill,
                stroke: config.stroke,
                line_width: config.line_width,
                alpha: config.alpha,
                shadow_blur: config.shadow_blur,
                shadow_color: config.shadow_color,
            },
            visible: config.visible,
            sticky: config.sticky,
            hoverable: config.hoverable,
            hover: false,
            draw_index: 0,
            group: None,
            control: None,
            shape,
            geometry: Geometry::empty(),
        };
        drawable.generate();
        drawable
    }

    pub fn rect(config: DrawableConfig) -> Self {
        Self::new(config, Box::new(Rect))
    }

    pub fn ellipse(config: DrawableConfig) -> Self {
        Self::new(config, Box::new(Ellipse))
    }

    // -- Builder pattern --

    pub fn with_fill(mut self, color: Color) -> Self {
        self.style.fill = Some(color);
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.style.stroke = Some(color);
        self.style.line_width = width;
        self
    }

    pub fn with_sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    // -- Accessors --

    /// Identifier while attached, `None` otherwise.
    pub fn id(&self) -> Option<DrawableId> {
        self.id
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// The control bound to this drawable, if any.
    pub fn control(&self) -> Option<ControlId> {
        self.control
    }

    /// Whether the pointer was over this drawable at the last move.
    pub fn is_hovered(&self) -> bool {
        self.hover
    }

    /// Position in draw order (higher draws later).
    pub fn draw_index(&self) -> u64 {
        self.draw_index
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    pub fn shape_mut(&mut self) -> &mut dyn Shape {
        self.shape.as_mut()
    }

    /// Swap the outline generator and regenerate.
    pub fn set_shape(&mut self, shape: Box<dyn Shape>) {
        self.shape = shape;
        self.generate();
    }

    pub fn position(&self) -> DVec2 {
        self.transform.translation()
    }

    pub fn set_position(&mut self, at: DVec2) {
        self.transform.set_translation(at);
    }

    /// Recompute path and bounds from the current size.
    pub fn generate(&mut self) {
        self.geometry = self.shape.generate(self.size);
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        ctx.save();
        ctx.set_transform(&self.transform);
        ctx.set_style(&self.style);
        self.shape.draw(ctx, &self.geometry, &self.style);
        ctx.restore();
    }

    /// Exact hit test of a surface-space point against the fill region or
    /// the stroked outline.
    pub fn is_hover(&self, pointer: DVec2) -> bool {
        let Some(inverse) = self.transform.inverse() else {
            return false;
        };
        let local = inverse.apply(pointer);
        let half_stroke = if self.style.stroke.is_some() {
            self.style.line_width.max(0.0) * 0.5
        } else {
            0.0
        };
        let reach = Bounds {
            top_left: self.geometry.bounds.top_left - DVec2::splat(half_stroke),
            bottom_right: self.geometry.bounds.bottom_right + DVec2::splat(half_stroke),
        };
        if !reach.contains(local) {
            return false;
        }
        let p = point(local.x as f32, local.y as f32);
        if hit_test_path(&p, self.geometry.path.iter(), FillRule::NonZero, HIT_TOLERANCE) {
            return true;
        }
        half_stroke > 0.0 && self.outline_distance(local) <= half_stroke
    }

    /// Shortest distance from a local point to the flattened outline.
    fn outline_distance(&self, p: DVec2) -> f64 {
        let mut best = f64::INFINITY;
        for event in self.geometry.path.iter().flattened(HIT_TOLERANCE) {
            let (from, to) = match event {
                PathEvent::Line { from, to } => (from, to),
                PathEvent::End {
                    last,
                    first,
                    close: true,
                } => (last, first),
                _ => continue,
            };
            let a = DVec2::new(from.x as f64, from.y as f64);
            let b = DVec2::new(to.x as f64, to.y as f64);
            best = best.min(segment_distance(p, a, b));
        }
        best
    }

    /// Axis-aligned box of the transformed bounds, in surface space.
    pub fn world_bounds(&self) -> Bounds {
        let b = self.geometry.bounds;
        let corners = [
            b.top_left,
            DVec2::new(b.bottom_right.x, b.top_left.y),
            b.bottom_right,
            DVec2::new(b.top_left.x, b.bottom_right.y),
        ];
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for corner in corners {
            let p = self.transform.apply(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Bounds {
            top_left: min,
            bottom_right: max,
        }
    }

    /// Whether any part of the drawable can land on a surface of `size`.
    pub fn in_viewport(&self, size: DVec2) -> bool {
        let b = self.world_bounds();
        b.bottom_right.x >= 0.0
            && b.bottom_right.y >= 0.0
            && b.top_left.x <= size.x
            && b.top_left.y <= size.y
    }

    /// Whether the drawable reaches past the right or bottom edge of `extent`.
    pub(crate) fn exceeds(&self, extent: DVec2) -> bool {
        let b = self.world_bounds();
        b.bottom_right.x > extent.x || b.bottom_right.y > extent.y
    }

    /// Let the shape react to a surface resize, then regenerate.
    pub(crate) fn resized(&mut self, old: DVec2, new: DVec2) {
        self.shape.on_resize(old, new);
        self.generate();
    }
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_at(x: f64, y: f64, side: f64) -> Drawable {
        Drawable::rect(DrawableConfig {
            x,
            y,
            width: side,
            height: side,
            ..DrawableConfig::default()
        })
    }

    #[test]
    fn config_defaults() {
        let config: DrawableConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DrawableConfig::default());
        assert_eq!(config.width, 10.0);
        assert!(config.visible);
        assert!(config.hoverable);
        assert!(!config.sticky);
    }

    #[test]
    fn null_fill_disables_fill() {
        let config: DrawableConfig = serde_json::from_str(r#"{ "fill": null }"#).unwrap();
        assert!(config.fill.is_none());
    }

    #[test]
    fn construction_generates_geometry() {
        let d = square_at(100.0, 100.0, 50.0);
        assert_eq!(d.bounds().size(), DVec2::new(50.0, 50.0));
        assert_eq!(d.position(), DVec2::new(100.0, 100.0));
        assert!(d.id().is_none());
    }

    #[test]
    fn hover_inside_and_outside() {
        let d = square_at(100.0, 100.0, 50.0);
        assert!(d.is_hover(DVec2::new(110.0, 110.0)));
        assert!(d.is_hover(DVec2::new(124.0, 76.0)));
        assert!(!d.is_hover(DVec2::new(126.0, 100.0)));
        assert!(!d.is_hover(DVec2::new(500.0, 500.0)));
    }

    #[test]
    fn hover_follows_rotation() {
        let mut d = Drawable::rect(DrawableConfig {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 10.0,
            ..DrawableConfig::default()
        });
        assert!(d.is_hover(DVec2::new(40.0, 0.0)));
        d.transform.rotate(Angle::Degrees(90.0));
        assert!(!d.is_hover(DVec2::new(40.0, 0.0)));
        assert!(d.is_hover(DVec2::new(0.0, 40.0)));
    }

    #[test]
    fn stroke_extends_hit_area() {
        let d = square_at(0.0, 0.0, 20.0).with_stroke(Color::BLACK, 6.0);
        // 2px outside the fill, inside the half stroke width
        assert!(d.is_hover(DVec2::new(12.0, 0.0)));
        assert!(!d.is_hover(DVec2::new(14.0, 0.0)));
    }

    #[test]
    fn ellipse_corners_miss() {
        let d = Drawable::ellipse(DrawableConfig {
            width: 20.0,
            height: 20.0,
            ..DrawableConfig::default()
        });
        assert!(d.is_hover(DVec2::new(0.0, 0.0)));
        assert!(!d.is_hover(DVec2::new(9.5, 9.5)));
    }

    #[test]
    fn singular_transform_never_hovers() {
        let mut d = square_at(0.0, 0.0, 20.0);
        d.transform.stretch(0.0, 0.0);
        assert!(!d.is_hover(DVec2::ZERO));
    }

    #[test]
    fn viewport_uses_half_size_margin() {
        let size = DVec2::new(800.0, 600.0);
        assert!(square_at(-20.0, 100.0, 50.0).in_viewport(size));
        assert!(!square_at(-30.0, 100.0, 50.0).in_viewport(size));
        assert!(square_at(820.0, 300.0, 50.0).in_viewport(size));
        assert!(!square_at(400.0, 630.0, 50.0).in_viewport(size));
    }

    #[test]
    fn regenerate_after_resize() {
        let mut d = square_at(0.0, 0.0, 10.0);
        d.size = DVec2::new(40.0, 40.0);
        assert_eq!(d.bounds().size(), DVec2::new(10.0, 10.0));
        d.generate();
        assert_eq!(d.bounds().size(), DVec2::new(40.0, 40.0));
    }
}
