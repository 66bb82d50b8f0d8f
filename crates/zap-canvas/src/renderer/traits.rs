//! Drawing contract between the surface and a raster backend.
//!
//! The surface never rasterizes anything itself. Each frame it hands a
//! [`RenderTarget`] the drawables in order: transform, style, then a fill or
//! stroke of a lyon path. Backends: [`VectorTarget`](super::vector::VectorTarget)
//! (CPU tessellation) in this crate, a 2D canvas in `zap-canvas-web`.

use lyon::path::Path;
use serde::Deserialize;

use crate::core::transform::Transform;

/// RGBA color, components in 0.0 - 1.0.
///
/// Deserializes from a `[r, g, b, a]` array.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f32; 4]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGB u8 values (0-255) with full opacity.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Per-drawable paint state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Fill color; `None` skips the fill pass.
    pub fill: Option<Color>,
    /// Stroke color; `None` skips the stroke pass.
    pub stroke: Option<Color>,
    pub line_width: f64,
    /// Global opacity multiplier (0.0 - 1.0).
    pub alpha: f64,
    pub shadow_blur: f64,
    pub shadow_color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Color::WHITE),
            stroke: None,
            line_width: 1.0,
            alpha: 1.0,
            shadow_blur: 0.0,
            shadow_color: Color::TRANSPARENT,
        }
    }
}

/// Immediate-mode drawing calls issued by drawables.
pub trait DrawContext {
    /// Push transform and style.
    fn save(&mut self);

    /// Pop the state pushed by the matching `save`.
    fn restore(&mut self);

    /// Replace the current transform.
    fn set_transform(&mut self, transform: &Transform);

    /// Replace the current style.
    fn set_style(&mut self, style: &Style);

    /// Fill `path` (local coordinates) with the current fill color.
    fn fill(&mut self, path: &Path);

    /// Stroke `path` (local coordinates) with the current stroke color and width.
    fn stroke(&mut self, path: &Path);
}

/// A double-buffered drawing surface.
///
/// Drawing calls go to a working buffer; `present` composites it to the
/// visible buffer in one step so a partially drawn frame is never shown.
pub trait RenderTarget: DrawContext {
    /// Backend identifier (e.g. "vector", "canvas2d").
    fn backend(&self) -> &'static str;

    /// Clear the working buffer and size it for this frame.
    fn begin_frame(&mut self, width: f64, height: f64);

    /// Composite the working buffer to the visible buffer.
    fn present(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_constructors() {
        let c = Color::rgb8(255, 128, 0);
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.5).abs() < 0.01);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);
        assert_eq!(Color::RED.with_alpha(0.5).a, 0.5);
    }

    #[test]
    fn color_deserializes_from_array() {
        let c: Color = serde_json::from_str("[0.1, 0.2, 0.3, 0.4]").unwrap();
        assert_eq!(c, Color::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn default_style_fills_opaque_white() {
        let style = Style::default();
        assert_eq!(style.fill, Some(Color::WHITE));
        assert!(style.stroke.is_none());
        assert_eq!(style.alpha, 1.0);
    }
}
