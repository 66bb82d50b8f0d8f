//! Lyon-based CPU render target.
//!
//! Tessellates filled and stroked paths through the current transform into a
//! flat triangle-list vertex buffer. Two buffers are kept: drawing writes the
//! working one, `present` swaps it into the visible one.
//!
//! Shadows are not rasterized by this target.

use bytemuck::{Pod, Zeroable};
use glam::DVec2;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use super::traits::{Color, DrawContext, RenderTarget, Style};
use crate::core::transform::Transform;

/// Per-vertex data for vector rendering.
/// 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorVertex {
    /// Number of floats per vertex.
    pub const FLOATS: usize = 6;
    /// Stride in bytes.
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4; // 24
}

/// Builds vertices in surface space: positions go through the transform
/// that was current when the draw call was issued.
struct VertexCtor {
    color: Color,
    transform: Transform,
}

impl VertexCtor {
    fn vertex(&self, x: f32, y: f32) -> VectorVertex {
        let p = self.transform.apply(DVec2::new(x as f64, y as f64));
        VectorVertex {
            x: p.x as f32,
            y: p.y as f32,
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
            a: self.color.a,
        }
    }
}

impl FillVertexConstructor<VectorVertex> for VertexCtor {
    fn new_vertex(&mut self, vertex: FillVertex) -> VectorVertex {
        self.vertex(vertex.position().x, vertex.position().y)
    }
}

impl StrokeVertexConstructor<VectorVertex> for VertexCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> VectorVertex {
        self.vertex(vertex.position().x, vertex.position().y)
    }
}

pub struct VectorTarget {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<VectorVertex, u32>,
    /// Working buffer, written by draw calls.
    back: Vec<VectorVertex>,
    /// Visible buffer, replaced on `present`.
    front: Vec<VectorVertex>,
    transform: Transform,
    style: Style,
    stack: Vec<(Transform, Style)>,
    size: DVec2,
    frames: u64,
}

impl VectorTarget {
    pub fn new() -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            back: Vec::with_capacity(4096),
            front: Vec::with_capacity(4096),
            transform: Transform::IDENTITY,
            style: Style::default(),
            stack: Vec::new(),
            size: DVec2::ZERO,
            frames: 0,
        }
    }

    /// Vertices of the last presented frame.
    pub fn vertices(&self) -> &[VectorVertex] {
        &self.front
    }

    /// The presented frame as a flat float slice (for upload).
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.front)
    }

    /// Number of vertices in the presented frame.
    pub fn vertex_count(&self) -> usize {
        self.front.len()
    }

    /// Number of vertices drawn since `begin_frame` that are not yet visible.
    pub fn pending_vertex_count(&self) -> usize {
        self.back.len()
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn size(&self) -> DVec2 {
        self.size
    }

    fn paint(&self, color: Color) -> VertexCtor {
        VertexCtor {
            color: color.with_alpha(color.a * self.style.alpha.clamp(0.0, 1.0) as f32),
            transform: self.transform,
        }
    }

    /// Flush indexed geometry to the working buffer as a triangle list.
    fn flush_geometry(&mut self) {
        for idx in &self.geometry.indices {
            self.back.push(self.geometry.vertices[*idx as usize]);
        }
        self.geometry.vertices.clear();
        self.geometry.indices.clear();
    }
}

impl Default for VectorTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawContext for VectorTarget {
    fn save(&mut self) {
        self.stack.push((self.transform, self.style));
    }

    fn restore(&mut self) {
        if let Some((transform, style)) = self.stack.pop() {
            self.transform = transform;
            self.style = style;
        }
    }

    fn set_transform(&mut self, transform: &Transform) {
        self.transform = *transform;
    }

    fn set_style(&mut self, style: &Style) {
        self.style = *style;
    }

    fn fill(&mut self, path: &Path) {
        let Some(color) = self.style.fill else {
            return;
        };
        let ctor = self.paint(color);
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(0.5),
            &mut BuffersBuilder::new(&mut self.geometry, ctor),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(err) => {
                log::trace!("fill tessellation failed: {:?}", err);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }

    fn stroke(&mut self, path: &Path) {
        let Some(color) = self.style.stroke else {
            return;
        };
        if self.style.line_width <= 0.0 {
            return;
        }
        let ctor = self.paint(color);
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(0.5).with_line_width(self.style.line_width as f32),
            &mut BuffersBuilder::new(&mut self.geometry, ctor),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(err) => {
                log::trace!("stroke tessellation failed: {:?}", err);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }
}

impl RenderTarget for VectorTarget {
    fn backend(&self) -> &'static str {
        "vector"
    }

    fn begin_frame(&mut self, width: f64, height: f64) {
        self.back.clear();
        self.stack.clear();
        self.transform = Transform::IDENTITY;
        self.style = Style::default();
        self.size = DVec2::new(width, height);
    }

    fn present(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        self.back.clear();
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;
    use std::mem::size_of;

    fn square(half: f32) -> Path {
        let mut builder = Path::builder();
        builder.begin(point(-half, -half));
        builder.line_to(point(half, -half));
        builder.line_to(point(half, half));
        builder.line_to(point(-half, half));
        builder.close();
        builder.build()
    }

    #[test]
    fn vector_vertex_is_24_bytes() {
        assert_eq!(size_of::<VectorVertex>(), 24);
        assert_eq!(VectorVertex::STRIDE_BYTES, 24);
    }

    #[test]
    fn fill_square_produces_two_triangles() {
        let mut target = VectorTarget::new();
        target.begin_frame(100.0, 100.0);
        target.fill(&square(10.0));
        assert_eq!(target.pending_vertex_count(), 6);
    }

    #[test]
    fn nothing_is_visible_until_present() {
        let mut target = VectorTarget::new();
        target.begin_frame(100.0, 100.0);
        target.fill(&square(10.0));
        assert_eq!(target.vertex_count(), 0);
        target.present();
        assert_eq!(target.vertex_count(), 6);
        assert_eq!(target.pending_vertex_count(), 0);
        assert_eq!(target.frames(), 1);
    }

    #[test]
    fn vertices_go_through_transform() {
        let mut target = VectorTarget::new();
        target.begin_frame(100.0, 100.0);
        target.set_transform(&Transform::from_translation(DVec2::new(50.0, 40.0)));
        target.fill(&square(10.0));
        target.present();
        for v in target.vertices() {
            assert!(v.x >= 40.0 && v.x <= 60.0, "x was {}", v.x);
            assert!(v.y >= 30.0 && v.y <= 50.0, "y was {}", v.y);
        }
    }

    #[test]
    fn alpha_multiplies_color() {
        let mut target = VectorTarget::new();
        target.begin_frame(100.0, 100.0);
        target.set_style(&Style {
            fill: Some(Color::RED),
            alpha: 0.5,
            ..Style::default()
        });
        target.fill(&square(10.0));
        target.present();
        assert!(target.vertices().iter().all(|v| (v.a - 0.5).abs() < 1e-6));
    }

    #[test]
    fn stroke_without_color_draws_nothing() {
        let mut target = VectorTarget::new();
        target.begin_frame(100.0, 100.0);
        target.stroke(&square(10.0));
        assert_eq!(target.pending_vertex_count(), 0);

        target.set_style(&Style {
            stroke: Some(Color::BLACK),
            line_width: 2.0,
            ..Style::default()
        });
        target.stroke(&square(10.0));
        assert!(target.pending_vertex_count() > 0);
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut target = VectorTarget::new();
        target.begin_frame(10.0, 10.0);
        target.save();
        target.set_transform(&Transform::from_translation(DVec2::new(5.0, 5.0)));
        target.set_style(&Style {
            fill: None,
            ..Style::default()
        });
        target.restore();
        target.fill(&square(1.0));
        target.present();
        assert_eq!(target.vertex_count(), 6);
        assert!(target.vertices().iter().all(|v| v.x.abs() <= 1.0));
    }
}
