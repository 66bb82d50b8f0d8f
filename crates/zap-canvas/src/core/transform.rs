//! 2×3 affine matrix shared by every positioned entity.
//!
//! Layout follows the canvas convention `[a b c d e f]`, i.e. the matrix
//!
//! ```text
//! | a c e |
//! | b d f |
//! ```
//!
//! Orientation operations compose onto the `a b c d` block; `e f` is the
//! translation and only `translate`/`set_translation` touch it.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;

/// Angle accepted by [`Transform::rotate`] and [`Transform::reflect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Angle {
    Radians(f64),
    Degrees(f64),
}

impl Angle {
    pub fn radians(self) -> f64 {
        match self {
            Angle::Radians(r) => r,
            Angle::Degrees(d) => d.to_radians(),
        }
    }
}

/// Angles within this many degrees of 360 are reported as 0.
const ANGLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn from_translation(at: DVec2) -> Self {
        Self {
            e: at.x,
            f: at.y,
            ..Self::IDENTITY
        }
    }

    /// Add a raw offset to the translation, ignoring orientation and scale.
    pub fn translate(&mut self, by: DVec2) -> &mut Self {
        self.e += by.x;
        self.f += by.y;
        self
    }

    /// Compose a rotation. Repeated calls accumulate; scale is preserved.
    pub fn rotate(&mut self, angle: Angle) -> &mut Self {
        let (s, c) = exact_sin_cos(angle.radians());
        let rotation = Transform::new(c, s, -s, c, 0.0, 0.0);
        let mut rotated = rotation;
        rotated.multiply(self);
        self.a = rotated.a;
        self.b = rotated.b;
        self.c = rotated.c;
        self.d = rotated.d;
        self
    }

    /// Compose a reflection across the axis through the origin at `axis`.
    pub fn reflect(&mut self, axis: Angle) -> &mut Self {
        let (s, c) = exact_sin_cos(2.0 * axis.radians());
        self.multiply(&Transform::new(c, s, s, -c, 0.0, 0.0))
    }

    /// Compose a scale along the local axes.
    pub fn stretch(&mut self, x: f64, y: f64) -> &mut Self {
        self.multiply(&Transform::new(x, 0.0, 0.0, y, 0.0, 0.0))
    }

    /// Compose a shear. Both angles are in degrees.
    ///
    /// After a shear, [`angle`](Self::angle) and [`scale`](Self::scale) no
    /// longer decompose the matrix exactly.
    pub fn shear(&mut self, x: f64, y: f64) -> &mut Self {
        let sx = x.to_radians().tan();
        let sy = y.to_radians().tan();
        self.multiply(&Transform::new(1.0, sy, sx, 1.0, 0.0, 0.0))
    }

    /// `self = self × other` on the orientation block only; `e f` are untouched.
    pub fn multiply(&mut self, other: &Transform) -> &mut Self {
        let a = self.a * other.a + self.c * other.b;
        let b = self.b * other.a + self.d * other.b;
        let c = self.a * other.c + self.c * other.d;
        let d = self.b * other.c + self.d * other.d;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self
    }

    /// Rotation in degrees, normalized to `[0, 360)`.
    pub fn angle(&self) -> f64 {
        let degrees = self.b.atan2(self.a).to_degrees().rem_euclid(360.0);
        if degrees >= 360.0 - ANGLE_EPSILON {
            0.0
        } else {
            degrees
        }
    }

    /// `(scale_x, scale_y)` recovered from the orientation block.
    pub fn scale(&self) -> DVec2 {
        let sx = self.a.hypot(self.b);
        if sx == 0.0 {
            // degenerate x axis: best effort
            return DVec2::new(0.0, self.c.hypot(self.d));
        }
        let sy = (self.a * self.d - self.c * self.b) / sx;
        DVec2::new(sx, sy)
    }

    pub fn translation(&self) -> DVec2 {
        DVec2::new(self.e, self.f)
    }

    pub fn set_translation(&mut self, at: DVec2) -> &mut Self {
        self.e = at.x;
        self.f = at.y;
        self
    }

    /// Rotate so that [`angle`](Self::angle) reports `degrees`.
    pub fn set_angle(&mut self, degrees: f64) -> &mut Self {
        let delta = degrees - self.angle();
        self.rotate(Angle::Degrees(delta))
    }

    /// Rebuild the orientation block with the current angle and a new scale.
    /// Discards any shear.
    pub fn set_scale(&mut self, scale: DVec2) -> &mut Self {
        let (s, c) = exact_sin_cos(self.angle().to_radians());
        self.a = c * scale.x;
        self.b = s * scale.x;
        self.c = -s * scale.y;
        self.d = c * scale.y;
        self
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Map a local point into the parent space.
    pub fn apply(&self, p: DVec2) -> DVec2 {
        DVec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Full inverse, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// `sin_cos` that returns exact values on quarter turns, so that rotating by
/// 90° and back lands on the identity instead of a 1e-16 residue.
fn exact_sin_cos(radians: f64) -> (f64, f64) {
    let quarters = radians / FRAC_PI_2;
    let rounded = quarters.round();
    if (quarters - rounded).abs() < 1e-12 {
        match (rounded as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        radians.sin_cos()
    }
}
