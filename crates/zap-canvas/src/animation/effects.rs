// animation/effects.rs
//
// Effect functions are stateless: everything they need to remember between
// ticks lives in the tween's Smuggler. Built-ins capture their start state
// (origin, angle, scale) on the first tick.

use std::fmt;
use std::rc::Rc;

use glam::DVec2;
use serde_json::{Map, Value};

use super::easing::Easing;
use crate::components::drawable::Drawable;

/// Per-tween parameter and scratch bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Smuggler {
    pub easing: Easing,
    /// Move: start position. Captured from the drawable when `None`.
    pub origin: Option<DVec2>,
    /// Rotate: start angle in degrees. Captured when `None`.
    pub start_angle: Option<f64>,
    /// Rotate: sweep in degrees. Move: heading in degrees.
    pub angle: f64,
    /// Move: travel distance in pixels.
    pub distance: f64,
    /// Rotate: sweep direction (default: clockwise, i.e. increasing angle).
    pub clockwise: bool,
    /// Scale: start scale. Captured when `None`.
    pub from_scale: Option<DVec2>,
    /// Scale: end scale.
    pub to_scale: DVec2,
    /// Free-form state for custom effects.
    pub payload: Map<String, Value>,
}

impl Default for Smuggler {
    fn default() -> Self {
        Self {
            easing: Easing::Linear,
            origin: None,
            start_angle: None,
            angle: 0.0,
            distance: 0.0,
            clockwise: true,
            from_scale: None,
            to_scale: DVec2::ONE,
            payload: Map::new(),
        }
    }
}

impl Smuggler {
    pub fn new(easing: Easing) -> Self {
        Self {
            easing,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_clockwise(mut self, clockwise: bool) -> Self {
        self.clockwise = clockwise;
        self
    }

    pub fn with_origin(mut self, origin: DVec2) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_scale(mut self, from: Option<DVec2>, to: DVec2) -> Self {
        self.from_scale = from;
        self.to_scale = to;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// What an effect sees on each tick.
pub struct Frame<'a> {
    /// Normalized time in [0, 1].
    pub t: f64,
    pub drawable: &'a mut Drawable,
    pub smuggler: &'a mut Smuggler,
}

impl Frame<'_> {
    /// `t` through the smuggler's easing curve.
    pub fn eased(&self) -> f64 {
        self.smuggler.easing.apply(self.t)
    }
}

pub type CustomEffect = Rc<dyn Fn(&mut Frame<'_>)>;

#[derive(Clone)]
pub enum Effect {
    /// Alpha from 0 to 1.
    FadeIn,
    /// Alpha from 1 to 0.
    FadeOut,
    /// Sweep `smuggler.angle` degrees from the start angle, wrapping at 360.
    Rotate,
    /// Travel `smuggler.distance` along heading `smuggler.angle`.
    Move,
    /// Interpolate from the start scale to `smuggler.to_scale`.
    Scale,
    Custom(CustomEffect),
}

impl Effect {
    pub fn custom(f: impl Fn(&mut Frame<'_>) + 'static) -> Self {
        Effect::Custom(Rc::new(f))
    }

    pub fn apply(&self, frame: &mut Frame<'_>) {
        let eased = frame.eased();
        match self {
            Effect::FadeIn => frame.drawable.style.alpha = eased,
            Effect::FadeOut => frame.drawable.style.alpha = 1.0 - eased,
            Effect::Rotate => {
                let current = frame.drawable.transform.angle();
                let start = *frame.smuggler.start_angle.get_or_insert(current);
                let sweep = if frame.smuggler.clockwise {
                    frame.smuggler.angle
                } else {
                    -frame.smuggler.angle
                };
                let angle = (start + sweep * eased).rem_euclid(360.0);
                frame.drawable.transform.set_angle(angle);
            }
            Effect::Move => {
                let current = frame.drawable.position();
                let origin = *frame.smuggler.origin.get_or_insert(current);
                let heading = frame.smuggler.angle.to_radians();
                let offset = DVec2::new(heading.cos(), heading.sin())
                    * frame.smuggler.distance
                    * eased;
                frame.drawable.set_position(origin + offset);
            }
            Effect::Scale => {
                let current = frame.drawable.transform.scale();
                let from = *frame.smuggler.from_scale.get_or_insert(current);
                let to = frame.smuggler.to_scale;
                frame.drawable.transform.set_scale(from.lerp(to, eased));
            }
            Effect::Custom(f) => f(frame),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::FadeIn => f.write_str("FadeIn"),
            Effect::FadeOut => f.write_str("FadeOut"),
            Effect::Rotate => f.write_str("Rotate"),
            Effect::Move => f.write_str("Move"),
            Effect::Scale => f.write_str("Scale"),
            Effect::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
