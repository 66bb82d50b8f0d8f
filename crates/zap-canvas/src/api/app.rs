use serde::Deserialize;

use crate::core::surface::Surface;

/// Configuration for a surface, provided by the app.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Surface width in pixels (default: 800).
    pub width: f64,
    /// Surface height in pixels (default: 600).
    pub height: f64,
    /// Delay between pointer-down and drag start, in ms (default: 150).
    /// Guards against accidental micro-drags on a click.
    pub drag_delay_ms: f64,
    /// Period of the redraw-while-dragging interval, in ms (default: 16).
    pub drag_interval_ms: f64,
    /// Quiet time required after the last resize event, in ms (default: 100).
    pub resize_debounce_ms: f64,
    /// Optional half-width of a box around the pointer. Controls whose
    /// drawable center lies outside it skip exact hit testing.
    pub hit_radius: Option<f64>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            drag_delay_ms: 150.0,
            drag_interval_ms: 16.0,
            resize_debounce_ms: 100.0,
            hit_radius: None,
        }
    }
}

impl SurfaceConfig {
    /// Parse a JSON attribute bag. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The contract every hosted application fulfills.
pub trait App {
    /// Return surface configuration. Called once before init.
    fn config(&self) -> SurfaceConfig {
        SurfaceConfig::default()
    }

    /// Attach the initial entities.
    fn init(&mut self, surface: &mut Surface);

    /// Called once per host frame, before the surface advances.
    fn update(&mut self, _surface: &mut Surface, _now: f64) {}
}
