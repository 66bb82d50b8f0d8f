pub mod easing;
pub mod effects;
pub mod tween;
