pub mod traits;
pub mod vector;

// Re-export key types for convenient access
pub use traits::{Color, DrawContext, RenderTarget, Style};
pub use vector::{VectorTarget, VectorVertex};
