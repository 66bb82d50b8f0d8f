use thiserror::Error;

/// Errors raised by the surface.
///
/// Lookups on stale or unknown identifiers never produce an error; they
/// resolve to `None`, `false` or a zero count instead.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// An attribute bag named an entity kind the surface has no collection for.
    #[error("unsupported entity kind: {0:?}")]
    UnsupportedEntityKind(String),

    /// An attribute bag was not valid JSON or had a mistyped field.
    #[error("invalid entity descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),
}
