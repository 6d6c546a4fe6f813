//! Errors

use thiserror::Error;

/// Errors raised by the hider
#[derive(Debug, Error)]
pub enum HiderError {
    /// Configuration that should have been rejected before rendering
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// Micropolygon with coincident or collinear corners
    #[error("degenerate micropolygon")]
    DegenerateMicroPolygon,
    /// Visibility entry refers to a node that is not a CSG primitive
    #[error("CSG node {node} is not a primitive of its tree")]
    CsgMissingNode { node: usize },
    /// Child index not after its parent, so the tree may loop
    #[error("CSG node {node} has child {child} that does not come after it")]
    CsgCycle { node: usize, child: usize },
    #[error("unknown channel `{0}`")]
    UnknownChannel(String),
    /// Bucket does not fit inside the display
    #[error("bucket {x},{y} {width}x{height} lies outside the display")]
    DisplaySize { x: i32, y: i32, width: i32, height: i32 },
    #[error("render cancelled")]
    Cancelled,
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, HiderError>;
