use std::path::PathBuf;

/// Errors surfaced by the segmentation pipeline.
///
/// Construction failures and inference failures are both fatal for the
/// caller; nothing in the pipeline retries or degrades on these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("model file not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("failed to load model from {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("inference runtime {0} is not available")]
    RuntimeUnavailable(&'static str),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("tensor shape {actual:?} does not match expected {expected:?}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("image dimensions {actual:?} do not match {expected:?}")]
    Dimensions {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
