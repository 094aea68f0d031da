mod composite;
mod file;

pub use composite::{highlight, replace_background, HighlightWeights};
pub use file::FileSink;

use crate::error::Result;
use crate::segmentation::Image;

/// Trait for output destinations
pub trait OutputSink {
    /// Encode and write one image
    fn write_image(&mut self, image: &Image) -> Result<()>;
}
