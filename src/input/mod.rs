mod file;

pub use file::FileSource;

use crate::error::Result;
use crate::segmentation::Image;

/// Trait for image sources
pub trait ImageSource {
    /// Decode one image
    fn load(&mut self) -> Result<Image>;
}
