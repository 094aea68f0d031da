use super::ImageSource;
use crate::error::Result;
use crate::segmentation::Image;
use std::path::{Path, PathBuf};

/// Image decoded from a file on disk, in RGB order
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    fn load(&mut self) -> Result<Image> {
        tracing::debug!("Reading image from {}", self.path.display());

        let decoded = image::open(&self.path)?.to_rgb8();

        tracing::debug!(
            "Decoded {}x{} image",
            decoded.width(),
            decoded.height()
        );

        Ok(Image::rgb(decoded))
    }
}
