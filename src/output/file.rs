use super::OutputSink;
use crate::error::Result;
use crate::segmentation::{ChannelOrder, Image};
use std::path::{Path, PathBuf};

/// Writes images to a file, format chosen from the extension
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        tracing::debug!("Output file {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn write_image(&mut self, image: &Image) -> Result<()> {
        // Encoders expect RGB
        let buffer = image.to_order(ChannelOrder::Rgb);
        buffer.save(&self.path)?;

        tracing::info!(
            "Wrote {}x{} image to {}",
            buffer.width(),
            buffer.height(),
            self.path.display()
        );

        Ok(())
    }
}
