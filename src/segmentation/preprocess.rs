use super::types::{
    ChannelOrder, ConfidencePlane, Image, InputTensor, MODEL_INPUT_HEIGHT, MODEL_INPUT_WIDTH,
};
use crate::error::Result;
use image::{imageops, GrayImage, Luma};
use ndarray::Array4;

/// Confidence above which a pixel counts as belonging to a plane's class
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Preprocessor for converting images to model input tensors
pub struct Preprocessor {
    filter: imageops::FilterType,
    model_order: ChannelOrder,
}

impl Preprocessor {
    /// # Arguments
    /// * `filter` - Interpolation used for resizing down to the model input
    /// * `model_order` - Channel order the network was trained on
    pub fn new(filter: imageops::FilterType, model_order: ChannelOrder) -> Self {
        Self {
            filter,
            model_order,
        }
    }

    /// Preprocess an image into a normalized NHWC tensor
    ///
    /// Steps:
    /// 1. Reorder channels to the model's order
    /// 2. Resize to 256x144
    /// 3. Convert to float and normalize to [0, 1]
    ///
    /// Returns: tensor with shape [1, 144, 256, 3]
    pub fn preprocess(&self, image: &Image) -> Result<InputTensor> {
        let _span = tracing::debug_span!("preprocess").entered();

        let ordered = image.to_order(self.model_order);
        let resized = if ordered.dimensions() != (MODEL_INPUT_WIDTH, MODEL_INPUT_HEIGHT) {
            imageops::resize(
                &*ordered,
                MODEL_INPUT_WIDTH,
                MODEL_INPUT_HEIGHT,
                self.filter,
            )
        } else {
            ordered.into_owned()
        };

        let tensor = Array4::from_shape_fn(
            (1, MODEL_INPUT_HEIGHT as usize, MODEL_INPUT_WIDTH as usize, 3),
            |(_, y, x, c)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
        );

        InputTensor::new(tensor)
    }
}

/// Threshold a confidence plane and flip its polarity
///
/// Pixels with confidence above `threshold` become 0, all others 255.
/// NaN compares false and so becomes 255.
pub fn threshold_invert(plane: &ConfidencePlane, threshold: f32) -> GrayImage {
    GrayImage::from_fn(MODEL_INPUT_WIDTH, MODEL_INPUT_HEIGHT, |x, y| {
        if plane.get(x, y) > threshold {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Resize a model-resolution plane back to the original image size
pub fn upscale_plane(
    plane: &GrayImage,
    width: u32,
    height: u32,
    filter: imageops::FilterType,
) -> GrayImage {
    let _span = tracing::debug_span!("postprocess").entered();

    if plane.dimensions() == (width, height) {
        return plane.clone();
    }

    imageops::resize(plane, width, height, filter)
}
