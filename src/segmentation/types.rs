use crate::error::{Error, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::{s, Array2, Array4, ArrayView4};
use std::borrow::Cow;

use super::runtime::Runtime;

/// Width of the network input, in pixels
pub const MODEL_INPUT_WIDTH: u32 = 256;

/// Height of the network input, in pixels
pub const MODEL_INPUT_HEIGHT: u32 = 144;

/// NHWC shape of the network input
pub const INPUT_SHAPE: [usize; 4] = [1, MODEL_INPUT_HEIGHT as usize, MODEL_INPUT_WIDTH as usize, 3];

/// Number of confidence planes the network emits (foreground, background)
pub const OUTPUT_CHANNELS: usize = 2;

/// Order of the three samples in each pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// An 8-bit, 3-channel image that knows its own channel order
///
/// The buffer type is `RgbImage` for both orders; `order` says how to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    buffer: RgbImage,
    order: ChannelOrder,
}

impl Image {
    pub fn new(buffer: RgbImage, order: ChannelOrder) -> Self {
        Self { buffer, order }
    }

    pub fn rgb(buffer: RgbImage) -> Self {
        Self::new(buffer, ChannelOrder::Rgb)
    }

    pub fn bgr(buffer: RgbImage) -> Self {
        Self::new(buffer, ChannelOrder::Bgr)
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn as_buffer(&self) -> &RgbImage {
        &self.buffer
    }

    pub fn into_buffer(self) -> RgbImage {
        self.buffer
    }

    /// Buffer with samples laid out in `order`, borrowed when no swap is needed
    pub fn to_order(&self, order: ChannelOrder) -> Cow<'_, RgbImage> {
        if order == self.order {
            return Cow::Borrowed(&self.buffer);
        }

        let mut swapped = self.buffer.clone();
        for pixel in swapped.pixels_mut() {
            pixel.0.swap(0, 2);
        }
        Cow::Owned(swapped)
    }

    /// Same pixels re-encoded in `order`
    pub fn converted(self, order: ChannelOrder) -> Self {
        if order == self.order {
            return self;
        }
        let buffer = self.to_order(order).into_owned();
        Self { buffer, order }
    }
}

/// Network input: float32 NHWC tensor of shape (1, 144, 256, 3), values in [0, 1]
#[derive(Debug, Clone)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    /// Wrap an array, rejecting any shape other than (1, 144, 256, 3)
    pub fn new(array: Array4<f32>) -> Result<Self> {
        if array.shape() != INPUT_SHAPE {
            return Err(Error::Shape {
                expected: INPUT_SHAPE.to_vec(),
                actual: array.shape().to_vec(),
            });
        }

        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };

        Ok(Self(array))
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    /// Row-major samples; the constructor guarantees standard layout
    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice().unwrap_or_default()
    }
}

/// Per-pixel class confidence at model resolution, shape (144, 256)
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidencePlane(Array2<f32>);

impl ConfidencePlane {
    pub fn new(array: Array2<f32>) -> Result<Self> {
        let expected = [MODEL_INPUT_HEIGHT as usize, MODEL_INPUT_WIDTH as usize];
        if array.shape() != expected {
            return Err(Error::Shape {
                expected: expected.to_vec(),
                actual: array.shape().to_vec(),
            });
        }
        Ok(Self(array))
    }

    /// Plane with every pixel set to `value`
    pub fn filled(value: f32) -> Self {
        Self(Array2::from_elem(
            (MODEL_INPUT_HEIGHT as usize, MODEL_INPUT_WIDTH as usize),
            value,
        ))
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.0
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.0[[y as usize, x as usize]]
    }
}

/// The two confidence planes produced by one inference call
///
/// Both planes are owned copies, independent of the engine's buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPlanes {
    pub foreground: ConfidencePlane,
    pub background: ConfidencePlane,
}

impl OutputPlanes {
    /// Split the engine output of shape (1, 144, 256, 2) into its two planes
    ///
    /// Channel 0 is foreground, channel 1 is background.
    pub fn from_nhwc(shape: &[usize], data: &[f32]) -> Result<Self> {
        let expected = [
            1,
            MODEL_INPUT_HEIGHT as usize,
            MODEL_INPUT_WIDTH as usize,
            OUTPUT_CHANNELS,
        ];
        let shape_error = || Error::Shape {
            expected: expected.to_vec(),
            actual: shape.to_vec(),
        };

        if shape != expected {
            return Err(shape_error());
        }

        let output = ArrayView4::from_shape(expected, data).map_err(|_| shape_error())?;

        Ok(Self {
            foreground: ConfidencePlane(output.slice(s![0, .., .., 0]).to_owned()),
            background: ConfidencePlane(output.slice(s![0, .., .., 1]).to_owned()),
        })
    }
}

/// Fused foreground mask, three identical channels, same size as the input image
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(RgbImage);

impl Mask {
    /// Replicate a single-channel mask across three channels
    pub fn from_luma(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        Self(RgbImage::from_fn(width, height, |x, y| {
            let value = gray.get_pixel(x, y)[0];
            Rgb([value, value, value])
        }))
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.0.get_pixel(x, y)[0]
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_image(self) -> RgbImage {
        self.0
    }

    pub fn to_luma(&self) -> GrayImage {
        let (width, height) = self.0.dimensions();
        GrayImage::from_fn(width, height, |x, y| Luma([self.value(x, y)]))
    }
}

/// Trait for inference engines
///
/// Implementations allocate everything they need at construction so that
/// `segment` can be called repeatedly. Calls on one instance must be
/// serialised, which `&mut self` enforces.
pub trait SegmentationModel {
    /// Run the network on one preprocessed input tensor
    fn segment(&mut self, input: &InputTensor) -> Result<OutputPlanes>;

    /// Which runtime backs this model
    fn runtime(&self) -> Runtime;
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for Box<M> {
    fn segment(&mut self, input: &InputTensor) -> Result<OutputPlanes> {
        (**self).segment(input)
    }

    fn runtime(&self) -> Runtime {
        (**self).runtime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_tensor_rejects_wrong_shape() {
        let err = InputTensor::new(Array4::zeros((1, 256, 144, 3))).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
        assert!(InputTensor::new(Array4::zeros((1, 144, 256, 3))).is_ok());
    }

    #[test]
    fn input_tensor_normalises_layout() {
        let nchw = Array4::<f32>::from_shape_fn((1, 3, 144, 256), |(_, c, y, x)| {
            (c * 1000 + y * 10 + x) as f32
        });
        let nhwc = nchw.permuted_axes([0, 2, 3, 1]);
        let tensor = InputTensor::new(nhwc).unwrap();

        let slice = tensor.as_slice();
        assert_eq!(slice.len(), 144 * 256 * 3);
        // pixel (0, 1): R, G, B
        assert_eq!(&slice[3..6], &[1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn output_planes_split_interleaved_channels() {
        let len = 144 * 256 * 2;
        let data: Vec<f32> = (0..len)
            .map(|i| if i % 2 == 0 { 0.9 } else { 0.1 })
            .collect();

        let planes = OutputPlanes::from_nhwc(&[1, 144, 256, 2], &data).unwrap();
        assert!(planes.foreground.as_array().iter().all(|&v| v == 0.9));
        assert!(planes.background.as_array().iter().all(|&v| v == 0.1));
    }

    #[test]
    fn output_planes_reject_other_shapes() {
        let data = vec![0.0; 144 * 256];
        assert!(OutputPlanes::from_nhwc(&[1, 144, 256, 1], &data).is_err());
        assert!(OutputPlanes::from_nhwc(&[1, 144, 256, 2], &data).is_err());
    }

    #[test]
    fn to_order_swaps_red_and_blue() {
        let buffer = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let image = Image::rgb(buffer);

        assert!(matches!(image.to_order(ChannelOrder::Rgb), Cow::Borrowed(_)));
        let bgr = image.to_order(ChannelOrder::Bgr);
        assert_eq!(bgr.get_pixel(1, 1).0, [30, 20, 10]);

        let converted = image.converted(ChannelOrder::Bgr);
        assert_eq!(converted.order(), ChannelOrder::Bgr);
        assert_eq!(converted.as_buffer().get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn mask_replicates_luma() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x + y * 3) as u8 * 40]));
        let mask = Mask::from_luma(&gray);

        assert_eq!(mask.dimensions(), (3, 2));
        assert_eq!(mask.as_image().get_pixel(2, 1).0, [200, 200, 200]);
        assert_eq!(mask.to_luma(), gray);
    }
}
