use super::filter::JointBilateralFilter;
use super::preprocess::{threshold_invert, upscale_plane, Preprocessor, DEFAULT_THRESHOLD};
use super::types::{ChannelOrder, Image, Mask, SegmentationModel};
use crate::error::{Error, Result};
use image::{imageops::FilterType, GrayImage};

/// Tunables for turning raw confidence planes into a mask
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinerConfig {
    /// Interpolation for both the downscale to model size and the upscale back
    pub resize_filter: FilterType,
    /// Channel order the network expects its input in
    pub model_channel_order: ChannelOrder,
    pub threshold: f32,
    pub filter: JointBilateralFilter,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            resize_filter: FilterType::Triangle,
            model_channel_order: ChannelOrder::Bgr,
            threshold: DEFAULT_THRESHOLD,
            filter: JointBilateralFilter::default(),
        }
    }
}

/// A mask together with the intermediate planes it was fused from
#[derive(Debug, Clone)]
pub struct Refinement {
    pub mask: Mask,
    /// Thresholded and inverted foreground plane at model resolution
    pub foreground_inverted: GrayImage,
    /// Thresholded and inverted background plane at model resolution
    pub background_inverted: GrayImage,
}

/// Turns a photograph into an edge-aware foreground mask of the same size
pub struct MaskRefiner<M> {
    model: M,
    preprocessor: Preprocessor,
    config: RefinerConfig,
}

impl<M: SegmentationModel> MaskRefiner<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, RefinerConfig::default())
    }

    pub fn with_config(model: M, config: RefinerConfig) -> Self {
        let preprocessor = Preprocessor::new(config.resize_filter, config.model_channel_order);
        Self {
            model,
            preprocessor,
            config,
        }
    }

    pub fn config(&self) -> &RefinerConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Compute the foreground mask for `original`
    ///
    /// The returned mask always has the dimensions of `original`.
    pub fn refine(&mut self, original: &Image) -> Result<Mask> {
        Ok(self.refine_with_planes(original)?.mask)
    }

    /// Like [`refine`](Self::refine), also returning the inverted planes
    pub fn refine_with_planes(&mut self, original: &Image) -> Result<Refinement> {
        let _span = tracing::debug_span!("refine").entered();

        let (width, height) = original.dimensions();

        let input = self.preprocessor.preprocess(original)?;
        let planes = self.model.segment(&input)?;

        let foreground_inverted = threshold_invert(&planes.foreground, self.config.threshold);
        let background_inverted = threshold_invert(&planes.background, self.config.threshold);

        let filter = self.config.resize_filter;
        let foreground_resized = upscale_plane(&foreground_inverted, width, height, filter);
        let background_resized = upscale_plane(&background_inverted, width, height, filter);

        // Background is smoothed, foreground supplies the edges
        let fused = self
            .config
            .filter
            .apply(&foreground_resized, &background_resized)?;

        let mask = Mask::from_luma(&fused);
        if mask.dimensions() != (width, height) {
            return Err(Error::Dimensions {
                expected: (width, height),
                actual: mask.dimensions(),
            });
        }

        tracing::debug!("Refined {}x{} mask", width, height);

        Ok(Refinement {
            mask,
            foreground_inverted,
            background_inverted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::runtime::Runtime;
    use crate::segmentation::types::{ConfidencePlane, InputTensor, OutputPlanes};
    use image::{Rgb, RgbImage};

    struct Fixed {
        planes: OutputPlanes,
        calls: usize,
    }

    impl SegmentationModel for Fixed {
        fn segment(&mut self, _input: &InputTensor) -> Result<OutputPlanes> {
            self.calls += 1;
            Ok(self.planes.clone())
        }

        fn runtime(&self) -> Runtime {
            Runtime::Tract
        }
    }

    fn fixed(foreground: f32, background: f32) -> Fixed {
        Fixed {
            planes: OutputPlanes {
                foreground: ConfidencePlane::filled(foreground),
                background: ConfidencePlane::filled(background),
            },
            calls: 0,
        }
    }

    #[test]
    fn confident_person_yields_full_mask() {
        let mut refiner = MaskRefiner::new(fixed(0.9, 0.1));
        let image = Image::rgb(RgbImage::from_pixel(40, 30, Rgb([1, 2, 3])));

        let refinement = refiner.refine_with_planes(&image).unwrap();
        assert!(refinement.foreground_inverted.pixels().all(|p| p[0] == 0));
        assert!(refinement.background_inverted.pixels().all(|p| p[0] == 255));
        assert_eq!(refinement.mask.dimensions(), (40, 30));
        assert!(refinement.mask.as_image().pixels().all(|p| p.0 == [255, 255, 255]));
        assert_eq!(refiner.model().calls, 1);
    }

    #[test]
    fn confident_background_yields_empty_mask() {
        let mut refiner = MaskRefiner::new(fixed(0.1, 0.9));
        let image = Image::bgr(RgbImage::from_pixel(33, 17, Rgb([200, 100, 0])));

        let mask = refiner.refine(&image).unwrap();
        assert_eq!(mask.dimensions(), (33, 17));
        assert!(mask.as_image().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn config_is_kept() {
        let config = RefinerConfig {
            threshold: 0.7,
            ..RefinerConfig::default()
        };
        let refiner = MaskRefiner::with_config(fixed(0.6, 0.6), config);
        assert_eq!(refiner.config().threshold, 0.7);
        assert_eq!(refiner.config().model_channel_order, ChannelOrder::Bgr);
    }
}
