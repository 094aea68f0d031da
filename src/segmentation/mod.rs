mod filter;
#[cfg(feature = "onnxruntime")]
mod onnx;
mod preprocess;
mod refiner;
mod runtime;
mod tract;
pub mod types;

pub use filter::JointBilateralFilter;
#[cfg(feature = "onnxruntime")]
pub use onnx::OrtSegmenter;
pub use preprocess::{threshold_invert, upscale_plane, Preprocessor, DEFAULT_THRESHOLD};
pub use refiner::{MaskRefiner, RefinerConfig, Refinement};
pub use runtime::{load_segmenter, Device, InferenceConfig, Runtime, RuntimePreference};
pub use tract::TractSegmenter;
pub use types::{
    ChannelOrder, ConfidencePlane, Image, InputTensor, Mask, OutputPlanes, SegmentationModel,
};

use crate::error::Result;

/// Load the model described by `inference` and wrap it in a refiner
pub fn create_refiner(
    inference: &InferenceConfig,
    config: RefinerConfig,
) -> Result<MaskRefiner<Box<dyn SegmentationModel>>> {
    let model = load_segmenter(inference)?;
    Ok(MaskRefiner::with_config(model, config))
}
