use super::runtime::Runtime;
use super::types::{InputTensor, OutputPlanes, SegmentationModel, INPUT_SHAPE};
use crate::error::{Error, Result};
use std::path::Path;
use tract_onnx::prelude::*;

type Plan = TypedRunnableModel<TypedModel>;

/// Human segmentation network running on tract
///
/// Used when ONNX Runtime is unavailable. The input fact is pinned to the
/// fixed (1, 144, 256, 3) shape so the whole graph is optimised once.
pub struct TractSegmenter {
    plan: Plan,
}

impl TractSegmenter {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmentation model from {} with tract", path.display());

        let plan = build_plan(path).map_err(|e| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

        tracing::info!("Segmentation model loaded successfully");

        Ok(Self { plan })
    }
}

fn build_plan(path: &Path) -> TractResult<Plan> {
    let input_shape: TVec<usize> = INPUT_SHAPE.iter().copied().collect();
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), input_shape))?
        .into_optimized()?
        .into_runnable()
}

impl SegmentationModel for TractSegmenter {
    fn segment(&mut self, input: &InputTensor) -> Result<OutputPlanes> {
        let _span = tracing::debug_span!("inference", runtime = "tract").entered();

        let tensor = Tensor::from_shape(&INPUT_SHAPE, input.as_slice())
            .map_err(|e| Error::Inference(format!("{e:#}")))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| Error::Inference(format!("{e:#}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| Error::Inference("model produced no outputs".into()))?;
        let data = output
            .as_slice::<f32>()
            .map_err(|e| Error::Inference(format!("{e:#}")))?;

        OutputPlanes::from_nhwc(output.shape(), data)
    }

    fn runtime(&self) -> Runtime {
        Runtime::Tract
    }
}
