use super::runtime::{Device, Runtime};
use super::types::{InputTensor, OutputPlanes, SegmentationModel, INPUT_SHAPE};
use crate::error::{Error, Result};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    TensorRTExecutionProvider,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ndarray::Array4;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;

/// Human segmentation network running on ONNX Runtime
///
/// The session and the input tensor are built once; each `segment` call
/// copies its input into that tensor and reuses both.
pub struct OrtSegmenter {
    session: Session,
    input: Tensor<f32>,
    input_name: String,
    output_name: String,
}

impl OrtSegmenter {
    /// Load the model and build an optimised session
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX export of the segmentation model
    /// * `device` - Preferred execution provider, CPU is always registered last
    /// * `intra_threads` - Worker threads used inside a single inference call
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device, intra_threads: usize) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(intra_threads)
            .map_err(|e| load_error(path, e))?
            .with_execution_providers(execution_providers(device))
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| load_error(path, "model declares no inputs"))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| load_error(path, "model declares no outputs"))?;

        let input = Tensor::from_array(Array4::<f32>::zeros(INPUT_SHAPE))
            .map_err(|e| load_error(path, e))?;

        tracing::info!("Segmentation model loaded successfully");
        tracing::debug!(
            "Model input '{}', output '{}', device {:?}, {} threads",
            input_name,
            output_name,
            device,
            intra_threads
        );

        Ok(Self {
            session,
            input,
            input_name,
            output_name,
        })
    }
}

fn load_error(path: &Path, reason: impl Display) -> Error {
    Error::ModelLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn execution_providers(device: Device) -> Vec<ExecutionProviderDispatch> {
    match device {
        Device::Cpu => vec![CPUExecutionProvider::default().build()],
        Device::Cuda => vec![
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ],
        Device::TensorRt => vec![
            TensorRTExecutionProvider::default().build(),
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ],
    }
}

impl SegmentationModel for OrtSegmenter {
    fn segment(&mut self, input: &InputTensor) -> Result<OutputPlanes> {
        let _span = tracing::debug_span!("inference", runtime = "onnxruntime").entered();

        self.input.extract_array_mut().assign(input.as_array());

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => &self.input])
            .map_err(|e| Error::Inference(e.to_string()))?;

        // Single output of shape [1, 144, 256, 2]
        let output = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(e.to_string()))?;
        let output = output.as_standard_layout();
        let data = output
            .as_slice()
            .ok_or_else(|| Error::Inference("output tensor is not contiguous".into()))?;

        OutputPlanes::from_nhwc(output.shape(), data)
    }

    fn runtime(&self) -> Runtime {
        Runtime::OnnxRuntime
    }
}
