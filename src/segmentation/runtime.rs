use super::tract::TractSegmenter;
use super::types::SegmentationModel;
use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Inference runtime actually backing a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    /// ONNX Runtime through the `ort` crate
    OnnxRuntime,
    /// Pure-Rust `tract` engine
    Tract,
}

impl Runtime {
    /// Pick the runtime to use for this process
    ///
    /// ONNX Runtime when it is compiled in and a session builder can be
    /// created, tract otherwise.
    pub fn probe() -> Self {
        if onnxruntime_available() {
            Runtime::OnnxRuntime
        } else {
            Runtime::Tract
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Runtime::OnnxRuntime => "onnxruntime",
            Runtime::Tract => "tract",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which runtime the caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimePreference {
    /// Probe once, fall back to tract if ONNX Runtime is missing
    #[default]
    Auto,
    /// ONNX Runtime or nothing
    OnnxRuntime,
    /// Always tract
    Tract,
}

/// Execution provider hint for ONNX Runtime; ignored by tract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
    TensorRt,
}

/// Everything needed to build an inference engine
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_path: PathBuf,
    pub runtime: RuntimePreference,
    pub device: Device,
    /// Intra-op worker threads for a single inference call
    pub intra_threads: usize,
}

impl InferenceConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            runtime: RuntimePreference::Auto,
            device: Device::Cpu,
            intra_threads: 4,
        }
    }
}

#[cfg(feature = "onnxruntime")]
fn onnxruntime_available() -> bool {
    match ort::session::Session::builder() {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("ONNX Runtime probe failed: {}", e);
            false
        }
    }
}

#[cfg(not(feature = "onnxruntime"))]
fn onnxruntime_available() -> bool {
    false
}

/// Build the inference engine described by `config`
///
/// The model file is checked before any runtime is touched, so a missing
/// model is reported as such regardless of the runtime in use.
pub fn load_segmenter(config: &InferenceConfig) -> Result<Box<dyn SegmentationModel>> {
    let path = &config.model_path;
    if !path.is_file() {
        return Err(Error::ModelNotFound(path.clone()));
    }

    let runtime = match config.runtime {
        RuntimePreference::Tract => Runtime::Tract,
        RuntimePreference::OnnxRuntime => {
            if !onnxruntime_available() {
                return Err(Error::RuntimeUnavailable(Runtime::OnnxRuntime.name()));
            }
            Runtime::OnnxRuntime
        }
        RuntimePreference::Auto => {
            let runtime = Runtime::probe();
            if runtime == Runtime::Tract {
                tracing::warn!("ONNX Runtime unavailable, falling back to tract");
            }
            runtime
        }
    };

    tracing::info!("Using {} runtime", runtime);

    match runtime {
        Runtime::OnnxRuntime => build_onnxruntime(config),
        Runtime::Tract => Ok(Box::new(TractSegmenter::new(path)?)),
    }
}

#[cfg(feature = "onnxruntime")]
fn build_onnxruntime(config: &InferenceConfig) -> Result<Box<dyn SegmentationModel>> {
    let model = super::onnx::OrtSegmenter::new(&config.model_path, config.device, config.intra_threads)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnxruntime"))]
fn build_onnxruntime(_config: &InferenceConfig) -> Result<Box<dyn SegmentationModel>> {
    Err(Error::RuntimeUnavailable(Runtime::OnnxRuntime.name()))
}
