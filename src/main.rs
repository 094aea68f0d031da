use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use human_segmentation::input::{FileSource, ImageSource};
use human_segmentation::output::{
    highlight, replace_background, FileSink, HighlightWeights, OutputSink,
};
use human_segmentation::segmentation::{
    self, Device, Image, InferenceConfig, RefinerConfig, RuntimePreference, SegmentationModel,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Blend the mask over the photo
    Highlight,
    /// Swap the background for another image
    Replace,
    /// Write the mask itself
    Mask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuntimeArg {
    Auto,
    Onnxruntime,
    Tract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeviceArg {
    Cpu,
    Cuda,
    Tensorrt,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to segment
    #[arg(default_value = "assets/sample.jpeg")]
    input: PathBuf,

    /// Path to segmentation model (ONNX file)
    #[arg(short, long, default_value = "models/human_segmentation.onnx")]
    model: PathBuf,

    /// Where to write the result
    #[arg(short, long, default_value = "result.png")]
    output: PathBuf,

    /// What to produce from the mask
    #[arg(long, value_enum, default_value_t = Mode::Highlight)]
    mode: Mode,

    /// Replacement background (required for --mode replace)
    #[arg(long)]
    background: Option<PathBuf>,

    /// Mask weight for highlight mode
    #[arg(long, default_value_t = 0.4)]
    mask_weight: f32,

    /// Inference runtime
    #[arg(long, value_enum, default_value_t = RuntimeArg::Auto)]
    runtime: RuntimeArg,

    /// Execution provider for ONNX Runtime
    #[arg(long, value_enum, default_value_t = DeviceArg::Cpu)]
    device: DeviceArg,

    /// Worker threads for a single inference
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            runtime: match self.runtime {
                RuntimeArg::Auto => RuntimePreference::Auto,
                RuntimeArg::Onnxruntime => RuntimePreference::OnnxRuntime,
                RuntimeArg::Tract => RuntimePreference::Tract,
            },
            device: match self.device {
                DeviceArg::Cpu => Device::Cpu,
                DeviceArg::Cuda => Device::Cuda,
                DeviceArg::Tensorrt => Device::TensorRt,
            },
            intra_threads: self.threads,
            ..InferenceConfig::new(&self.model)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if args.mode == Mode::Replace && args.background.is_none() {
        bail!("--mode replace needs --background");
    }

    tracing::info!("Input: {}", args.input.display());
    tracing::info!("Model: {}", args.model.display());

    let load_start = Instant::now();
    let mut refiner =
        segmentation::create_refiner(&args.inference_config(), RefinerConfig::default())
            .context("Failed to load segmentation model")?;
    tracing::info!(
        "Model ready on {} in {:.1}ms",
        refiner.model().runtime(),
        load_start.elapsed().as_secs_f64() * 1000.0
    );

    let mut source = FileSource::new(&args.input);
    let original = source
        .load()
        .with_context(|| format!("Failed to read {}", source.path().display()))?;

    let refine_start = Instant::now();
    let mask = refiner.refine(&original).context("Failed to segment image")?;
    let refine_ms = refine_start.elapsed().as_secs_f64() * 1000.0;

    let composite_start = Instant::now();
    let result = match args.mode {
        Mode::Mask => Image::new(mask.into_image(), original.order()),
        Mode::Highlight => {
            let weights = HighlightWeights {
                mask: args.mask_weight,
                ..HighlightWeights::default()
            };
            highlight(&original, &mask, weights).context("Failed to highlight mask")?
        }
        Mode::Replace => {
            let path = args
                .background
                .as_ref()
                .context("--mode replace needs --background")?;
            let mut source = FileSource::new(path);
            let background = source
                .load()
                .with_context(|| format!("Failed to read {}", source.path().display()))?;
            let (_, merged) = replace_background(&original, &mask, &background)
                .context("Failed to replace background")?;
            merged
        }
    };
    let composite_ms = composite_start.elapsed().as_secs_f64() * 1000.0;

    let output_start = Instant::now();
    let mut sink = FileSink::new(&args.output);
    sink.write_image(&result)
        .with_context(|| format!("Failed to write {}", sink.path().display()))?;
    let output_ms = output_start.elapsed().as_secs_f64() * 1000.0;

    let (width, height) = original.dimensions();
    tracing::info!(
        "{}x{}: refine={:.1}ms, composite={:.1}ms, output={:.1}ms",
        width,
        height,
        refine_ms,
        composite_ms,
        output_ms
    );

    Ok(())
}
