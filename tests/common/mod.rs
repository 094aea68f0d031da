#![allow(dead_code)]

use human_segmentation::segmentation::{
    ConfidencePlane, Image, InputTensor, Mask, OutputPlanes, Runtime, SegmentationModel,
};
use human_segmentation::Result;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Model stand-in that reads its confidence straight from the input:
/// foreground is the first channel, background its complement.
pub struct BrightnessModel;

impl SegmentationModel for BrightnessModel {
    fn segment(&mut self, input: &InputTensor) -> Result<OutputPlanes> {
        let array = input.as_array();
        let foreground = array.slice(ndarray::s![0, .., .., 0]).to_owned();
        let background = foreground.mapv(|v| 1.0 - v);
        Ok(OutputPlanes {
            foreground: ConfidencePlane::new(foreground)?,
            background: ConfidencePlane::new(background)?,
        })
    }

    fn runtime(&self) -> Runtime {
        Runtime::Tract
    }
}

/// Model stand-in that always returns the same two planes
pub struct ConstantModel {
    pub foreground: f32,
    pub background: f32,
}

impl SegmentationModel for ConstantModel {
    fn segment(&mut self, _input: &InputTensor) -> Result<OutputPlanes> {
        Ok(OutputPlanes {
            foreground: ConfidencePlane::filled(self.foreground),
            background: ConfidencePlane::filled(self.background),
        })
    }

    fn runtime(&self) -> Runtime {
        Runtime::Tract
    }
}

/// Dark frame with a bright upright ellipse roughly where a person would stand
pub fn person_like(width: u32, height: u32) -> RgbImage {
    let (cx, cy) = (width as f32 / 2.0, height as f32 * 0.55);
    let (rx, ry) = (width as f32 * 0.2, height as f32 * 0.4);
    RgbImage::from_fn(width, height, |x, y| {
        let dx = (x as f32 - cx) / rx;
        let dy = (y as f32 - cy) / ry;
        if dx * dx + dy * dy <= 1.0 {
            Rgb([230, 190, 160])
        } else {
            Rgb([20, 40, (x % 64) as u8])
        }
    })
}

pub fn person_like_bgr(width: u32, height: u32) -> Image {
    Image::bgr(person_like(width, height))
}

/// Model path for tests that need the real network
pub fn model_path() -> Option<PathBuf> {
    match std::env::var_os("HUMAN_SEG_MODEL") {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            eprintln!("HUMAN_SEG_MODEL not set, skipping model-backed test");
            None
        }
    }
}

/// Stored mask under `tests/regression/`
pub fn regression_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/regression")
        .join(name)
}

/// Compare `mask` pixel for pixel with the PNG at `reference_path`
///
/// With `HUMAN_SEG_OVERWRITE_REGRESSION` set the reference is rewritten
/// instead. A missing reference fails the test.
pub fn assert_matches_reference(mask: &Mask, reference_path: &Path) {
    if std::env::var_os("HUMAN_SEG_OVERWRITE_REGRESSION").is_some() {
        mask.as_image().save(reference_path).unwrap();
        eprintln!("Wrote reference mask to {}", reference_path.display());
        return;
    }

    assert!(
        reference_path.exists(),
        "No reference mask at {}, run with HUMAN_SEG_OVERWRITE_REGRESSION=1 to create it",
        reference_path.display()
    );

    let reference = image::open(reference_path).unwrap().to_rgb8();
    assert_eq!(reference.dimensions(), mask.dimensions());

    let mismatched = reference
        .pixels()
        .zip(mask.as_image().pixels())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(mismatched, 0, "{mismatched} pixels differ from reference");
}
