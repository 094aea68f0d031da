//! Human foreground masks from still photographs.
//!
//! A pretrained segmentation network produces foreground and background
//! confidence planes at 256x144; [`segmentation::MaskRefiner`] thresholds
//! them, scales them back to the photo's size and fuses them with a joint
//! bilateral filter into a mask ready for compositing.

pub mod error;
pub mod input;
pub mod output;
pub mod segmentation;

pub use error::{Error, Result};
