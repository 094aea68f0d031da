use crate::error::{Error, Result};
use crate::segmentation::{Image, Mask};
use image::{imageops, Rgb, RgbImage};

/// Mask values above this count as foreground when cutting out
const FOREGROUND_CUTOFF: u8 = 127;

/// Weights for blending a mask over its image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightWeights {
    pub image: f32,
    pub mask: f32,
    pub gamma: f32,
}

impl Default for HighlightWeights {
    fn default() -> Self {
        Self {
            image: 0.9,
            mask: 0.4,
            gamma: 0.0,
        }
    }
}

fn check_dimensions(image: &Image, mask: &Mask) -> Result<()> {
    if image.dimensions() != mask.dimensions() {
        return Err(Error::Dimensions {
            expected: image.dimensions(),
            actual: mask.dimensions(),
        });
    }
    Ok(())
}

/// Brighten the masked region by adding a weighted mask on top of the image
///
/// Each sample is `image * w_image + mask * w_mask + gamma`, rounded and
/// saturated to 8 bits.
pub fn highlight(original: &Image, mask: &Mask, weights: HighlightWeights) -> Result<Image> {
    let _span = tracing::debug_span!("highlight").entered();
    check_dimensions(original, mask)?;

    let (width, height) = original.dimensions();
    let source = original.as_buffer();
    let overlay = mask.as_image();

    let blended = RgbImage::from_fn(width, height, |x, y| {
        let a = source.get_pixel(x, y);
        let m = overlay.get_pixel(x, y);
        Rgb(std::array::from_fn(|c| {
            let value = a[c] as f32 * weights.image + m[c] as f32 * weights.mask + weights.gamma;
            value.round_ties_even().clamp(0.0, 255.0) as u8
        }))
    });

    Ok(Image::new(blended, original.order()))
}

/// Put the masked foreground of `original` in front of `background`
///
/// The background is scaled to cover the original (matching width first,
/// then height if it is still too short) and the bottom-right window of
/// the original's size is kept. Returns that cropped background and the
/// merged image, both in the original's channel order.
pub fn replace_background(
    original: &Image,
    mask: &Mask,
    background: &Image,
) -> Result<(Image, Image)> {
    let _span = tracing::debug_span!("replace_background").entered();
    check_dimensions(original, mask)?;

    let (width, height) = original.dimensions();
    let (bg_width, bg_height) = background.dimensions();
    if bg_width == 0 || bg_height == 0 {
        return Err(Error::Dimensions {
            expected: (width, height),
            actual: (bg_width, bg_height),
        });
    }

    let mut desired_width = width;
    let mut desired_height =
        ((bg_height as f64 * (width as f64 / bg_width as f64)) as u32).max(1);
    if desired_height < height {
        desired_width =
            ((desired_width as f64 * (height as f64 / desired_height as f64)) as u32).max(width);
        desired_height = height;
    }

    tracing::debug!(
        "Scaling background {}x{} to {}x{}",
        bg_width,
        bg_height,
        desired_width,
        desired_height
    );

    let ordered = background.to_order(original.order());
    let scaled = imageops::resize(
        &*ordered,
        desired_width,
        desired_height,
        imageops::FilterType::Triangle,
    );

    let left = desired_width - width;
    let top = desired_height - height;
    let cropped = imageops::crop_imm(&scaled, left, top, width, height).to_image();

    let source = original.as_buffer();
    let merged = RgbImage::from_fn(width, height, |x, y| {
        if mask.value(x, y) > FOREGROUND_CUTOFF {
            *source.get_pixel(x, y)
        } else {
            *cropped.get_pixel(x, y)
        }
    });

    Ok((
        Image::new(cropped, original.order()),
        Image::new(merged, original.order()),
    ))
}
