use crate::error::{Error, Result};
use image::{GrayImage, Luma};

/// Edge-preserving smoothing where edges come from a separate guide image
///
/// Each output pixel is a weighted mean of `src` over a circular
/// neighbourhood. The weight of a neighbour is the product of a spatial
/// Gaussian on its distance and a range Gaussian on the difference of the
/// *joint* image between neighbour and centre. Borders are mirrored
/// without repeating the edge pixel (reflect-101).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointBilateralFilter {
    /// Neighbourhood diameter in pixels; `<= 0` derives it from `sigma_space`
    pub diameter: i32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for JointBilateralFilter {
    fn default() -> Self {
        Self {
            diameter: 8,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

impl JointBilateralFilter {
    pub fn new(diameter: i32, sigma_color: f32, sigma_space: f32) -> Self {
        Self {
            diameter,
            sigma_color,
            sigma_space,
        }
    }

    fn sigmas(&self) -> (f32, f32) {
        // NaN and values too small to square fall back to 1 as well
        let usable = |sigma: f32| if sigma > f32::EPSILON { sigma } else { 1.0 };
        (usable(self.sigma_color), usable(self.sigma_space))
    }

    /// Neighbourhood radius actually used
    pub fn radius(&self) -> i32 {
        let (_, sigma_space) = self.sigmas();
        let radius = if self.diameter <= 0 {
            (sigma_space * 1.5).round() as i32
        } else {
            self.diameter / 2
        };
        radius.max(1)
    }

    /// Smooth `src`, stopping at edges found in `joint`
    pub fn apply(&self, joint: &GrayImage, src: &GrayImage) -> Result<GrayImage> {
        let _span = tracing::debug_span!("joint_bilateral").entered();

        if joint.dimensions() != src.dimensions() {
            return Err(Error::Dimensions {
                expected: src.dimensions(),
                actual: joint.dimensions(),
            });
        }

        let (width, height) = src.dimensions();
        let (sigma_color, sigma_space) = self.sigmas();
        let radius = self.radius();

        // Weight tables are built in f64 and stored as f32
        let color_coeff = -0.5 / (sigma_color as f64 * sigma_color as f64);
        let space_coeff = -0.5 / (sigma_space as f64 * sigma_space as f64);

        let color_weights: Vec<f32> = (0..256)
            .map(|i| ((i * i) as f64 * color_coeff).exp() as f32)
            .collect();

        // (dx, dy, weight) for every offset inside the circle
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let r2 = (dx * dx + dy * dy) as f64;
                if r2.sqrt() > radius as f64 {
                    continue;
                }
                offsets.push((dx, dy, (r2 * space_coeff).exp() as f32));
            }
        }

        tracing::debug!(
            "Joint bilateral on {}x{}: radius {}, {} taps",
            width,
            height,
            radius,
            offsets.len()
        );

        // Precomputed mirrored coordinates for every offset along each axis
        let cols: Vec<Vec<u32>> = offsets
            .iter()
            .map(|&(dx, _, _)| {
                (0..width)
                    .map(|x| reflect_101(x as i64 + dx as i64, width))
                    .collect()
            })
            .collect();

        let (joint_raw, src_raw) = (joint.as_raw(), src.as_raw());
        let stride = width as usize;

        let mut output = GrayImage::new(width, height);
        for y in 0..height {
            let rows: Vec<u32> = offsets
                .iter()
                .map(|&(_, dy, _)| reflect_101(y as i64 + dy as i64, height))
                .collect();

            for x in 0..width {
                let center = joint_raw[y as usize * stride + x as usize] as i32;
                let mut sum = 0.0f32;
                let mut weight_sum = 0.0f32;

                for (k, &(_, _, space_weight)) in offsets.iter().enumerate() {
                    let idx = rows[k] as usize * stride + cols[k][x as usize] as usize;
                    let guide = joint_raw[idx] as i32;
                    let weight =
                        space_weight * color_weights[(guide - center).unsigned_abs() as usize];
                    sum += src_raw[idx] as f32 * weight;
                    weight_sum += weight;
                }

                let value = (sum / weight_sum).round_ties_even().clamp(0.0, 255.0) as u8;
                output.put_pixel(x, y, Luma([value]));
            }
        }

        Ok(output)
    }
}

/// Mirror an out-of-range coordinate back into `0..len` without repeating the edge
fn reflect_101(mut i: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as u32;
        }
    }
}
