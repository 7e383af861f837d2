//! Unnormalized kernel filters over interleaved per-label planes.
//!
//! Both kernels give the center pixel weight 1, so the caller can remove the
//! self contribution by subtracting the input.

use crate::Image;
use image::Rgb;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Half-width of a truncated Gaussian, capped at `max_radius`
///
/// Offsets past the last pixel never contribute, so capping leaves the
/// filter output unchanged.
fn radius_for(std: f32, max_radius: usize) -> usize {
    let radius = (3.0 * std).ceil();
    if radius >= max_radius as f32 {
        max_radius
    } else {
        radius as usize
    }
}

/// Samples `exp(-d² / 2σ²)` for `d` in `0..=radius`.
fn half_gaussian(std: f32, max_radius: usize) -> Vec<f32> {
    let denominator = 2.0 * std * std;
    (0..=radius_for(std, max_radius))
        .map(|d| (-((d * d) as f32) / denominator).exp())
        .collect()
}

/// Separable Gaussian over pixel positions
pub struct SpatialKernel {
    width: usize,
    height: usize,
    x_half: Vec<f32>,
    y_half: Vec<f32>,
    /// Total kernel mass reaching each pixel, self included
    norm: Vec<f32>,
}

impl SpatialKernel {
    pub fn new(width: u32, height: u32, x_std: f32, y_std: f32) -> Self {
        let mut kernel = Self {
            width: width as usize,
            height: height as usize,
            x_half: half_gaussian(x_std, (width as usize).saturating_sub(1)),
            y_half: half_gaussian(y_std, (height as usize).saturating_sub(1)),
            norm: Vec::new(),
        };
        let ones = vec![1.0; kernel.width * kernel.height];
        kernel.norm = kernel.filter(&ones, 1);
        kernel
    }

    pub fn norm(&self) -> &[f32] {
        &self.norm
    }

    /// Sums `k(i, j) * input_j` for every pixel `i` and every channel.
    pub fn filter(&self, input: &[f32], channels: usize) -> Vec<f32> {
        let (width, height) = (self.width, self.height);
        let mut horizontal = vec![0.0; input.len()];

        for y in 0..height {
            for x in 0..width {
                let out = (y * width + x) * channels;
                for (d, &k) in self.x_half.iter().enumerate() {
                    if d == 0 {
                        for c in 0..channels {
                            horizontal[out + c] += k * input[out + c];
                        }
                        continue;
                    }
                    for xs in [x.checked_sub(d), Some(x + d).filter(|&v| v < width)]
                        .into_iter()
                        .flatten()
                    {
                        let src = (y * width + xs) * channels;
                        for c in 0..channels {
                            horizontal[out + c] += k * input[src + c];
                        }
                    }
                }
            }
        }

        let mut output = vec![0.0; input.len()];
        for y in 0..height {
            for x in 0..width {
                let out = (y * width + x) * channels;
                for (d, &k) in self.y_half.iter().enumerate() {
                    if d == 0 {
                        for c in 0..channels {
                            output[out + c] += k * horizontal[out + c];
                        }
                        continue;
                    }
                    for ys in [y.checked_sub(d), Some(y + d).filter(|&v| v < height)]
                        .into_iter()
                        .flatten()
                    {
                        let src = (ys * width + x) * channels;
                        for c in 0..channels {
                            output[out + c] += k * horizontal[src + c];
                        }
                    }
                }
            }
        }

        output
    }
}

/// Cross-bilateral kernel over positions and guide-image colors
///
/// Evaluated by brute force inside a window of three standard deviations.
pub struct ColorKernel {
    width: usize,
    height: usize,
    x_radius: usize,
    y_radius: usize,
    /// `exp` of the positional part, indexed by `(|dy|, |dx|)`
    spatial: Vec<f32>,
    color_denominator: f32,
    guide: Vec<[f32; 3]>,
    norm: Vec<f32>,
}

impl ColorKernel {
    pub fn new(image: &Image<Rgb<u8>>, x_std: f32, y_std: f32, color_std: f32) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let x_half = half_gaussian(x_std, width.saturating_sub(1));
        let y_half = half_gaussian(y_std, height.saturating_sub(1));
        let spatial = y_half
            .iter()
            .flat_map(|&ky| x_half.iter().map(move |&kx| ky * kx))
            .collect();

        let mut kernel = Self {
            width,
            height,
            x_radius: x_half.len() - 1,
            y_radius: y_half.len() - 1,
            spatial,
            color_denominator: 2.0 * color_std * color_std,
            guide: image
                .pixels()
                .map(|&Rgb([r, g, b])| [f32::from(r), f32::from(g), f32::from(b)])
                .collect(),
            norm: Vec::new(),
        };
        let ones = vec![1.0; width * height];
        kernel.norm = kernel.filter(&ones, 1);
        kernel
    }

    pub fn norm(&self) -> &[f32] {
        &self.norm
    }

    /// Sums `k(i, j) * input_j` for every pixel `i` and every channel.
    pub fn filter(&self, input: &[f32], channels: usize) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        let row_len = self.width * channels;

        #[cfg(feature = "rayon")]
        output
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| self.filter_row(y, input, channels, row));

        #[cfg(not(feature = "rayon"))]
        output
            .chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| self.filter_row(y, input, channels, row));

        output
    }

    fn filter_row(&self, y: usize, input: &[f32], channels: usize, row: &mut [f32]) {
        let x_span = self.x_radius + 1;
        let y_lo = y.saturating_sub(self.y_radius);
        let y_hi = (y + self.y_radius).min(self.height - 1);

        for x in 0..self.width {
            let center = self.guide[y * self.width + x];
            let x_lo = x.saturating_sub(self.x_radius);
            let x_hi = (x + self.x_radius).min(self.width - 1);
            let out = &mut row[x * channels..(x + 1) * channels];

            for ys in y_lo..=y_hi {
                for xs in x_lo..=x_hi {
                    let j = ys * self.width + xs;
                    let [r, g, b] = self.guide[j];
                    let color_distance = (r - center[0]).powi(2)
                        + (g - center[1]).powi(2)
                        + (b - center[2]).powi(2);
                    let k = self.spatial[ys.abs_diff(y) * x_span + xs.abs_diff(x)]
                        * (-color_distance / self.color_denominator).exp();
                    for (o, &v) in out.iter_mut().zip(&input[j * channels..(j + 1) * channels]) {
                        *o += k * v;
                    }
                }
            }
        }
    }
}
