use crate::error::{SegmentationError, SegmentationResult};
use crate::utils::validate_non_empty_image;
use crate::Image;
use image::{ImageBuffer, Rgb};
use log::{debug, warn};
use rand::Rng;

/// Intensity assigned to "on" pixels before noise is added
pub const HIGH_BASE: f64 = 191.0;
/// Intensity assigned to "off" pixels before noise is added
pub const LOW_BASE: f64 = 64.0;
/// Replacement for intensities that overshoot 255
pub const HIGH_SENTINEL: u8 = 128;
/// Replacement for intensities that drop below 0
pub const LOW_SENTINEL: u8 = 127;

/// Draws a standard normal deviate with the polar rejection method.
///
/// Two uniforms in `[-1, 1]` are drawn until they fall strictly inside the
/// unit circle and away from the origin.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let v1: f64 = rng.gen_range(-1.0..=1.0);
        let v2: f64 = rng.gen_range(-1.0..=1.0);
        let s = v1.mul_add(v1, v2 * v2);
        if s < 1.0 && s != 0.0 {
            return v1 * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

/// Maps a noisy intensity back into a byte.
///
/// `intensity` is a whole number. Out-of-range values do not saturate:
/// overshoot becomes `HIGH_SENTINEL` and undershoot becomes `LOW_SENTINEL`.
#[inline]
#[must_use]
pub fn sentinel_clamp(intensity: f64) -> u8 {
    if intensity > 255.0 {
        HIGH_SENTINEL
    } else if intensity < 0.0 {
        LOW_SENTINEL
    } else {
        intensity as u8
    }
}

/// Synthesizes a noisy two-tone observation of a binary ground truth.
pub trait AddBinaryNoise {
    /// Replaces every pixel with `base + trunc(g * sigma)` on all channels.
    ///
    /// `base` is `HIGH_BASE` where the first channel is nonzero and
    /// `LOW_BASE` elsewhere; `g` is a fresh standard normal sample per pixel.
    ///
    /// # Arguments
    ///
    /// * `sigma` - Standard deviation of the additive noise
    /// * `rng` - Random source; seed it for reproducible output
    ///
    /// # Errors
    ///
    /// * `SegmentationError::NoiseGenerationFailure` - `sigma` is negative or
    ///   not finite, or the image has no pixels
    fn add_binary_noise<R: Rng + ?Sized>(
        &self,
        sigma: f64,
        rng: &mut R,
    ) -> SegmentationResult<Image<Rgb<u8>>>;
}

impl AddBinaryNoise for Image<Rgb<u8>> {
    fn add_binary_noise<R: Rng + ?Sized>(
        &self,
        sigma: f64,
        rng: &mut R,
    ) -> SegmentationResult<Image<Rgb<u8>>> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(SegmentationError::NoiseGenerationFailure(format!(
                "noise sigma must be finite and non-negative, got {sigma}"
            )));
        }
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height, "add_binary_noise")
            .map_err(SegmentationError::NoiseGenerationFailure)?;

        let mut clamped = 0usize;
        let noisy = ImageBuffer::from_fn(width, height, |x, y| {
            let Rgb([on, _, _]) = *self.get_pixel(x, y);
            let offset = (standard_normal(&mut *rng) * sigma).trunc();
            let base = if on != 0 { HIGH_BASE } else { LOW_BASE };
            let intensity = base + offset;
            if !(0.0..=255.0).contains(&intensity) {
                clamped += 1;
            }
            let value = sentinel_clamp(intensity);
            Rgb([value, value, value])
        });

        if clamped > 0 {
            warn!("{clamped} noisy pixels left [0, 255] and were replaced by sentinel values");
        }
        debug!("synthesized {width}x{height} noisy image with sigma {sigma}");

        Ok(noisy)
    }
}
