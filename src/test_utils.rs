//! Test utilities for densecrf-binary
//!
//! This module provides common fixtures for testing the segmentation stages.
//! It is only compiled when running tests.

#[cfg(test)]
use image::Rgb;
#[cfg(test)]
use imageproc::definitions::Image;
#[cfg(test)]
use std::path::PathBuf;

/// Creates a test RGB image with predefined pixel values for testing.
///
/// This function creates a 2x2 test image with known pixel values:
/// - (0,0): [200, 150, 100]
/// - (1,0): [100, 200, 150]
/// - (0,1): [150, 100, 200]
/// - (1,1): [50, 75, 25]
#[cfg(test)]
pub fn create_test_rgb_image() -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgb([200, 150, 100]));
    image.put_pixel(1, 0, Rgb([100, 200, 150]));
    image.put_pixel(0, 1, Rgb([150, 100, 200]));
    image.put_pixel(1, 1, Rgb([50, 75, 25]));
    image
}

/// Creates a 2x2 binary ground truth laid out as a checkerboard.
///
/// - (0,0), (1,1): [255, 255, 255] ("on")
/// - (1,0), (0,1): [0, 0, 0] ("off")
#[cfg(test)]
pub fn create_ground_truth() -> Image<Rgb<u8>> {
    create_binary_ground_truth(2, 2, |x, y| x == y)
}

/// Creates a binary ground truth where `is_on(x, y)` selects the white pixels.
#[cfg(test)]
pub fn create_binary_ground_truth(
    width: u32,
    height: u32,
    is_on: impl Fn(u32, u32) -> bool,
) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| {
        if is_on(x, y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Returns an empty per-test directory under the system temp dir.
#[cfg(test)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "densecrf-binary-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
