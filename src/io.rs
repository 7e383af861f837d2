use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{SegmentationError, SegmentationResult};
use crate::Image;
use image::{ImageError, ImageFormat, ImageReader, Rgb};
use log::debug;

/// Prefix of the noisy-input copy written next to the result
pub const NOISED_PREFIX: &str = "noised_";
/// Prefix of the error diagnostic written next to the result
pub const ERROR_PREFIX: &str = "err_";

/// Reads an image and converts it to 8-bit RGB.
///
/// The format is sniffed from the file contents, so a PPM without the usual
/// extension still loads.
///
/// # Errors
///
/// * `SegmentationError::ImageLoadFailure` - the file is missing, unreadable
///   or not a decodable image
pub fn load_rgb(path: impl AsRef<Path>) -> SegmentationResult<Image<Rgb<u8>>> {
    let path = path.as_ref();
    let failure = |source| SegmentationError::ImageLoadFailure {
        path: path.to_path_buf(),
        source,
    };

    let image = ImageReader::open(path)
        .map_err(|e| failure(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| failure(ImageError::IoError(e)))?
        .decode()
        .map_err(failure)?
        .into_rgb8();

    debug!("loaded {path:?} ({}x{})", image.width(), image.height());
    Ok(image)
}

/// Writes `image` as a binary PPM.
///
/// # Errors
///
/// * `SegmentationError::ImageSaveFailure` - the file cannot be created or
///   encoded
pub fn save_ppm(image: &Image<Rgb<u8>>, path: impl AsRef<Path>) -> SegmentationResult<()> {
    let path = path.as_ref();
    image
        .save_with_format(path, ImageFormat::Pnm)
        .map_err(|source| SegmentationError::ImageSaveFailure {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("wrote {path:?}");
    Ok(())
}

/// Places `prefix` in front of the file name of `path`, keeping its directory.
///
/// `out/result.ppm` with prefix `err_` becomes `out/err_result.ppm`.
///
/// # Errors
///
/// * `SegmentationError::InvalidOutputPath` - `path` has no file name, such
///   as `..` or `/`
pub fn prefixed_path(path: &Path, prefix: &str) -> SegmentationResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| SegmentationError::InvalidOutputPath(path.to_path_buf()))?;
    let mut prefixed = OsString::from(prefix);
    prefixed.push(file_name);
    Ok(path.with_file_name(prefixed))
}
