//! Grayscale conversion for downloaded images.

use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::Path;

use crate::error::CodecError;

/// Decode whatever format the bytes are in. The file extension is ignored,
/// since downloads are always named `.jpg`.
pub fn decode(path: &Path) -> Result<DynamicImage, CodecError> {
    let bytes = fs::read(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Single-channel luminance copy of `img`.
pub fn to_grayscale(img: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(img.to_luma8())
}

pub fn encode(img: &DynamicImage, path: &Path) -> Result<(), CodecError> {
    img.save_with_format(path, ImageFormat::Jpeg)
        .map_err(|source| CodecError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace the image at `path` with a grayscale JPEG.
pub fn grayscale_in_place(path: &Path) -> Result<(), CodecError> {
    let img = decode(path)?;
    encode(&to_grayscale(&img), path)
}
