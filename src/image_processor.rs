use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::codec;
use crate::error::CodecError;
use crate::markup;
use crate::media::MediaUnit;
use crate::source::ChannelSource;
use crate::writer::{BinaryItem, BookWriter};

pub const IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Where downloads go and what to do with them.
#[derive(Debug, Clone)]
pub struct ImageOptions {
    /// Scratch directory, must exist
    pub images_dir: PathBuf,
    pub grayscale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Added to the book; `fragment` goes into the page.
    Embedded { filename: String, fragment: String },
    /// Left out of the book. The rest of the run is unaffected.
    Skipped { filename: String, reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Downloaded bytes are not an image we can read
    Undecodable(String),
    /// The file was gone by the time it was needed
    Missing,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable(detail) => write!(f, "cannot identify image: {}", detail),
            Self::Missing => write!(f, "file not found"),
        }
    }
}

/// `image_<post>_<sequence>_<YYYYmmddHHMMSS>.jpg`
pub fn image_filename(unit: &MediaUnit) -> String {
    format!(
        "image_{}_{}_{}.jpg",
        unit.owning_post_id,
        unit.sequence,
        unit.source_timestamp.format("%Y%m%d%H%M%S")
    )
}

/// Download one image, optionally grayscale it, and register it with the book.
///
/// Download failures are returned as errors. Problems with the downloaded
/// file itself only skip this image.
pub fn materialize<S, W>(
    unit: &MediaUnit,
    source: &S,
    book: &mut W,
    options: &ImageOptions,
) -> Result<ImageOutcome>
where
    S: ChannelSource + ?Sized,
    W: BookWriter + ?Sized,
{
    let filename = image_filename(unit);
    let path = options.images_dir.join(&filename);

    info!(path = %path.display(), "downloading media");
    source
        .download(&unit.media, &path)
        .with_context(|| format!("Failed to download media for post {}", unit.owning_post_id))?;

    if options.grayscale {
        info!(path = %path.display(), "converting image to grayscale");
        if let Err(e) = codec::grayscale_in_place(&path) {
            if !e.is_recoverable() {
                return Err(e.into());
            }
            warn!(error = %e, "skipping image");
            let reason = match e {
                CodecError::Decode { source: err, .. } => SkipReason::Undecodable(err.to_string()),
                _ => SkipReason::Missing,
            };
            return Ok(ImageOutcome::Skipped { filename, reason });
        }
    }

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "image file not found, skipping");
            return Ok(ImageOutcome::Skipped {
                filename,
                reason: SkipReason::Missing,
            });
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read image: {}", path.display()))
        }
    };

    book.add_binary_item(BinaryItem {
        id: filename.trim_end_matches(".jpg").to_string(),
        filename: filename.clone(),
        media_type: IMAGE_MEDIA_TYPE.to_string(),
        data,
    });
    info!(image = %filename, "image added to book");

    let fragment = markup::image_fragment(&filename, unit.position);
    Ok(ImageOutcome::Embedded { filename, fragment })
}
