use chrono::{DateTime, Utc};

use crate::post::{MediaPayload, MediaRef, Post};

/// What a post carries in terms of downloadable images.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaShape<'a> {
    Absent,
    Single(&'a MediaRef),
    Album(Vec<&'a MediaRef>),
}

impl<'a> MediaShape<'a> {
    /// The refs to download, in page order.
    pub fn refs(&self) -> Vec<&'a MediaRef> {
        match self {
            MediaShape::Absent => Vec::new(),
            MediaShape::Single(media) => vec![*media],
            MediaShape::Album(photos) => photos.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MediaShape::Absent => 0,
            MediaShape::Single(_) => 1,
            MediaShape::Album(photos) => photos.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One image to download and embed.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUnit {
    pub media: MediaRef,
    pub owning_post_id: i64,
    /// 1-based position among the owning post's images. Used for the caption.
    pub position: usize,
    /// Run-wide counter, never reset between posts. Keeps filenames unique.
    pub sequence: usize,
    pub source_timestamp: DateTime<Utc>,
}

/// Classify a post's media.
///
/// A photo or document attachment is one image. A link preview with a photo
/// collection is an album of its photos. Everything else has no images.
pub fn classify(post: &Post) -> MediaShape<'_> {
    match &post.media {
        Some(MediaPayload::Photo(media)) | Some(MediaPayload::Document(media)) => {
            MediaShape::Single(media)
        }
        Some(MediaPayload::WebPage { photos }) => {
            let photos: Vec<&MediaRef> = photos
                .iter()
                .filter_map(|item| match item {
                    MediaPayload::Photo(media) => Some(media),
                    _ => None,
                })
                .collect();
            if photos.is_empty() {
                MediaShape::Absent
            } else {
                MediaShape::Album(photos)
            }
        }
        Some(MediaPayload::Unsupported(_)) | None => MediaShape::Absent,
    }
}

/// Expand a post into media units, drawing sequence numbers from `sequence`.
///
/// `sequence` holds the last number handed out and is advanced once per unit.
pub fn units(post: &Post, sequence: &mut usize) -> Vec<MediaUnit> {
    classify(post)
        .refs()
        .into_iter()
        .enumerate()
        .map(|(i, media)| {
            *sequence += 1;
            MediaUnit {
                media: media.clone(),
                owning_post_id: post.id,
                position: i + 1,
                sequence: *sequence,
                source_timestamp: post.timestamp,
            }
        })
        .collect()
}
