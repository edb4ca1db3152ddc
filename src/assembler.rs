use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::aggregator::Timeline;
use crate::image_processor::{self, ImageOptions, ImageOutcome, SkipReason};
use crate::markup;
use crate::media;
use crate::source::ChannelSource;
use crate::writer::{BinaryItem, BookMetadata, BookWriter, Chapter, SpineItem, TocEntry};

pub const CHAPTER_ID: &str = "chap_01";
pub const CHAPTER_FILE: &str = "chap_01.xhtml";
pub const CHAPTER_TITLE: &str = "Posts";
pub const STYLE_ID: &str = "style_nav";
pub const STYLE_FILE: &str = "style/nav.css";

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub metadata: BookMetadata,
    /// Start a new page after every post
    pub page_breaks: bool,
    pub extract_images: bool,
    pub images: ImageOptions,
    pub output: PathBuf,
}

/// What ended up in the book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub posts: usize,
    pub images: usize,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Build the book from `timeline` and write it to `options.output`.
///
/// Posts are laid out in timeline order, each followed by its images.
/// Everything goes into a single chapter.
pub fn assemble<S, W>(
    timeline: &Timeline,
    source: &S,
    book: &mut W,
    options: &AssemblyOptions,
) -> Result<AssemblyReport>
where
    S: ChannelSource + ?Sized,
    W: BookWriter + ?Sized,
{
    info!(posts = timeline.len(), "creating book");
    book.set_metadata(options.metadata.clone());

    let mut report = AssemblyReport::default();
    let mut content = String::new();
    // Last image number handed out. Shared by every post in the run.
    let mut sequence = 0;

    for post in timeline.posts() {
        debug!(date = %post.timestamp, channel = %post.channel_title, "adding message");
        content.push_str(&markup::text_block(post, options.page_breaks));
        report.posts += 1;

        if !options.extract_images {
            continue;
        }

        for unit in media::units(post, &mut sequence) {
            match image_processor::materialize(&unit, source, book, &options.images)? {
                ImageOutcome::Embedded { fragment, .. } => {
                    content.push_str(&fragment);
                    report.images += 1;
                }
                ImageOutcome::Skipped { filename, reason } => {
                    report.skipped.push((filename, reason));
                }
            }
        }
    }

    book.add_chapter(Chapter {
        id: CHAPTER_ID.to_string(),
        filename: CHAPTER_FILE.to_string(),
        title: CHAPTER_TITLE.to_string(),
        language: options.metadata.language.clone(),
        body: content,
    });
    book.set_toc(vec![TocEntry {
        href: CHAPTER_FILE.to_string(),
        title: CHAPTER_TITLE.to_string(),
        id: CHAPTER_ID.to_string(),
    }]);
    book.add_binary_item(BinaryItem {
        id: STYLE_ID.to_string(),
        filename: STYLE_FILE.to_string(),
        media_type: "text/css".to_string(),
        data: markup::STYLESHEET.as_bytes().to_vec(),
    });
    book.set_spine(vec![SpineItem::Nav, SpineItem::Chapter(CHAPTER_ID.to_string())]);

    info!(path = %options.output.display(), "writing book");
    book.finalize(&options.output)
        .with_context(|| format!("Failed to finalize {}", options.output.display()))?;
    info!(
        posts = report.posts,
        images = report.images,
        skipped = report.skipped.len(),
        "book creation complete"
    );

    Ok(report)
}
