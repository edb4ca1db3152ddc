use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::aggregator;
use crate::assembler::{self, AssemblyOptions, AssemblyReport};
use crate::config::RunConfig;
use crate::image_processor::ImageOptions;
use crate::source::ChannelSource;
use crate::writer::BookWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: PathBuf, report: AssemblyReport },
    /// Nothing matched; no book was written.
    Empty,
}

/// Retrieve every configured channel and write the book.
pub fn run<S, W>(config: &RunConfig, source: &S, book: &mut W) -> Result<RunOutcome>
where
    S: ChannelSource,
    W: BookWriter + ?Sized,
{
    let Some(timeline) = aggregator::aggregate(source, &config.channels, &config.strategy)? else {
        info!("no messages found for the configured window or post count, book creation skipped");
        return Ok(RunOutcome::Empty);
    };

    if config.extract_images {
        fs::create_dir_all(&config.images_dir).with_context(|| {
            format!(
                "Failed to create images directory: {}",
                config.images_dir.display()
            )
        })?;
    }

    let options = AssemblyOptions {
        metadata: config.metadata.clone(),
        page_breaks: config.page_breaks,
        extract_images: config.extract_images,
        images: ImageOptions {
            images_dir: config.images_dir.clone(),
            grayscale: config.grayscale,
        },
        output: config.output.clone(),
    };
    let report = assembler::assemble(&timeline, source, book, &options)?;

    Ok(RunOutcome::Written {
        path: config.output.clone(),
        report,
    })
}
