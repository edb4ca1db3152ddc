//! Collect posts from messaging channels into a single paginated EPUB.
//!
//! Channels are read through a [`source::ChannelSource`], merged into one
//! chronological [`aggregator::Timeline`], and laid out by the
//! [`assembler`] into a book written through a [`writer::BookWriter`].

pub mod aggregator;
pub mod assembler;
pub mod cli;
pub mod codec;
pub mod config;
pub mod epub_writer;
pub mod error;
pub mod export_source;
pub mod image_processor;
pub mod markup;
pub mod media;
pub mod memory_source;
pub mod pipeline;
pub mod post;
pub mod retriever;
pub mod source;
pub mod writer;
