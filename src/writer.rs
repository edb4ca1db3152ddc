use anyhow::Result;
use std::path::Path;

/// Book-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub identifier: String,
    pub title: String,
    pub language: String,
}

/// Any non-chapter resource: images, stylesheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryItem {
    pub id: String,
    /// Path inside the book, relative to the package document
    pub filename: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Body markup of one chapter. The writer wraps it into a full document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub language: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub href: String,
    pub title: String,
    pub id: String,
}

/// Reading order entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpineItem {
    /// The generated navigation document
    Nav,
    /// A chapter, by id
    Chapter(String),
}

/// Trait for writing e-book containers (EPUB, etc.)
pub trait BookWriter {
    fn set_metadata(&mut self, metadata: BookMetadata);
    fn add_binary_item(&mut self, item: BinaryItem);
    fn add_chapter(&mut self, chapter: Chapter);
    fn set_toc(&mut self, entries: Vec<TocEntry>);
    fn set_spine(&mut self, items: Vec<SpineItem>);
    /// Write the finished container to `output`
    fn finalize(&mut self, output: &Path) -> Result<()>;
}
