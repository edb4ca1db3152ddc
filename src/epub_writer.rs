//! EPUB 3 container writer.
//!
//! Everything registered through [`BookWriter`] is held in memory until
//! `finalize`, which lays out the package under `EPUB/` and writes both an
//! EPUB 3 navigation document and an NCX for older readers.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::markup::escape_xml;
use crate::writer::{BinaryItem, BookMetadata, BookWriter, Chapter, SpineItem, TocEntry};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const NAV_ID: &str = "nav";
const NAV_FILE: &str = "nav.xhtml";
const NCX_FILE: &str = "toc.ncx";

#[derive(Debug, Clone, Default)]
pub struct EpubWriter {
    metadata: Option<BookMetadata>,
    items: Vec<BinaryItem>,
    chapters: Vec<Chapter>,
    toc: Vec<TocEntry>,
    spine: Vec<SpineItem>,
    modified: Option<DateTime<Utc>>,
}

impl EpubWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `dcterms:modified` instead of using the time of writing.
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn items(&self) -> &[BinaryItem] {
        &self.items
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Write the container to any seekable destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let metadata = self
            .metadata
            .as_ref()
            .context("Book metadata was never set")?;

        let mut zip = ZipWriter::new(writer);
        let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // Must be the first entry, uncompressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file("EPUB/content.opf", deflated)?;
        zip.write_all(self.package_document(metadata).as_bytes())?;

        zip.start_file(format!("EPUB/{}", NAV_FILE), deflated)?;
        zip.write_all(self.nav_document(metadata).as_bytes())?;

        zip.start_file(format!("EPUB/{}", NCX_FILE), deflated)?;
        zip.write_all(self.ncx_document(metadata).as_bytes())?;

        for chapter in &self.chapters {
            zip.start_file(format!("EPUB/{}", chapter.filename), deflated)?;
            zip.write_all(self.chapter_document(chapter).as_bytes())?;
        }

        for item in &self.items {
            // Images are already compressed.
            let options = if item.media_type.starts_with("image/") {
                stored
            } else {
                deflated
            };
            zip.start_file(format!("EPUB/{}", item.filename), options)?;
            zip.write_all(&item.data)?;
        }

        Ok(zip.finish()?)
    }

    fn spine(&self) -> Vec<SpineItem> {
        if !self.spine.is_empty() {
            return self.spine.clone();
        }
        self.chapters
            .iter()
            .map(|c| SpineItem::Chapter(c.id.clone()))
            .collect()
    }

    fn stylesheet_links(&self) -> String {
        self.items
            .iter()
            .filter(|item| item.media_type == "text/css")
            .map(|item| {
                format!(
                    r#"<link rel="stylesheet" type="text/css" href="{}"/>"#,
                    escape_xml(&item.filename)
                )
            })
            .collect()
    }

    fn package_document(&self, metadata: &BookMetadata) -> String {
        let modified = self.modified.unwrap_or_else(Utc::now);

        let mut manifest = String::new();
        manifest.push_str(&format!(
            "    <item id=\"ncx\" href=\"{}\" media-type=\"application/x-dtbncx+xml\"/>\n",
            NCX_FILE
        ));
        manifest.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
            NAV_ID, NAV_FILE
        ));
        for chapter in &self.chapters {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                escape_xml(&chapter.id),
                escape_xml(&chapter.filename)
            ));
        }
        for item in &self.items {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
                escape_xml(&item.id),
                escape_xml(&item.filename),
                escape_xml(&item.media_type)
            ));
        }

        let spine: String = self
            .spine()
            .iter()
            .map(|entry| {
                let idref = match entry {
                    SpineItem::Nav => NAV_ID.to_string(),
                    SpineItem::Chapter(id) => escape_xml(id),
                };
                format!("    <itemref idref=\"{}\"/>\n", idref)
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id" xml:lang="{lang}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
            identifier = escape_xml(&metadata.identifier),
            title = escape_xml(&metadata.title),
            lang = escape_xml(&metadata.language),
            modified = modified.format("%Y-%m-%dT%H:%M:%SZ"),
            manifest = manifest,
            spine = spine,
        )
    }

    fn nav_document(&self, metadata: &BookMetadata) -> String {
        let entries: String = self
            .toc
            .iter()
            .map(|entry| {
                format!(
                    "        <li><a href=\"{}\">{}</a></li>\n",
                    escape_xml(&entry.href),
                    escape_xml(&entry.title)
                )
            })
            .collect();

        let body = format!(
            "    <nav epub:type=\"toc\" id=\"id\">\n      <h2>{}</h2>\n      <ol>\n{}      </ol>\n    </nav>\n",
            escape_xml(&metadata.title),
            entries
        );
        self.xhtml_document(&metadata.title, &metadata.language, &body)
    }

    fn ncx_document(&self, metadata: &BookMetadata) -> String {
        let points: String = self
            .toc
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "    <navPoint id=\"{}\" playOrder=\"{}\">\n      <navLabel><text>{}</text></navLabel>\n      <content src=\"{}\"/>\n    </navPoint>\n",
                    escape_xml(&entry.id),
                    i + 1,
                    escape_xml(&entry.title),
                    escape_xml(&entry.href)
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{points}  </navMap>
</ncx>
"#,
            uid = escape_xml(&metadata.identifier),
            title = escape_xml(&metadata.title),
            points = points,
        )
    }

    fn chapter_document(&self, chapter: &Chapter) -> String {
        self.xhtml_document(&chapter.title, &chapter.language, &chapter.body)
    }

    fn xhtml_document(&self, title: &str, language: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
  <head>
    <title>{title}</title>
    {links}
  </head>
  <body>
{body}  </body>
</html>
"#,
            lang = escape_xml(language),
            title = escape_xml(title),
            links = self.stylesheet_links(),
            body = body,
        )
    }
}

impl BookWriter for EpubWriter {
    fn set_metadata(&mut self, metadata: BookMetadata) {
        self.metadata = Some(metadata);
    }

    fn add_binary_item(&mut self, item: BinaryItem) {
        self.items.push(item);
    }

    fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    fn set_toc(&mut self, entries: Vec<TocEntry>) {
        self.toc = entries;
    }

    fn set_spine(&mut self, items: Vec<SpineItem>) {
        self.spine = items;
    }

    fn finalize(&mut self, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }

        let file = File::create(output)
            .with_context(|| format!("Failed to create output file: {}", output.display()))?;
        self.write_to(file)
            .with_context(|| format!("Failed to write EPUB: {}", output.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn sample_book() -> EpubWriter {
        let mut book = EpubWriter::new()
            .with_modified(Utc.with_ymd_and_hms(2024, 10, 11, 0, 0, 0).unwrap());
        book.set_metadata(BookMetadata {
            identifier: "id123456".to_string(),
            title: "Posts & Things".to_string(),
            language: "en".to_string(),
        });
        book.add_binary_item(BinaryItem {
            id: "img_1".to_string(),
            filename: "img_1.jpg".to_string(),
            media_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8, 0xff],
        });
        book.add_binary_item(BinaryItem {
            id: "style_nav".to_string(),
            filename: "style/nav.css".to_string(),
            media_type: "text/css".to_string(),
            data: b"BODY {}".to_vec(),
        });
        book.add_chapter(Chapter {
            id: "chap_01".to_string(),
            filename: "chap_01.xhtml".to_string(),
            title: "Posts".to_string(),
            language: "en".to_string(),
            body: "<p>hello</p>\n".to_string(),
        });
        book.set_toc(vec![TocEntry {
            href: "chap_01.xhtml".to_string(),
            title: "Posts".to_string(),
            id: "chap_01".to_string(),
        }]);
        book.set_spine(vec![SpineItem::Nav, SpineItem::Chapter("chap_01".to_string())]);
        book
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    fn archive(book: &EpubWriter) -> ZipArchive<Cursor<Vec<u8>>> {
        let cursor = book.write_to(Cursor::new(Vec::new())).unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn test_mimetype_is_first_and_stored() {
        let mut archive = archive(&sample_book());
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_package_lists_items_and_spine() {
        let mut archive = archive(&sample_book());
        let opf = read_entry(&mut archive, "EPUB/content.opf");

        assert!(opf.contains(r#"<dc:identifier id="id">id123456</dc:identifier>"#));
        assert!(opf.contains("<dc:title>Posts &amp; Things</dc:title>"));
        assert!(opf.contains("2024-10-11T00:00:00Z"));
        assert!(opf.contains(r#"<item id="img_1" href="img_1.jpg" media-type="image/jpeg"/>"#));
        assert!(opf.contains(r#"<item id="chap_01" href="chap_01.xhtml""#));

        let nav = opf.find(r#"<itemref idref="nav"/>"#).unwrap();
        let chapter = opf.find(r#"<itemref idref="chap_01"/>"#).unwrap();
        assert!(nav < chapter);
    }

    #[test]
    fn test_chapter_is_wrapped_and_styled() {
        let mut archive = archive(&sample_book());
        let chapter = read_entry(&mut archive, "EPUB/chap_01.xhtml");

        assert!(chapter.contains("<title>Posts</title>"));
        assert!(chapter.contains(r#"href="style/nav.css""#));
        assert!(chapter.contains("<p>hello</p>"));

        let nav = read_entry(&mut archive, "EPUB/nav.xhtml");
        assert!(nav.contains(r#"<a href="chap_01.xhtml">Posts</a>"#));
        let ncx = read_entry(&mut archive, "EPUB/toc.ncx");
        assert!(ncx.contains(r#"<content src="chap_01.xhtml"/>"#));
    }

    #[test]
    fn test_finalize_without_metadata_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut book = EpubWriter::new();
        let err = book.finalize(&dir.path().join("out.epub")).unwrap_err();
        assert!(format!("{:#}", err).contains("metadata"));
    }

    #[test]
    fn test_finalize_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("nested/deeper/book.epub");
        sample_book().finalize(&output).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_finalize_reports_unusable_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = sample_book()
            .finalize(&blocker.join("sub/book.epub"))
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to create output directory"));
        assert!(message.contains("blocker"));
    }
}
