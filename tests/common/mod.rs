#![allow(dead_code)]

use chanbook::config::RunConfig;
use chanbook::retriever::Strategy;
use chanbook::writer::BookMetadata;
use chrono::{DateTime, TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub fn day(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, d, hour, 0, 0).unwrap()
}

pub fn color_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(6, 4, |x, y| {
        Rgb([(x * 40) as u8, (y * 60) as u8, 180])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn run_config(root: &Path, channels: &[&str], strategy: Strategy) -> RunConfig {
    RunConfig {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        strategy,
        output: root.join("out/combined_posts.epub"),
        images_dir: root.join("images"),
        exports_dir: root.join("exports"),
        page_breaks: true,
        extract_images: true,
        grayscale: true,
        metadata: BookMetadata {
            identifier: "id123456".to_string(),
            title: "Posts from Multiple Channels".to_string(),
            language: "en".to_string(),
        },
    }
}

/// The finished container, opened for inspection.
pub struct Book {
    archive: ZipArchive<File>,
}

impl Book {
    pub fn open(path: &PathBuf) -> Self {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        Self { archive }
    }

    pub fn entry(&mut self, name: &str) -> Vec<u8> {
        let mut data = Vec::new();
        self.archive
            .by_name(name)
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        data
    }

    pub fn text(&mut self, name: &str) -> String {
        String::from_utf8(self.entry(name)).unwrap()
    }

    pub fn names(&self) -> Vec<String> {
        self.archive.file_names().map(|n| n.to_string()).collect()
    }

    pub fn image_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names()
            .into_iter()
            .filter(|n| n.starts_with("EPUB/image_"))
            .collect();
        names.sort();
        names
    }
}
