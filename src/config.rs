use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::retriever::Strategy;
use crate::writer::BookMetadata;

pub const DEFAULT_OUTPUT: &str = "combined_posts.epub";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_EXPORTS_DIR: &str = "exports";
pub const DEFAULT_TITLE: &str = "Posts from Multiple Channels";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Contents of the TOML configuration file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub channels: Vec<String>,
    pub post_count: Option<usize>,
    /// String or TOML date/datetime
    pub start_date: Option<toml::Value>,
    pub end_date: Option<toml::Value>,
    pub output: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub exports_dir: Option<PathBuf>,
    pub enforce_page_breaks: Option<bool>,
    pub extract_images: Option<bool>,
    pub grayscale_images: Option<bool>,
    pub book: BookConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    pub title: Option<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub channels: Vec<String>,
    pub strategy: Strategy,
    pub output: PathBuf,
    pub images_dir: PathBuf,
    pub exports_dir: PathBuf,
    pub page_breaks: bool,
    pub extract_images: bool,
    pub grayscale: bool,
    pub metadata: BookMetadata,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file)?)
    }

    /// Combine command line and file values. The command line wins.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let channels = if cli.channels.is_empty() {
            file.channels
        } else {
            cli.channels.clone()
        };
        if channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }

        let cli_names_strategy = cli.posts.is_some() || cli.start.is_some() || cli.end.is_some();
        let strategy = if cli_names_strategy {
            resolve_strategy(cli.posts, cli.start.clone(), cli.end.clone())?
        } else {
            resolve_strategy(
                file.post_count,
                file.start_date.map(date_text),
                file.end_date.map(date_text),
            )?
        };

        let metadata = BookMetadata {
            identifier: file
                .book
                .identifier
                .unwrap_or_else(|| format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            title: cli
                .title
                .clone()
                .or(file.book.title)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            language: cli
                .language
                .clone()
                .or(file.book.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        };

        Ok(Self {
            channels,
            strategy,
            output: pick(&cli.output, file.output, DEFAULT_OUTPUT),
            images_dir: pick(&cli.images_dir, file.images_dir, DEFAULT_IMAGES_DIR),
            exports_dir: pick(&cli.exports_dir, file.exports_dir, DEFAULT_EXPORTS_DIR),
            page_breaks: !cli.no_page_breaks && file.enforce_page_breaks.unwrap_or(true),
            extract_images: !cli.no_images && file.extract_images.unwrap_or(true),
            grayscale: !cli.no_grayscale && file.grayscale_images.unwrap_or(true),
            metadata,
        })
    }
}

fn pick(flag: &Option<PathBuf>, file: Option<PathBuf>, default: &str) -> PathBuf {
    flag.clone()
        .or(file)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn date_text(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Datetime(dt) => dt.to_string(),
        other => other.to_string(),
    }
}

fn resolve_strategy(
    posts: Option<usize>,
    start: Option<String>,
    end: Option<String>,
) -> Result<Strategy, ConfigError> {
    match (posts, start, end) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigError::ConflictingStrategy),
        (Some(0), None, None) => Err(ConfigError::ZeroPostCount),
        (Some(count), None, None) => Ok(Strategy::Latest { count }),
        (None, Some(start), Some(end)) => {
            let start_at = parse_date(&start, false)?;
            let end_at = parse_date(&end, true)?;
            if start_at > end_at {
                return Err(ConfigError::InvertedRange { start, end });
            }
            Ok(Strategy::DateRange {
                start: start_at,
                end: end_at,
            })
        }
        _ => Err(ConfigError::MissingStrategy),
    }
}

/// RFC 3339 instant, a datetime without offset (read as UTC), or a bare
/// date taken as the start (or, for `end_of_day`, the last second) of that
/// UTC day.
pub fn parse_date(text: &str, end_of_day: bool) -> Result<DateTime<Utc>, ConfigError> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(local) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(local.and_utc());
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDate(text.to_string()))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| ConfigError::InvalidDate(text.to_string()))?;
    Ok(date.and_time(time).and_utc())
}
