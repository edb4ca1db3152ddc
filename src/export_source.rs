//! Channel source reading Telegram Desktop "Export chat history" output.
//!
//! Each channel is a directory holding `result.json` plus the exported media
//! (`photos/`, `files/`). Channels are looked up as
//! `<exports_dir>/<identity without leading '@'>`, or as a directory path
//! given directly.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::post::{MediaPayload, MediaRef};
use crate::source::{ChannelSource, Messages, Query, RawMessage};

const EXPORT_FILE: &str = "result.json";
/// Placeholder Telegram writes when media was excluded from the export.
const NOT_INCLUDED: &str = "(File not included";

#[derive(Debug, Deserialize)]
struct Export {
    name: Option<String>,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportMessage {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    date: String,
    date_unixtime: Option<String>,
    #[serde(default)]
    text: ExportText,
    photo: Option<String>,
    file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExportText {
    Plain(String),
    Rich(Vec<TextPart>),
}

impl Default for ExportText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TextPart {
    Plain(String),
    Entity { text: String },
}

impl ExportText {
    fn flatten(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Rich(parts) => parts
                .iter()
                .map(|part| match part {
                    TextPart::Plain(text) | TextPart::Entity { text } => text.as_str(),
                })
                .collect(),
        }
    }
}

/// A parsed channel export.
#[derive(Debug, Clone)]
pub struct ExportChannel {
    dir: PathBuf,
    title: String,
    /// Newest first
    messages: Vec<ExportMessage>,
}

impl ExportChannel {
    fn convert(&self, message: &ExportMessage) -> Result<RawMessage> {
        Ok(RawMessage {
            id: message.id,
            date: parse_date(message)?.fixed_offset(),
            text: message.text.flatten(),
            media: self.media(message),
        })
    }

    fn media(&self, message: &ExportMessage) -> Option<MediaPayload> {
        if let Some(photo) = &message.photo {
            return Some(match self.media_ref(photo) {
                Some(media) => MediaPayload::Photo(media),
                None => MediaPayload::Unsupported(photo.clone()),
            });
        }
        if let Some(file) = &message.file {
            return Some(match self.media_ref(file) {
                Some(media) => MediaPayload::Document(media),
                None => MediaPayload::Unsupported(file.clone()),
            });
        }
        None
    }

    fn media_ref(&self, relative: &str) -> Option<MediaRef> {
        if relative.starts_with(NOT_INCLUDED) {
            return None;
        }
        Some(MediaRef::new(self.dir.join(relative).to_string_lossy()))
    }
}

fn parse_date(message: &ExportMessage) -> Result<DateTime<Utc>> {
    let bad_date = || SourceError::BadDate {
        id: message.id,
        date: message.date.clone(),
    };

    if let Some(unix) = &message.date_unixtime {
        let secs: i64 = unix.parse().map_err(|_| bad_date())?;
        return DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| bad_date().into());
    }
    let naive = NaiveDateTime::parse_from_str(&message.date, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| bad_date())?;
    Ok(naive.and_utc())
}

/// Reads channels from a directory of Telegram exports.
#[derive(Debug, Clone)]
pub struct ExportSource {
    root: PathBuf,
}

impl ExportSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn channel_dir(&self, identity: &str) -> PathBuf {
        let direct = Path::new(identity);
        if direct.join(EXPORT_FILE).is_file() {
            return direct.to_path_buf();
        }
        self.root.join(identity.trim_start_matches('@'))
    }
}

impl ChannelSource for ExportSource {
    type Channel = ExportChannel;

    fn resolve(&self, identity: &str) -> Result<ExportChannel> {
        let dir = self.channel_dir(identity);
        let path = dir.join(EXPORT_FILE);
        if !path.is_file() {
            return Err(SourceError::ChannelNotFound {
                identity: identity.to_string(),
                path,
            }
            .into());
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read export: {}", path.display()))?;
        let export: Export = serde_json::from_slice(&bytes)
            .map_err(|source| SourceError::Malformed {
                path: path.clone(),
                source,
            })?;

        let mut messages: Vec<ExportMessage> = export
            .messages
            .into_iter()
            .filter(|m| m.kind == "message")
            .collect();
        // Message ids grow with time within a channel.
        messages.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(ExportChannel {
            dir,
            title: export.name.unwrap_or_else(|| identity.to_string()),
            messages,
        })
    }

    fn title(&self, channel: &ExportChannel) -> String {
        channel.title.clone()
    }

    fn iterate<'a>(&'a self, channel: &'a ExportChannel, query: Query) -> Result<Messages<'a>> {
        let messages = channel.messages.iter().map(move |m| channel.convert(m));
        let messages: Messages<'a> = match query {
            Query::Latest { limit } => Box::new(messages.take(limit)),
            Query::Before { offset_date } => Box::new(messages.skip_while(move |m| {
                matches!(m, Ok(message) if message.date > offset_date)
            })),
        };
        Ok(messages)
    }

    fn download(&self, media: &MediaRef, dest: &Path) -> Result<()> {
        let from = Path::new(media.as_str());
        fs::copy(from, dest).with_context(|| {
            format!("Failed to copy {} to {}", from.display(), dest.display())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const EXPORT: &str = r#"{
        "name": "Whales Go High",
        "type": "public_channel",
        "id": 1234,
        "messages": [
            {"id": 1, "type": "service", "date": "2024-10-01T00:00:00", "date_unixtime": "1727740800", "action": "create_channel", "text": ""},
            {"id": 2, "type": "message", "date": "2024-10-01T10:00:00", "date_unixtime": "1727776800", "text": "plain"},
            {"id": 3, "type": "message", "date": "2024-10-02T10:00:00", "date_unixtime": "1727863200",
             "text": ["see ", {"type": "link", "text": "https://example.com"}, " now"],
             "photo": "photos/photo_1.jpg", "width": 10, "height": 10},
            {"id": 4, "type": "message", "date": "2024-10-03T10:00:00",
             "text": "", "file": "files/scan.png", "mime_type": "image/png"},
            {"id": 5, "type": "message", "date": "2024-10-04T10:00:00", "date_unixtime": "1728036000",
             "text": "skipped media", "photo": "(File not included. Change data exporting settings to download.)"}
        ]
    }"#;

    fn export_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let channel = dir.path().join("whalesgohigh");
        fs::create_dir_all(channel.join("photos")).unwrap();
        fs::write(channel.join(EXPORT_FILE), EXPORT).unwrap();
        fs::write(channel.join("photos/photo_1.jpg"), b"jpeg").unwrap();
        dir
    }

    fn collect(source: &ExportSource, channel: &ExportChannel, query: Query) -> Vec<RawMessage> {
        source
            .iterate(channel, query)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_resolves_by_at_name() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let channel = source.resolve("@whalesgohigh").unwrap();
        assert_eq!(source.title(&channel), "Whales Go High");
    }

    #[test]
    fn test_resolves_by_directory_path() {
        let dir = export_dir();
        let source = ExportSource::new("/nonexistent");
        let path = dir.path().join("whalesgohigh");
        assert!(source.resolve(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_missing_channel_is_not_found() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let err = source.resolve("@nobody").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::ChannelNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_export_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bad")).unwrap();
        fs::write(dir.path().join("bad").join(EXPORT_FILE), "{ nope").unwrap();
        let source = ExportSource::new(dir.path());
        let err = source.resolve("bad").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Malformed { .. })
        ));
    }

    #[test]
    fn test_messages_newest_first_without_service_entries() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let channel = source.resolve("@whalesgohigh").unwrap();

        let ids: Vec<i64> = collect(&source, &channel, Query::Latest { limit: 10 })
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![5, 4, 3, 2]);
    }

    #[test]
    fn test_message_fields_are_mapped() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let channel = source.resolve("@whalesgohigh").unwrap();
        let messages = collect(&source, &channel, Query::Latest { limit: 10 });

        let rich = messages.iter().find(|m| m.id == 3).unwrap();
        assert_eq!(rich.text, "see https://example.com now");
        assert_eq!(
            rich.date,
            Utc.with_ymd_and_hms(2024, 10, 2, 10, 0, 0).unwrap().fixed_offset()
        );
        match &rich.media {
            Some(MediaPayload::Photo(media)) => assert!(media.as_str().ends_with("photo_1.jpg")),
            other => panic!("expected photo, got {:?}", other),
        }

        // No unixtime: naive date read as UTC.
        let doc = messages.iter().find(|m| m.id == 4).unwrap();
        assert_eq!(
            doc.date,
            Utc.with_ymd_and_hms(2024, 10, 3, 10, 0, 0).unwrap().fixed_offset()
        );
        assert!(matches!(
            &doc.media,
            Some(MediaPayload::Document(media)) if media.as_str().ends_with("scan.png")
        ));

        let excluded = messages.iter().find(|m| m.id == 5).unwrap();
        assert!(matches!(&excluded.media, Some(MediaPayload::Unsupported(_))));

        let plain = messages.iter().find(|m| m.id == 2).unwrap();
        assert!(plain.media.is_none());
    }

    #[test]
    fn test_before_starts_at_offset() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let channel = source.resolve("@whalesgohigh").unwrap();
        let offset = Utc.with_ymd_and_hms(2024, 10, 2, 12, 0, 0).unwrap().fixed_offset();

        let ids: Vec<i64> = collect(&source, &channel, Query::Before { offset_date: offset })
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_download_copies_file() {
        let dir = export_dir();
        let source = ExportSource::new(dir.path());
        let channel = source.resolve("@whalesgohigh").unwrap();
        let messages = collect(&source, &channel, Query::Latest { limit: 10 });
        let Some(MediaPayload::Photo(media)) = &messages.iter().find(|m| m.id == 3).unwrap().media
        else {
            panic!("expected photo");
        };

        let dest = dir.path().join("copy.jpg");
        source.download(media, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"jpeg");

        let missing = MediaRef::new(dir.path().join("nope.jpg").to_string_lossy());
        assert!(source.download(&missing, &dest).is_err());
    }
}
