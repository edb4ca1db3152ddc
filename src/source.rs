use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use std::path::Path;

use crate::post::{MediaPayload, MediaRef};

/// Message as it comes out of a source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: i64,
    /// Whatever offset the service reports. The retriever converts to UTC.
    pub date: DateTime<FixedOffset>,
    pub text: String,
    pub media: Option<MediaPayload>,
}

/// How far back to read a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// The `limit` most recent messages.
    Latest { limit: usize },
    /// Everything at or before `offset_date`, going back in time.
    Before { offset_date: DateTime<FixedOffset> },
}

pub type Messages<'a> = Box<dyn Iterator<Item = Result<RawMessage>> + 'a>;

/// Access to a messaging service's channel history.
///
/// Both queries yield messages newest first. Date-range retrieval stops at the
/// first message older than the window, so a source that cannot keep that
/// order must not be used with it.
pub trait ChannelSource {
    type Channel;

    /// Look a channel up by its public identity (e.g. `@name`).
    fn resolve(&self, identity: &str) -> Result<Self::Channel>;

    /// Display title of a resolved channel.
    fn title(&self, channel: &Self::Channel) -> String;

    fn iterate<'a>(&'a self, channel: &'a Self::Channel, query: Query) -> Result<Messages<'a>>;

    /// Write the blob behind `media` to `dest`, replacing any existing file.
    fn download(&self, media: &MediaRef, dest: &Path) -> Result<()>;
}
