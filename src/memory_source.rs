//! Channel source backed by in-process data.
//!
//! Useful when messages come from somewhere other than a Telegram export,
//! and for exercising the pipeline without touching a real service.

use anyhow::{Context, Result};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::SourceError;
use crate::post::MediaRef;
use crate::source::{ChannelSource, Messages, Query, RawMessage};

#[derive(Debug, Clone)]
pub struct MemoryChannel {
    title: String,
    messages: Vec<RawMessage>,
    preserve_order: bool,
}

impl MemoryChannel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            messages: Vec::new(),
            preserve_order: false,
        }
    }

    /// Yield messages exactly in push order instead of newest first.
    pub fn preserve_order(mut self) -> Self {
        self.preserve_order = true;
        self
    }

    pub fn push(&mut self, message: RawMessage) {
        self.messages.push(message);
    }

    fn ordered(&self) -> Vec<RawMessage> {
        let mut messages = self.messages.clone();
        if !self.preserve_order {
            messages.sort_by_key(|m| Reverse(m.date));
        }
        messages
    }
}

#[derive(Debug, Clone)]
pub struct MemorySource {
    channels: HashMap<String, MemoryChannel>,
    blobs: HashMap<MediaRef, Vec<u8>>,
    honor_offsets: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            blobs: HashMap::new(),
            honor_offsets: true,
        }
    }

    /// Behave like a service that cannot seek: `Before` queries start at the
    /// newest message regardless of the offset.
    pub fn ignore_offsets(mut self) -> Self {
        self.honor_offsets = false;
        self
    }

    pub fn add_channel(&mut self, identity: impl Into<String>, channel: MemoryChannel) {
        self.channels.insert(identity.into(), channel);
    }

    pub fn add_blob(&mut self, media: MediaRef, bytes: Vec<u8>) {
        self.blobs.insert(media, bytes);
    }
}

impl ChannelSource for MemorySource {
    type Channel = MemoryChannel;

    fn resolve(&self, identity: &str) -> Result<MemoryChannel> {
        self.channels.get(identity).cloned().ok_or_else(|| {
            SourceError::ChannelNotFound {
                identity: identity.to_string(),
                path: "<memory>".into(),
            }
            .into()
        })
    }

    fn title(&self, channel: &MemoryChannel) -> String {
        channel.title.clone()
    }

    fn iterate<'a>(&'a self, channel: &'a MemoryChannel, query: Query) -> Result<Messages<'a>> {
        let messages = channel.ordered().into_iter();
        let messages: Messages<'a> = match query {
            Query::Latest { limit } => Box::new(messages.take(limit).map(Ok)),
            Query::Before { offset_date } if self.honor_offsets => Box::new(
                messages
                    .skip_while(move |m| m.date > offset_date)
                    .map(Ok),
            ),
            Query::Before { .. } => Box::new(messages.map(Ok)),
        };
        Ok(messages)
    }

    fn download(&self, media: &MediaRef, dest: &Path) -> Result<()> {
        let bytes = self
            .blobs
            .get(media)
            .ok_or_else(|| SourceError::UnknownMedia(media.as_str().to_string()))?;
        fs::write(dest, bytes).with_context(|| format!("Failed to write {}", dest.display()))
    }
}
