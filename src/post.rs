use chrono::{DateTime, Utc};

/// One retrieved channel message, normalized for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Unique within its channel only. Two channels may both have a post 42.
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// Channel display name at retrieval time.
    pub channel_title: String,
    /// May be empty for media-only posts.
    pub text: String,
    pub media: Option<MediaPayload>,
}

/// Reference to a downloadable blob, meaningful only to the source that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Media attached to a message, as the source reports it.
///
/// Sources map whatever their service sends onto these variants.
/// Anything they cannot map goes to `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPayload {
    Photo(MediaRef),
    /// Generic file attachment.
    Document(MediaRef),
    /// Link preview. Some services attach a whole photo collection to it.
    WebPage { photos: Vec<MediaPayload> },
    Unsupported(String),
}
