use anyhow::Result;
use tracing::info;

use crate::post::Post;
use crate::retriever::{self, Strategy};
use crate::source::ChannelSource;

/// Posts from every channel, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    posts: Vec<Post>,
}

impl From<Vec<Post>> for Timeline {
    fn from(mut posts: Vec<Post>) -> Self {
        // Stable: equal timestamps keep retrieval order.
        posts.sort_by_key(|p| p.timestamp);
        Self { posts }
    }
}

impl Timeline {
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Retrieve each channel in order and merge the results into one timeline.
///
/// Returns `None` when no channel produced a single post.
pub fn aggregate<S, I>(source: &S, channels: I, strategy: &Strategy) -> Result<Option<Timeline>>
where
    S: ChannelSource,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut posts = Vec::new();
    for channel in channels {
        posts.extend(retriever::retrieve(source, channel.as_ref(), strategy)?);
    }

    let timeline = Timeline::from(posts);
    info!(total = timeline.len(), "posts to be added to the book");

    if timeline.is_empty() {
        return Ok(None);
    }
    Ok(Some(timeline))
}
