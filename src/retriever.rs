use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::post::Post;
use crate::source::{ChannelSource, Query, RawMessage};

/// Retrieval strategy. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The `count` most recent posts, unfiltered.
    Latest { count: usize },
    /// Posts with `start <= timestamp <= end`.
    DateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Read one channel according to `strategy`.
///
/// Posts come back in the order the source yields them (newest first).
pub fn retrieve<S: ChannelSource>(
    source: &S,
    identity: &str,
    strategy: &Strategy,
) -> Result<Vec<Post>> {
    info!(channel = identity, "getting posts");
    let channel = source
        .resolve(identity)
        .with_context(|| format!("Failed to resolve channel {}", identity))?;
    let title = source.title(&channel);

    let mut posts = Vec::new();

    match *strategy {
        Strategy::Latest { count } => {
            // The source may hand back more than `limit`.
            let messages = source
                .iterate(&channel, Query::Latest { limit: count })?
                .take(count);
            for message in messages {
                let post = normalize(message?, &title);
                debug!(date = %post.timestamp, id = post.id, "retrieved message");
                posts.push(post);
            }
        }
        Strategy::DateRange { start, end } => {
            let query = Query::Before {
                offset_date: end.fixed_offset(),
            };
            for message in source.iterate(&channel, query)? {
                let post = normalize(message?, &title);
                debug!(date = %post.timestamp, id = post.id, "evaluating message");

                if post.timestamp < start {
                    debug!(date = %post.timestamp, %start, "message predates window, stopping");
                    break;
                }
                if post.timestamp <= end {
                    posts.push(post);
                }
            }
        }
    }

    info!(channel = identity, total = posts.len(), "posts retrieved");
    Ok(posts)
}

fn normalize(message: RawMessage, channel_title: &str) -> Post {
    Post {
        id: message.id,
        timestamp: message.date.with_timezone(&Utc),
        channel_title: channel_title.to_string(),
        text: message.text,
        media: message.media,
    }
}
