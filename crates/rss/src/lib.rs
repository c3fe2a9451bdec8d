//! # `feedvault-rss`: Feed Reader Plugin
//!
//! Fetches a syndication feed over HTTP and turns it into [`FeedEntry`] values,
//! implementing the [`FeedSource`] trait from the core `feedvault` library.
//! RSS 2.0 is tried first, then Atom.

use async_trait::async_trait;
use atom_syndication::Feed as AtomFeed;
use feedvault::errors::FeedFetchError;
use feedvault::ingest::{FeedEntry, FeedSource};
use rss::Channel;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Custom error types for fetching and parsing feeds.
#[derive(Error, Debug)]
pub enum RssFeedError {
    #[error("Failed to build Reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to fetch feed: {0}")]
    Fetch(reqwest::Error),
    #[error("Fetching feed timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("Feed URL {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Document is neither RSS ({rss}) nor Atom ({atom})")]
    Parse {
        rss: rss::Error,
        atom: atom_syndication::Error,
    },
}

impl From<reqwest::Error> for RssFeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RssFeedError::Timeout(err)
        } else {
            RssFeedError::Fetch(err)
        }
    }
}

/// A helper to convert the specific `RssFeedError` into the generic `FeedFetchError`.
impl From<RssFeedError> for FeedFetchError {
    fn from(err: RssFeedError) -> Self {
        match err {
            RssFeedError::Timeout(_) => FeedFetchError::Timeout(err.to_string()),
            RssFeedError::Parse { .. } => FeedFetchError::Parse(err.to_string()),
            RssFeedError::ClientBuild(_) | RssFeedError::Fetch(_) | RssFeedError::Status { .. } => {
                FeedFetchError::Fetch(err.to_string())
            }
        }
    }
}

/// The `FeedSource` implementation for RSS and Atom feeds served over HTTP(S).
#[derive(Clone, Debug)]
pub struct RssFeedReader {
    client: reqwest::Client,
}

impl RssFeedReader {
    /// Creates a reader whose fetches expire after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RssFeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RssFeedError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Downloads the raw feed document.
    pub async fn fetch_bytes(&self, feed_url: &str) -> Result<Vec<u8>, RssFeedError> {
        info!("Fetching feed from: {}", feed_url);
        let response = self.client.get(feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RssFeedError::Status {
                url: feed_url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FeedSource for RssFeedReader {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        let body = self.fetch_bytes(feed_url).await?;
        Ok(parse_feed(&body)?)
    }
}

/// Parses an RSS 2.0 or Atom document into entries, preserving document order.
///
/// An Atom document that fails as a whole is retried entry by entry, so one bad
/// entry (an unparseable timestamp, say) is skipped with a warning instead of
/// losing the rest of the feed.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedEntry>, RssFeedError> {
    match Channel::read_from(body) {
        Ok(channel) => {
            debug!("Parsed RSS channel '{}'", channel.title());
            Ok(channel.items().iter().map(rss_entry).collect())
        }
        Err(rss) => match AtomFeed::read_from(body) {
            Ok(feed) => {
                debug!("Parsed Atom feed '{}'", feed.title().as_str());
                Ok(feed.entries().iter().map(atom_entry).collect())
            }
            Err(atom) => match recover_atom_entries(body, &atom) {
                Some(entries) => Ok(entries),
                None => Err(RssFeedError::Parse { rss, atom }),
            },
        },
    }
}

const ATOM_ENTRY_CLOSE: &str = "</entry>";

/// Parses each `<entry>` of an Atom document on its own, dropping the ones that fail.
///
/// Returns `None` when the document is not an Atom feed or no entry survives.
fn recover_atom_entries(
    body: &[u8],
    cause: &atom_syndication::Error,
) -> Option<Vec<FeedEntry>> {
    if matches!(
        cause,
        atom_syndication::Error::InvalidStartTag | atom_syndication::Error::Eof
    ) {
        return None;
    }
    let text = std::str::from_utf8(body).ok()?;
    if !text.contains("<feed") {
        return None;
    }

    let mut entries = Vec::new();
    for (position, fragment) in atom_entry_fragments(text).into_iter().enumerate() {
        match atom_syndication::Entry::read_from(fragment.as_bytes()) {
            Ok(entry) => entries.push(atom_entry(&entry)),
            Err(err) => warn!("Skipping malformed Atom entry #{}: {err}", position + 1),
        }
    }

    if entries.is_empty() {
        None
    } else {
        warn!(
            "Atom feed did not parse as a whole ({cause}); recovered {} entries",
            entries.len()
        );
        Some(entries)
    }
}

/// Splits out the raw `<entry ...>...</entry>` elements, in document order.
fn atom_entry_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut rest = text;
    while let Some(start) = find_entry_start(rest) {
        let tail = &rest[start..];
        let Some(close) = tail.find(ATOM_ENTRY_CLOSE) else {
            break;
        };
        let end = close + ATOM_ENTRY_CLOSE.len();
        fragments.push(&tail[..end]);
        rest = &tail[end..];
    }
    fragments
}

fn find_entry_start(text: &str) -> Option<usize> {
    text.match_indices("<entry").map(|(i, _)| i).find(|&i| {
        matches!(
            text[i + "<entry".len()..].chars().next(),
            Some('>' | ' ' | '\t' | '\n' | '\r')
        )
    })
}

/// Maps an RSS item: `<description>` is the summary, `content:encoded` the content block.
fn rss_entry(item: &rss::Item) -> FeedEntry {
    let mut entry = FeedEntry::new(item.title(), item.link());
    if let Some(description) = item.description() {
        entry = entry.with_summary(description);
    }
    if let Some(content) = item.content() {
        entry = entry.with_content(content, Some("text/html"));
    }
    entry
}

/// Maps an Atom entry; the first link is taken as the entry's link.
fn atom_entry(item: &atom_syndication::Entry) -> FeedEntry {
    let link = item.links().first().map(|l| l.href());
    let mut entry = FeedEntry::new(Some(item.title().as_str()), link);
    if let Some(summary) = item.summary() {
        entry = entry.with_summary(summary.as_str());
    }
    if let Some(value) = item.content().and_then(|c| c.value()) {
        let content_type = item.content().and_then(|c| c.content_type());
        entry = entry.with_content(value, content_type);
    }
    entry
}
