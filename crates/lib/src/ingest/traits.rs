use crate::errors::FeedFetchError;
use crate::ingest::types::FeedEntry;
use async_trait::async_trait;

/// The contract for a feed plugin.
///
/// Implementations fetch the document at `feed_url` and return its entries in
/// feed order. An unreachable URL or an unparseable document is a
/// [`FeedFetchError`]; entries with missing fields are returned with defaults
/// rather than failing the whole batch.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedFetchError>;
}
