//! # Ingestion Types
//!
//! Transient values passed between the pipeline steps. Nothing here is
//! persisted locally; uploaded bytes and attachments live in the remote service.

/// Title used for entries that carry none.
pub const DEFAULT_TITLE: &str = "untitled";

/// A block of entry content, such as RSS `content:encoded` or Atom `<content>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub value: String,
    pub content_type: Option<String>,
}

/// A single entry of a fetched feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: Option<String>,
    pub title: String,
    /// RSS `<description>` or Atom `<summary>`.
    pub summary: Option<String>,
    pub content: Vec<ContentBlock>,
}

impl FeedEntry {
    /// Creates an entry without any text. A missing or blank title becomes `untitled`.
    pub fn new(title: Option<&str>, link: Option<&str>) -> Self {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE);
        Self {
            link: link.map(String::from),
            title: title.to_string(),
            summary: None,
            content: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_content(mut self, value: impl Into<String>, content_type: Option<&str>) -> Self {
        self.content.push(ContentBlock {
            value: value.into(),
            content_type: content_type.map(String::from),
        });
        self
    }

    /// The link, or a placeholder suitable for log lines.
    pub fn display_link(&self) -> &str {
        self.link.as_deref().unwrap_or("<no link>")
    }
}

/// An in-memory, file-like payload ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub file_name: String,
    /// UTF-8 encoded text.
    pub content: Vec<u8>,
}

/// A document accepted by the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub file_id: String,
}

/// The association of an uploaded file with a vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAttachment {
    pub file_id: String,
    pub store_id: String,
    pub status: Option<String>,
}

/// An entry that was uploaded and attached during a job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub link: Option<String>,
    pub file_name: String,
    pub file_id: String,
}

/// An entry whose upload or attach failed during a job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub link: Option<String>,
    pub title: String,
    /// Set when the upload succeeded but attaching it failed, leaving an orphaned file.
    pub orphaned_file_id: Option<String>,
    pub error: String,
}
