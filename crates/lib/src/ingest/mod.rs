//! # Ingestion Pipeline
//!
//! Feed entries flow through four steps: a [`FeedSource`] yields entries, the
//! extractor picks a text body, the uploader stores it as a `.txt` file, and the
//! attacher adds the stored file to a vector store. [`JobRunner`] drives them.

pub mod attach;
pub mod extract;
pub mod job;
pub mod traits;
pub mod types;
pub mod upload;

pub use attach::attach_document;
pub use extract::extract_content;
pub use job::{JobReport, JobRunner, JobState};
pub use traits::FeedSource;
pub use types::{
    ContentBlock, DocumentPayload, EntryFailure, FeedEntry, IndexAttachment, IndexedDocument,
    UploadedDocument,
};
pub use upload::{document_file_name, upload_document, MAX_FILE_STEM_CHARS, UPLOAD_PURPOSE};
