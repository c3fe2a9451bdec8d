//! Wraps entry text as a named `.txt` file and submits it to document storage.

use crate::errors::StoreError;
use crate::ingest::types::{DocumentPayload, UploadedDocument, DEFAULT_TITLE};
use crate::providers::store::DocumentStorage;
use crate::retry::RetryPolicy;
use tracing::info;

/// Purpose tag attached to every uploaded file.
pub const UPLOAD_PURPOSE: &str = "assistants";

/// Maximum number of characters kept from a title, before the `.txt` suffix.
pub const MAX_FILE_STEM_CHARS: usize = 50;

/// Derives the upload file name from an entry title.
///
/// The title is cut to its first [`MAX_FILE_STEM_CHARS`] characters (not bytes),
/// every whitespace character becomes `_`, and `.txt` is appended.
pub fn document_file_name(title: &str) -> String {
    let title = if title.trim().is_empty() {
        DEFAULT_TITLE
    } else {
        title
    };
    let stem: String = title
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}.txt")
}

impl DocumentPayload {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            file_name: document_file_name(title),
            content: text.as_bytes().to_vec(),
        }
    }
}

/// Uploads the payload and returns the identifier assigned by the service.
///
/// Transient failures are retried according to `retry`; anything else is
/// returned to the caller unchanged.
pub async fn upload_document(
    storage: &dyn DocumentStorage,
    payload: &DocumentPayload,
    retry: &RetryPolicy,
) -> Result<UploadedDocument, StoreError> {
    let result = retry
        .run("upload", || {
            storage.upload_file(&payload.file_name, &payload.content, UPLOAD_PURPOSE)
        })
        .await?;

    info!(
        "Uploaded file: {} (ID: {})",
        payload.file_name, result.file_id
    );

    Ok(UploadedDocument {
        file_name: payload.file_name.clone(),
        file_id: result.file_id,
    })
}
