//! # Service Result Types
//!
//! Explicit results for each remote call, decoupling the job logic from the
//! wire shape of any particular service's responses.

/// Result of uploading a file to the document storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub file_id: String,
}

/// Result of attaching a stored file to a vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachResult {
    /// Processing status reported by the index service (e.g. `in_progress`).
    pub status: Option<String>,
}

/// File identifiers attached to a vector store, in the order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    pub file_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStore {
    pub id: String,
    pub name: Option<String>,
}

/// Metadata for a file held by the document storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
}
