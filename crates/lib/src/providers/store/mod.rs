pub mod openai;

use crate::errors::StoreError;
use crate::types::{AttachResult, ListResult, StoredFile, UploadResult, VectorStore};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use openai::OpenAiStoreProvider;

/// A trait for interacting with a document storage service.
///
/// Uploaded files receive an opaque identifier from the service; ownership of
/// the bytes moves to the service once the call returns.
#[async_trait]
pub trait DocumentStorage: Send + Sync + Debug + DynClone {
    /// Uploads `content` under `file_name`, tagged with `purpose`.
    async fn upload_file(
        &self,
        file_name: &str,
        content: &[u8],
        purpose: &str,
    ) -> Result<UploadResult, StoreError>;

    /// Resolves a file identifier to its stored metadata.
    async fn retrieve_file(&self, file_id: &str) -> Result<StoredFile, StoreError>;
}

dyn_clone::clone_trait_object!(DocumentStorage);

/// A trait for interacting with a vector store (index) service.
#[async_trait]
pub trait IndexService: Send + Sync + Debug + DynClone {
    /// Creates a new, empty vector store with the given display name.
    async fn create_vector_store(&self, name: &str) -> Result<VectorStore, StoreError>;

    /// Makes an uploaded file searchable through the given vector store.
    async fn attach_file(&self, store_id: &str, file_id: &str)
        -> Result<AttachResult, StoreError>;

    /// Lists the identifiers of every file attached to the vector store.
    async fn list_vector_store_files(&self, store_id: &str) -> Result<ListResult, StoreError>;
}

dyn_clone::clone_trait_object!(IndexService);
