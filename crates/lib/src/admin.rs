//! # Store Administration
//!
//! One-shot maintenance operations run outside the recurring job: creating a
//! vector store and listing the files attached to one. Results are written as
//! plain lines to the supplied writer (stdout in the CLI).

use crate::errors::StoreError;
use crate::providers::store::{DocumentStorage, IndexService};
use crate::types::{StoredFile, VectorStore};
use std::io::Write;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Creates a vector store and prints `Vector store ID: <id>`.
pub async fn create_index<W: Write>(
    index: &dyn IndexService,
    name: &str,
    out: &mut W,
) -> Result<VectorStore, AdminError> {
    info!("Creating vector store '{name}'");
    let store = index.create_vector_store(name).await?;
    writeln!(out, "Vector store ID: {}", store.id)?;
    Ok(store)
}

/// Prints the stored filename of every file attached to `store_id`, one per line,
/// in the order the index service lists them.
pub async fn list_documents<W: Write>(
    storage: &dyn DocumentStorage,
    index: &dyn IndexService,
    store_id: &str,
    out: &mut W,
) -> Result<Vec<StoredFile>, AdminError> {
    let listing = index.list_vector_store_files(store_id).await?;
    info!(
        "Vector store {store_id} has {} attached files",
        listing.file_ids.len()
    );

    let mut files = Vec::with_capacity(listing.file_ids.len());
    for file_id in &listing.file_ids {
        let file = storage.retrieve_file(file_id).await?;
        writeln!(out, "{}", file.filename)?;
        files.push(file);
    }
    Ok(files)
}
