use crate::errors::StoreError;
use crate::ingest::types::IndexAttachment;
use crate::providers::store::IndexService;
use crate::retry::RetryPolicy;
use tracing::info;

/// Attaches an uploaded file to a vector store so it becomes searchable.
///
/// No compensating delete is issued on failure; the caller decides how to
/// report the file left behind.
pub async fn attach_document(
    index: &dyn IndexService,
    file_id: &str,
    store_id: &str,
    retry: &RetryPolicy,
) -> Result<IndexAttachment, StoreError> {
    let result = retry
        .run("attach", || index.attach_file(store_id, file_id))
        .await?;

    info!("Attached file {file_id} to vector store {store_id}");

    Ok(IndexAttachment {
        file_id: file_id.to_string(),
        store_id: store_id.to_string(),
        status: result.status,
    })
}
