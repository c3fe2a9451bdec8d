use crate::{
    config::{ApiKey, AppConfig},
    errors::StoreError,
    providers::store::{DocumentStorage, IndexService},
    types::{AttachResult, ListResult, StoredFile, UploadResult, VectorStore},
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const LIST_PAGE_SIZE: &str = "100";

// --- OpenAI request and response structures ---

#[derive(Serialize, Debug)]
struct CreateVectorStoreRequest<'a> {
    name: &'a str,
}

#[derive(Serialize, Debug)]
struct AttachFileRequest<'a> {
    file_id: &'a str,
}

#[derive(Deserialize, Debug)]
struct FileObject {
    id: String,
    #[serde(default)]
    filename: String,
}

#[derive(Deserialize, Debug)]
struct VectorStoreObject {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VectorStoreFileObject {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VectorStoreFileList {
    data: Vec<VectorStoreFileObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

// --- OpenAI Provider implementation ---

/// A provider for the OpenAI Files and Vector Stores APIs.
///
/// Works against any server exposing the same routes under `api_base_url`.
#[derive(Clone, Debug)]
pub struct OpenAiStoreProvider {
    client: ReqwestClient,
    api_base_url: String,
    api_key: ApiKey,
}

impl OpenAiStoreProvider {
    /// Creates a new `OpenAiStoreProvider` whose calls all expire after `timeout`.
    pub fn new(
        api_base_url: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(StoreError::ClientBuild)?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        Self::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    /// Sends an authenticated request and decodes a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let response = request
            .bearer_auth(self.api_key.expose())
            .send()
            .await
            .map_err(StoreError::from_send)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(e)
            } else {
                StoreError::Deserialization(e)
            }
        })
    }
}

#[async_trait]
impl DocumentStorage for OpenAiStoreProvider {
    async fn upload_file(
        &self,
        file_name: &str,
        content: &[u8],
        purpose: &str,
    ) -> Result<UploadResult, StoreError> {
        debug!(file_name, bytes = content.len(), purpose, "--> Uploading file");
        let form = Form::new().text("purpose", purpose.to_string()).part(
            "file",
            Part::bytes(content.to_vec()).file_name(file_name.to_string()),
        );
        let file: FileObject = self
            .send(self.client.post(self.url("files")).multipart(form))
            .await?;
        Ok(UploadResult { file_id: file.id })
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<StoredFile, StoreError> {
        let file: FileObject = self
            .send(self.client.get(self.url(&format!("files/{file_id}"))))
            .await?;
        Ok(StoredFile {
            id: file.id,
            filename: file.filename,
        })
    }
}

#[async_trait]
impl IndexService for OpenAiStoreProvider {
    async fn create_vector_store(&self, name: &str) -> Result<VectorStore, StoreError> {
        let request_body = CreateVectorStoreRequest { name };
        debug!(payload = ?request_body, "--> Creating vector store");
        let store: VectorStoreObject = self
            .send(self.client.post(self.url("vector_stores")).json(&request_body))
            .await?;
        Ok(VectorStore {
            id: store.id,
            name: store.name,
        })
    }

    async fn attach_file(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> Result<AttachResult, StoreError> {
        let request_body = AttachFileRequest { file_id };
        let attached: VectorStoreFileObject = self
            .send(
                self.client
                    .post(self.url(&format!("vector_stores/{store_id}/files")))
                    .json(&request_body),
            )
            .await?;
        debug!(file_id = %attached.id, status = ?attached.status, "<-- File attached");
        Ok(AttachResult {
            status: attached.status,
        })
    }

    async fn list_vector_store_files(&self, store_id: &str) -> Result<ListResult, StoreError> {
        let url = self.url(&format!("vector_stores/{store_id}/files"));
        let mut file_ids = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("limit", LIST_PAGE_SIZE)]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }
            let page: VectorStoreFileList = self.send(request).await?;
            debug!(count = page.data.len(), has_more = page.has_more, "<-- Listed page");

            let next_cursor = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|f| f.id.clone()));
            file_ids.extend(page.data.into_iter().map(|f| f.id));

            match next_cursor {
                // A cursor that does not advance would loop forever.
                Some(cursor) if page.has_more && after.as_ref() != Some(&cursor) => {
                    after = Some(cursor)
                }
                _ => break,
            }
        }

        Ok(ListResult { file_ids })
    }
}
