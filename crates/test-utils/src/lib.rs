//! Shared test doubles for the feedvault crates.

use async_trait::async_trait;
use feedvault::errors::{FeedFetchError, StoreError};
use feedvault::ingest::{FeedEntry, FeedSource};
use feedvault::providers::store::{DocumentStorage, IndexService};
use feedvault::types::{AttachResult, ListResult, StoredFile, UploadResult, VectorStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// --- Mock Store ---

/// A single call received by [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Upload {
        file_name: String,
        content: String,
        purpose: String,
    },
    RetrieveFile {
        file_id: String,
    },
    CreateVectorStore {
        name: String,
    },
    Attach {
        store_id: String,
        file_id: String,
    },
    ListFiles {
        store_id: String,
    },
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    status: u16,
    /// `None` fails forever.
    remaining: Option<usize>,
}

impl Failure {
    fn trip(&mut self) -> Option<StoreError> {
        match &mut self.remaining {
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.error())
            }
            None => Some(self.error()),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Api {
            status: self.status,
            body: "mock failure".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<StoreCall>,
    next_file: usize,
    next_store: usize,
    /// file id -> filename
    files: HashMap<String, String>,
    /// store id -> attached file ids, in attach order
    attached: HashMap<String, Vec<String>>,
    /// keyed by file name
    upload_failures: HashMap<String, Failure>,
    /// keyed by file name of the file being attached
    attach_failures: HashMap<String, Failure>,
}

/// An in-memory document storage and index service that records every call.
///
/// Clones share state, so a clone handed to the code under test can be
/// inspected afterwards through the original.
#[derive(Clone, Debug, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every upload of `file_name` fail with `status`.
    pub fn fail_upload(&self, file_name: &str, status: u16) {
        self.state.lock().unwrap().upload_failures.insert(
            file_name.to_string(),
            Failure {
                status,
                remaining: None,
            },
        );
    }

    /// Makes the first `times` uploads of `file_name` fail with `status`.
    pub fn fail_upload_times(&self, file_name: &str, status: u16, times: usize) {
        self.state.lock().unwrap().upload_failures.insert(
            file_name.to_string(),
            Failure {
                status,
                remaining: Some(times),
            },
        );
    }

    /// Makes every attach of the file uploaded as `file_name` fail with `status`.
    pub fn fail_attach(&self, file_name: &str, status: u16) {
        self.state.lock().unwrap().attach_failures.insert(
            file_name.to_string(),
            Failure {
                status,
                remaining: None,
            },
        );
    }

    /// Makes the next created vector store get the id `vs_{next}`.
    pub fn start_store_ids_at(&self, next: usize) {
        self.state.lock().unwrap().next_store = next.saturating_sub(1);
    }

    /// Pre-populates `store_id` with stored files, in listing order.
    pub fn seed_store(&self, store_id: &str, filenames: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.attached.entry(store_id.to_string()).or_default();
        for filename in filenames {
            state.next_file += 1;
            let file_id = format!("file-seed-{}", state.next_file);
            state.files.insert(file_id.clone(), filename.to_string());
            state
                .attached
                .entry(store_id.to_string())
                .or_default()
                .push(file_id);
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// `(file_name, content)` of every upload call, successful or not.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Upload {
                    file_name, content, ..
                } => Some((file_name, content)),
                _ => None,
            })
            .collect()
    }

    /// Filenames of the files attached to `store_id`, in attach order.
    pub fn attached_filenames(&self, store_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .attached
            .get(store_id)
            .map(|ids| ids.iter().map(|id| state.files[id].clone()).collect())
            .unwrap_or_default()
    }

    /// Number of files held by storage, attached or not.
    pub fn stored_file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    fn not_found(what: &str) -> StoreError {
        StoreError::Api {
            status: 404,
            body: format!("No such {what}"),
        }
    }
}

#[async_trait]
impl DocumentStorage for MockStore {
    async fn upload_file(
        &self,
        file_name: &str,
        content: &[u8],
        purpose: &str,
    ) -> Result<UploadResult, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Upload {
            file_name: file_name.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
            purpose: purpose.to_string(),
        });

        if let Some(err) = state
            .upload_failures
            .get_mut(file_name)
            .and_then(Failure::trip)
        {
            return Err(err);
        }

        state.next_file += 1;
        let file_id = format!("file-{}", state.next_file);
        state.files.insert(file_id.clone(), file_name.to_string());
        Ok(UploadResult { file_id })
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<StoredFile, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::RetrieveFile {
            file_id: file_id.to_string(),
        });
        state
            .files
            .get(file_id)
            .map(|filename| StoredFile {
                id: file_id.to_string(),
                filename: filename.clone(),
            })
            .ok_or_else(|| Self::not_found("file"))
    }
}

#[async_trait]
impl IndexService for MockStore {
    async fn create_vector_store(&self, name: &str) -> Result<VectorStore, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::CreateVectorStore {
            name: name.to_string(),
        });
        state.next_store += 1;
        let id = format!("vs_{}", state.next_store);
        state.attached.insert(id.clone(), Vec::new());
        Ok(VectorStore {
            id,
            name: Some(name.to_string()),
        })
    }

    async fn attach_file(
        &self,
        store_id: &str,
        file_id: &str,
    ) -> Result<AttachResult, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Attach {
            store_id: store_id.to_string(),
            file_id: file_id.to_string(),
        });

        let file_name = state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| Self::not_found("file"))?;
        if let Some(err) = state
            .attach_failures
            .get_mut(&file_name)
            .and_then(Failure::trip)
        {
            return Err(err);
        }

        state
            .attached
            .entry(store_id.to_string())
            .or_default()
            .push(file_id.to_string());
        Ok(AttachResult {
            status: Some("completed".to_string()),
        })
    }

    async fn list_vector_store_files(&self, store_id: &str) -> Result<ListResult, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::ListFiles {
            store_id: store_id.to_string(),
        });
        state
            .attached
            .get(store_id)
            .map(|ids| ListResult {
                file_ids: ids.clone(),
            })
            .ok_or_else(|| Self::not_found("vector store"))
    }
}

// --- Static Feed ---

/// A feed source that serves a fixed list of entries, or fails.
#[derive(Clone, Debug, Default)]
pub struct StaticFeed {
    entries: Vec<FeedEntry>,
    fail_with: Option<String>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StaticFeed {
    pub fn new(entries: Vec<FeedEntry>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    /// A feed whose every fetch fails with a fetch error carrying `message`.
    pub fn unreachable(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// URLs passed to `fetch`, in call order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        self.requested.lock().unwrap().push(feed_url.to_string());
        match &self.fail_with {
            Some(message) => Err(FeedFetchError::Fetch(message.clone())),
            None => Ok(self.entries.clone()),
        }
    }
}

/// Shorthand for an entry with a title, link and summary.
pub fn entry(title: &str, link: &str, summary: &str) -> FeedEntry {
    FeedEntry::new(Some(title), Some(link)).with_summary(summary)
}
