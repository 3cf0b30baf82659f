//! Storage abstractions for service layer
//!
//! One document contract ([`DocumentStore`]) with two strategies: the Firestore
//! REST adapter and a JSON-array-per-collection file adapter. The strategy is
//! picked once by [`crate::bootstrap`] and injected through [`Backend`].

pub mod array_ops;
pub mod document;
pub mod error;
pub mod file;
pub mod firestore;
pub mod query;
pub mod service;
pub mod store;

use std::{path::PathBuf, sync::Arc};

pub use document::{Ack, DeleteAck, Document, DocumentId};
pub use error::{StorageError, StorageResult};
pub use query::QueryOperator;
pub use service::StorageService;
pub use store::DocumentStore;

use file::JsonFileRoot;
use firestore::FirestoreClient;

/// Backend chosen at startup, shared by every [`StorageService`].
#[derive(Clone)]
pub enum Backend {
    DocumentStore(Arc<FirestoreClient>),
    File(Arc<JsonFileRoot>),
}

impl Backend {
    /// File backend rooted at `data_dir`.
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self::File(Arc::new(JsonFileRoot::new(data_dir)))
    }

    /// Open the strategy for `collection`.
    pub fn open(&self, collection: &str) -> Arc<dyn DocumentStore> {
        match self {
            Self::DocumentStore(client) => Arc::new(client.collection(collection)),
            Self::File(root) => Arc::new(root.collection(collection)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentStore(_) => "firestore",
            Self::File(_) => "json-file",
        }
    }

    pub fn is_document_store(&self) -> bool {
        matches!(self, Self::DocumentStore(_))
    }
}
