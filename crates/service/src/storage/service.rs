use std::sync::Arc;

use serde_json::Value;
use tracing::{error, instrument};

use super::document::{Ack, DeleteAck, Document, DocumentId};
use super::error::StorageResult;
use super::query::QueryOperator;
use super::store::DocumentStore;
use super::Backend;

/// Collection-scoped storage facade used by the business services.
///
/// Delegates to whichever strategy the [`Backend`] was built with and logs
/// every failure with the collection and operation before returning it.
#[derive(Clone)]
pub struct StorageService {
    collection: String,
    store: Arc<dyn DocumentStore>,
}

fn log_failure<T>(collection: &str, op: &'static str, res: StorageResult<T>) -> StorageResult<T> {
    res.inspect_err(|e| error!(collection, op, error = %e, "storage operation failed"))
}

impl StorageService {
    pub fn new(collection: &str, backend: &Backend) -> Self {
        Self { collection: collection.to_string(), store: backend.open(collection) }
    }

    /// Wrap an already opened strategy.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { collection: store.collection().to_string(), store }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[instrument(skip(self, data), fields(collection = %self.collection))]
    pub async fn create(&self, data: Document, id: Option<DocumentId>) -> StorageResult<Document> {
        log_failure(&self.collection, "create", self.store.create(data, id).await)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_by_id(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        log_failure(&self.collection, "get_by_id", self.store.get_by_id(id).await)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_all(&self) -> StorageResult<Vec<Document>> {
        log_failure(&self.collection, "get_all", self.store.get_all().await)
    }

    #[instrument(skip(self, op, value), fields(collection = %self.collection, op = %op))]
    pub async fn query(&self, field: &str, op: QueryOperator, value: &Value) -> StorageResult<Vec<Document>> {
        log_failure(&self.collection, "query", self.store.query(field, op, value).await)
    }

    #[instrument(skip(self, data), fields(collection = %self.collection))]
    pub async fn update(&self, id: &DocumentId, data: Document) -> StorageResult<Option<Document>> {
        log_failure(&self.collection, "update", self.store.update(id, data).await)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(&self, id: &DocumentId) -> StorageResult<DeleteAck> {
        log_failure(&self.collection, "delete", self.store.delete(id).await)
    }

    #[instrument(skip(self, value), fields(collection = %self.collection))]
    pub async fn array_add(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        log_failure(&self.collection, "array_add", self.store.array_add(id, field, value).await)
    }

    #[instrument(skip(self, value), fields(collection = %self.collection))]
    pub async fn array_remove(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        log_failure(&self.collection, "array_remove", self.store.array_remove(id, field, value).await)
    }
}
