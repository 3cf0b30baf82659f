use async_trait::async_trait;
use serde_json::Value;

use super::document::{Ack, DeleteAck, Document, DocumentId};
use super::error::StorageResult;
use super::query::QueryOperator;

/// Document CRUD contract for one collection.
///
/// Implemented by the Firestore adapter and by the JSON file adapter; callers
/// hold an `Arc<dyn DocumentStore>` and never learn which one they got.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Logical collection name.
    fn collection(&self) -> &str;

    /// Store `data`, under `id` when given. Returns the stored document with its id.
    async fn create(&self, data: Document, id: Option<DocumentId>) -> StorageResult<Document>;

    async fn get_by_id(&self, id: &DocumentId) -> StorageResult<Option<Document>>;

    async fn get_all(&self) -> StorageResult<Vec<Document>>;

    async fn query(&self, field: &str, op: QueryOperator, value: &Value) -> StorageResult<Vec<Document>>;

    /// Shallow-merge `data` into the document.
    ///
    /// The file backend returns `Ok(None)` for an unknown id; the document store
    /// fails with `StorageError::NotFound`.
    async fn update(&self, id: &DocumentId, data: Document) -> StorageResult<Option<Document>>;

    /// Idempotent: deleting an unknown id still acknowledges.
    async fn delete(&self, id: &DocumentId) -> StorageResult<DeleteAck>;

    /// Add `value` to the array `field` unless already present.
    async fn array_add(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack>;

    /// Remove every element equal to `value` from the array `field`.
    async fn array_remove(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack>;
}
