use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::{fs, sync::Mutex};
use tracing::debug;
use uuid::Uuid;

use super::array_ops::{apply_array_op, ArrayOp};
use super::document::{with_id, Ack, DeleteAck, Document, DocumentId, ID_FIELD};
use super::error::{StorageError, StorageResult};
use super::query::QueryOperator;
use super::store::DocumentStore;

/// Directory of JSON collection files, one `<collection>.json` array each.
///
/// Holds one async mutex per collection so that read-modify-write cycles on the
/// same file are serialized within the process. Nothing else is cached: every
/// operation reads the file again.
pub struct JsonFileRoot {
    data_dir: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl JsonFileRoot {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), locks: DashMap::new() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn collection(self: &Arc<Self>, name: &str) -> JsonFileCollection {
        JsonFileCollection {
            root: Arc::clone(self),
            name: name.to_string(),
            path: self.data_dir.join(format!("{name}.json")),
        }
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks.entry(name.to_string()).or_default().clone()
    }
}

/// File-backed [`DocumentStore`] for one collection.
#[derive(Clone)]
pub struct JsonFileCollection {
    root: Arc<JsonFileRoot>,
    name: String,
    path: PathBuf,
}

impl JsonFileCollection {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole collection. A missing or blank file is an empty collection.
    async fn load(&self) -> StorageResult<Vec<Document>> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the whole collection, pretty-printed, via a temp file and rename.
    async fn save(&self, docs: &[Document]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(docs)?;
        let tmp = self.path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        let written = match fs::write(&tmp, data).await {
            Ok(()) => fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(collection = %self.name, count = docs.len(), "collection file written");
        Ok(())
    }

    /// Locate `id`, apply `f` to the document and persist. `None` when absent.
    async fn modify<F>(&self, id: &DocumentId, f: F) -> StorageResult<Option<Document>>
    where
        F: FnOnce(Document) -> Document,
    {
        let lock = self.root.lock_for(&self.name);
        let _guard = lock.lock().await;

        let mut docs = self.load().await?;
        let Some(pos) = docs.iter().position(|d| id.identifies(d)) else {
            return Ok(None);
        };
        let current = std::mem::take(&mut docs[pos]);
        docs[pos] = f(current);
        let updated = docs[pos].clone();
        self.save(&docs).await?;
        Ok(Some(updated))
    }
}

/// Integer value of a stored id, counting numeric strings like `"7"`.
fn integer_id(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str()?.parse().ok())
}

/// `max(existing integer ids) + 1`, or 1 for a collection without integer ids.
///
/// Numeric string ids take part because [`DocumentId`] matches `1` and `"1"`
/// as the same document.
pub fn next_id(collection: &str, docs: &[Document]) -> StorageResult<i64> {
    match docs.iter().filter_map(|d| d.get(ID_FIELD).and_then(integer_id)).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StorageError::IdSpaceExhausted(collection.to_string())),
    }
}

#[async_trait]
impl DocumentStore for JsonFileCollection {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn create(&self, data: Document, id: Option<DocumentId>) -> StorageResult<Document> {
        let lock = self.root.lock_for(&self.name);
        let _guard = lock.lock().await;

        let mut docs = self.load().await?;
        let doc = match id {
            // an explicit id replaces the document it names
            Some(id) => {
                let doc = with_id(&id, data);
                match docs.iter().position(|d| id.identifies(d)) {
                    Some(pos) => docs[pos] = doc.clone(),
                    None => docs.push(doc.clone()),
                }
                doc
            }
            None => {
                let doc = with_id(&DocumentId::Int(next_id(&self.name, &docs)?), data);
                docs.push(doc.clone());
                doc
            }
        };
        self.save(&docs).await?;
        Ok(doc)
    }

    async fn get_by_id(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        let docs = self.load().await?;
        Ok(docs.into_iter().find(|d| id.identifies(d)))
    }

    async fn get_all(&self) -> StorageResult<Vec<Document>> {
        self.load().await
    }

    async fn query(&self, field: &str, op: QueryOperator, value: &Value) -> StorageResult<Vec<Document>> {
        let docs = self.load().await?;
        Ok(docs.into_iter().filter(|d| op.evaluate(d.get(field), value)).collect())
    }

    async fn update(&self, id: &DocumentId, data: Document) -> StorageResult<Option<Document>> {
        self.modify(id, |mut doc| {
            for (k, v) in data {
                if k != ID_FIELD {
                    doc.insert(k, v);
                }
            }
            doc
        })
        .await
    }

    async fn delete(&self, id: &DocumentId) -> StorageResult<DeleteAck> {
        let lock = self.root.lock_for(&self.name);
        let _guard = lock.lock().await;

        let mut docs = self.load().await?;
        let before = docs.len();
        docs.retain(|d| !id.identifies(d));
        if docs.len() != before {
            self.save(&docs).await?;
        }
        Ok(DeleteAck::new(id.clone()))
    }

    async fn array_add(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        self.modify(id, |doc| apply_array_op(doc, field, &value, ArrayOp::Union))
            .await?
            .map(|_| Ack::OK)
            .ok_or_else(|| StorageError::not_found(&self.name, id))
    }

    async fn array_remove(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        self.modify(id, |doc| apply_array_op(doc, field, &value, ArrayOp::Remove))
            .await?
            .map(|_| Ack::OK)
            .ok_or_else(|| StorageError::not_found(&self.name, id))
    }
}
