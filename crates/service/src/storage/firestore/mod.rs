//! Firestore REST adapter.
//!
//! Talks to `v1/projects/{project}/databases/(default)/documents`. Array
//! mutations go through `:commit` field transforms so they are applied
//! atomically by the server; nothing here reads before writing.

pub mod auth;
pub mod value;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::FirestoreConfig;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use tracing::debug;

use self::auth::{ServiceAccountAuth, TokenSource};
use self::value::{decode_document, encode_fields, field_path, to_firestore};
use super::array_ops::ArrayOp;
use super::document::{Ack, DeleteAck, Document, DocumentId, ID_FIELD};
use super::error::{StorageError, StorageResult};
use super::query::QueryOperator;
use super::store::DocumentStore;

const PAGE_SIZE: &str = "300";

/// Connection handle shared by every Firestore-backed collection.
pub struct FirestoreClient {
    http: reqwest::Client,
    /// `projects/{p}/databases/(default)/documents`
    documents_path: String,
    /// `{endpoint}/v1/{documents_path}`
    documents_url: Url,
    token: TokenSource,
}

impl FirestoreClient {
    /// Build a client from configuration without touching the network.
    ///
    /// Fails on missing credentials, an unparsable private key or endpoint, or
    /// when the HTTP client cannot be constructed.
    pub fn new(cfg: &FirestoreConfig) -> StorageResult<Self> {
        let missing = cfg.missing_credentials();
        if !missing.is_empty() {
            return Err(StorageError::BackendUnavailable(format!("missing {}", missing.join(", "))));
        }

        let (endpoint, token) = match &cfg.emulator_host {
            Some(host) => (format!("http://{}", host.trim_end_matches('/')), TokenSource::Emulator),
            None => (
                cfg.endpoint.trim_end_matches('/').to_string(),
                TokenSource::ServiceAccount(ServiceAccountAuth::new(&cfg.client_email, &cfg.private_key, &cfg.token_uri)?),
            ),
        };

        let documents_path = format!("projects/{}/databases/(default)/documents", cfg.project_id);
        let documents_url = Url::parse(&format!("{endpoint}/v1/{documents_path}"))
            .map_err(|e| StorageError::BackendUnavailable(format!("invalid firestore endpoint {endpoint}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self { http, documents_path, documents_url, token })
    }

    pub fn collection(self: &Arc<Self>, name: &str) -> FirestoreCollection {
        FirestoreCollection { client: Arc::clone(self), name: name.to_string() }
    }

    fn url_for(&self, segments: &[&str]) -> StorageResult<Url> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::BackendUnavailable("firestore endpoint cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{documents_url}:{method}`, for `runQuery` and `commit`.
    fn rpc_url(&self, method: &str) -> StorageResult<Url> {
        Url::parse(&format!("{}:{method}", self.documents_url))
            .map_err(|e| StorageError::BackendUnavailable(e.to_string()))
    }

    fn document_name(&self, collection: &str, id: &DocumentId) -> String {
        format!("{}/{collection}/{id}", self.documents_path)
    }

    async fn request(&self, method: Method, url: Url) -> StorageResult<RequestBuilder> {
        let token = self.token.bearer(&self.http).await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}

/// Map non-2xx responses onto [`StorageError`]; 404 becomes `NotFound`.
async fn check(resp: Response) -> StorageResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound(message));
    }
    Err(StorageError::Store { status: status.as_u16(), message })
}

/// Firestore-backed [`DocumentStore`] for one collection.
#[derive(Clone)]
pub struct FirestoreCollection {
    client: Arc<FirestoreClient>,
    name: String,
}

impl FirestoreCollection {
    fn doc_url(&self, id: &DocumentId) -> StorageResult<Url> {
        self.client.url_for(&[self.name.as_str(), id.to_string().as_str()])
    }

    async fn transform_array(&self, id: &DocumentId, field: &str, value: Value, op: ArrayOp) -> StorageResult<Ack> {
        let transform = match op {
            ArrayOp::Union => "appendMissingElements",
            ArrayOp::Remove => "removeAllFromArray",
        };
        let mut field_transform = json!({ "fieldPath": field_path(field) });
        field_transform[transform] = json!({ "values": [to_firestore(&value)] });
        let body = json!({
            "writes": [{
                "transform": {
                    "document": self.client.document_name(&self.name, id),
                    "fieldTransforms": [field_transform]
                },
                "currentDocument": { "exists": true }
            }]
        });
        let url = self.client.rpc_url("commit")?;
        let resp = self.client.request(Method::POST, url).await?.json(&body).send().await?;
        check(resp).await.map_err(|e| match e {
            StorageError::NotFound(_) => StorageError::not_found(&self.name, id),
            other => other,
        })?;
        Ok(Ack::OK)
    }
}

#[async_trait]
impl DocumentStore for FirestoreCollection {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn create(&self, data: Document, id: Option<DocumentId>) -> StorageResult<Document> {
        let body = json!({ "fields": encode_fields(&data) });
        let builder = match &id {
            // PATCH without an update mask replaces the whole document ("set")
            Some(id) => self.client.request(Method::PATCH, self.doc_url(id)?).await?,
            None => self.client.request(Method::POST, self.client.url_for(&[self.name.as_str()])?).await?,
        };
        let resp = check(builder.json(&body).send().await?).await?;
        let created = decode_document(&resp.json::<Value>().await?)?;
        debug!(collection = %self.name, id = ?created.get(ID_FIELD), "document written");
        Ok(created)
    }

    async fn get_by_id(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        let resp = self.client.request(Method::GET, self.doc_url(id)?).await?.send().await?;
        match check(resp).await {
            Ok(resp) => Ok(Some(decode_document(&resp.json::<Value>().await?)?)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_all(&self) -> StorageResult<Vec<Document>> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.client.url_for(&[self.name.as_str()])?;
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    q.append_pair("pageToken", token);
                }
            }
            let resp = check(self.client.request(Method::GET, url).await?.send().await?).await?;
            let page: Value = resp.json().await?;
            if let Some(items) = page.get("documents").and_then(Value::as_array) {
                for item in items {
                    docs.push(decode_document(item)?);
                }
            }
            page_token = page.get("nextPageToken").and_then(Value::as_str).map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }
        Ok(docs)
    }

    async fn query(&self, field: &str, op: QueryOperator, value: &Value) -> StorageResult<Vec<Document>> {
        // the id lives in the document name, so filter on `__name__` with a reference
        let (path, operand) = if field == ID_FIELD {
            let id = DocumentId::from_value(value)
                .ok_or_else(|| StorageError::InvalidQuery(format!("id must be a string or integer, got {value}")))?;
            let reference = self.client.document_name(&self.name, &id);
            ("__name__".to_string(), json!({ "referenceValue": reference }))
        } else {
            (field_path(field), to_firestore(value))
        };
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.name }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": path },
                        "op": op.firestore_op(),
                        "value": operand
                    }
                }
            }
        });
        let url = self.client.rpc_url("runQuery")?;
        let resp = check(self.client.request(Method::POST, url).await?.json(&body).send().await?).await?;
        let rows: Vec<Value> = resp.json().await?;
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    async fn update(&self, id: &DocumentId, data: Document) -> StorageResult<Option<Document>> {
        let paths: Vec<String> = data.keys().filter(|k| k.as_str() != ID_FIELD).map(|k| field_path(k)).collect();
        if paths.is_empty() {
            // an empty mask would overwrite the whole document
            return match self.get_by_id(id).await? {
                Some(doc) => Ok(Some(doc)),
                None => Err(StorageError::not_found(&self.name, id)),
            };
        }
        let mut url = self.doc_url(id)?;
        {
            let mut q = url.query_pairs_mut();
            for path in &paths {
                q.append_pair("updateMask.fieldPaths", path);
            }
            q.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": encode_fields(&data) });
        let resp = self.client.request(Method::PATCH, url).await?.json(&body).send().await?;
        let resp = check(resp).await.map_err(|e| match e {
            StorageError::NotFound(_) => StorageError::not_found(&self.name, id),
            other => other,
        })?;
        Ok(Some(decode_document(&resp.json::<Value>().await?)?))
    }

    async fn delete(&self, id: &DocumentId) -> StorageResult<DeleteAck> {
        let resp = self.client.request(Method::DELETE, self.doc_url(id)?).await?.send().await?;
        check(resp).await?;
        Ok(DeleteAck::new(id.clone()))
    }

    async fn array_add(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        self.transform_array(id, field, value, ArrayOp::Union).await
    }

    async fn array_remove(&self, id: &DocumentId, field: &str, value: Value) -> StorageResult<Ack> {
        self.transform_array(id, field, value, ArrayOp::Remove).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator_config() -> FirestoreConfig {
        FirestoreConfig {
            project_id: "demo".into(),
            emulator_host: Some("127.0.0.1:8089".into()),
            ..Default::default()
        }
    }

    #[test]
    fn builds_emulator_urls() -> StorageResult<()> {
        let client = Arc::new(FirestoreClient::new(&emulator_config())?);
        let url = client.url_for(&["users", "a b"])?;
        assert_eq!(url.as_str(), "http://127.0.0.1:8089/v1/projects/demo/databases/(default)/documents/users/a%20b");
        assert_eq!(
            client.rpc_url("runQuery")?.as_str(),
            "http://127.0.0.1:8089/v1/projects/demo/databases/(default)/documents:runQuery"
        );
        assert_eq!(
            client.document_name("users", &DocumentId::Int(4)),
            "projects/demo/databases/(default)/documents/users/4"
        );
        Ok(())
    }

    #[test]
    fn missing_credentials_are_unavailable() {
        let cfg = FirestoreConfig { project_id: "demo".into(), ..Default::default() };
        assert!(matches!(FirestoreClient::new(&cfg), Err(StorageError::BackendUnavailable(_))));
    }
}
