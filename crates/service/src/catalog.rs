//! Read-only catalog collections and the static language file.

use std::{io::ErrorKind, path::PathBuf};

use serde_json::{json, Value};

use crate::errors::ServiceError;
use crate::storage::{Backend, Document, QueryOperator, StorageError, StorageService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Heritage,
    Crafts,
    Marketplace,
}

impl CatalogKind {
    pub fn collection(self) -> &'static str {
        match self {
            Self::Heritage => "heritage",
            Self::Crafts => "crafts",
            Self::Marketplace => "marketplace",
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    heritage: StorageService,
    crafts: StorageService,
    marketplace: StorageService,
    lang_path: PathBuf,
}

impl CatalogService {
    pub fn new(backend: &Backend, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            heritage: StorageService::new(CatalogKind::Heritage.collection(), backend),
            crafts: StorageService::new(CatalogKind::Crafts.collection(), backend),
            marketplace: StorageService::new(CatalogKind::Marketplace.collection(), backend),
            lang_path: data_dir.into().join("lang.json"),
        }
    }

    fn store(&self, kind: CatalogKind) -> &StorageService {
        match kind {
            CatalogKind::Heritage => &self.heritage,
            CatalogKind::Crafts => &self.crafts,
            CatalogKind::Marketplace => &self.marketplace,
        }
    }

    /// Every document of `kind`, or only those whose `category` equals `category`.
    pub async fn list(&self, kind: CatalogKind, category: Option<&str>) -> Result<Vec<Document>, ServiceError> {
        let store = self.store(kind);
        let docs = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => store.query("category", QueryOperator::Eq, &json!(c)).await?,
            None => store.get_all().await?,
        };
        Ok(docs)
    }

    /// Translations from `<data_dir>/lang.json`; an empty object when the file is absent.
    pub async fn lang(&self) -> Result<Value, ServiceError> {
        match tokio::fs::read(&self.lang_path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).map_err(StorageError::from)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(json!({})),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }
}
