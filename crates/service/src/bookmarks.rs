//! Per-user bookmarked place names, kept in the `bookmarks` array of a user document.

use serde_json::Value;
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::{Backend, Document, DocumentId, StorageService};

pub const USERS_COLLECTION: &str = "users";
const BOOKMARKS_FIELD: &str = "bookmarks";

#[derive(Clone)]
pub struct BookmarkService {
    users: StorageService,
}

fn bookmarks_of(user: &Document) -> Vec<Value> {
    user.get(BOOKMARKS_FIELD).and_then(Value::as_array).cloned().unwrap_or_default()
}

impl BookmarkService {
    pub fn new(backend: &Backend) -> Self {
        Self { users: StorageService::new(USERS_COLLECTION, backend) }
    }

    pub fn with_users(users: StorageService) -> Self {
        Self { users }
    }

    async fn user(&self, user_id: &DocumentId) -> Result<Document, ServiceError> {
        self.users.get_by_id(user_id).await?.ok_or_else(|| ServiceError::not_found("User"))
    }

    pub async fn list(&self, user_id: &DocumentId) -> Result<Vec<Value>, ServiceError> {
        Ok(bookmarks_of(&self.user(user_id).await?))
    }

    /// Add `place_name` and return the resulting list.
    pub async fn add(&self, user_id: &DocumentId, place_name: &str) -> Result<Vec<Value>, ServiceError> {
        if place_name.trim().is_empty() {
            return Err(ServiceError::Validation("placeName is required".into()));
        }
        let mut bookmarks = bookmarks_of(&self.user(user_id).await?);
        let entry = Value::from(place_name);
        if bookmarks.contains(&entry) {
            return Err(ServiceError::Validation("Already bookmarked".into()));
        }
        self.users.array_add(user_id, BOOKMARKS_FIELD, entry.clone()).await?;
        bookmarks.push(entry);
        info!(user_id = %user_id, place = place_name, "bookmark added");
        Ok(bookmarks)
    }

    /// Remove `place_name` and return the resulting list. Removing an absent name is not an error.
    pub async fn remove(&self, user_id: &DocumentId, place_name: &str) -> Result<Vec<Value>, ServiceError> {
        let mut bookmarks = bookmarks_of(&self.user(user_id).await?);
        let entry = Value::from(place_name);
        self.users.array_remove(user_id, BOOKMARKS_FIELD, entry.clone()).await?;
        bookmarks.retain(|b| b != &entry);
        info!(user_id = %user_id, place = place_name, "bookmark removed");
        Ok(bookmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    async fn service_with_user() -> anyhow::Result<(BookmarkService, DocumentId, std::path::PathBuf)> {
        let dir = std::env::temp_dir().join(format!("bookmarks-{}", Uuid::new_v4()));
        let backend = Backend::file(&dir);
        let users = StorageService::new(USERS_COLLECTION, &backend);
        let user = json!({"name": "Kavya", "email": "kavya@example.com", "bookmarks": [], "itineraries": []});
        let created = users.create(user.as_object().cloned().unwrap_or_default(), None).await?;
        let id = DocumentId::from_value(&created["id"]).ok_or_else(|| anyhow::anyhow!("no id"))?;
        Ok((BookmarkService::with_users(users), id, dir))
    }

    #[tokio::test]
    async fn add_list_remove() -> anyhow::Result<()> {
        let (svc, id, dir) = service_with_user().await?;
        assert_eq!(svc.add(&id, "Shore Temple").await?, vec![json!("Shore Temple")]);
        assert_eq!(svc.add(&id, "Pancha Rathas").await?.len(), 2);
        assert_eq!(svc.list(&id).await?, vec![json!("Shore Temple"), json!("Pancha Rathas")]);
        assert_eq!(svc.remove(&id, "Shore Temple").await?, vec![json!("Pancha Rathas")]);
        assert_eq!(svc.list(&id).await?, vec![json!("Pancha Rathas")]);
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_is_rejected() -> anyhow::Result<()> {
        let (svc, id, dir) = service_with_user().await?;
        svc.add(&id, "Shore Temple").await?;
        let err = svc.add(&id, "Shore Temple").await;
        assert!(matches!(err, Err(ServiceError::Validation(m)) if m == "Already bookmarked"));
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() -> anyhow::Result<()> {
        let (svc, _id, dir) = service_with_user().await?;
        let missing = DocumentId::Int(999);
        assert!(matches!(svc.list(&missing).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.add(&missing, "X").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.remove(&missing, "X").await, Err(ServiceError::NotFound(_))));
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }
}
