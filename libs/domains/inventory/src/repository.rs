use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::InventoryResult;
use crate::models::InventoryDocument;

/// Keyed document store holding the `inventory` collection
///
/// `get`/`list`/`set`/`delete` are the plain keyed operations. `set_if` and
/// `delete_if` only apply when the stored revision still matches what the
/// caller read, and report `false` when another writer got there first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Read one document by item name
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>>;

    /// Every document in the collection, in store order
    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>>;

    /// Unconditional upsert of `quantity`, bumping the revision
    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()>;

    /// Delete by name; `false` if there was nothing to delete
    async fn delete(&self, name: &str) -> InventoryResult<bool>;

    /// Write `quantity` if the document is still at `expected_revision`.
    ///
    /// `None` means "create": succeeds only if no document exists yet.
    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool>;

    /// Delete the document if it is still at `expected_revision`
    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool>;
}

/// Process-local store for development and tests
#[derive(Clone, Default)]
pub struct InMemoryInventoryRepository {
    documents: Arc<RwLock<HashMap<String, InventoryDocument>>>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with documents written by an older deployment
    pub async fn insert(&self, document: InventoryDocument) {
        let mut documents = self.documents.write().await;
        documents.insert(document.name.clone(), document);
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>> {
        let documents = self.documents.read().await;
        Ok(documents.get(name).cloned())
    }

    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>> {
        let documents = self.documents.read().await;
        Ok(documents.values().cloned().collect())
    }

    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()> {
        let mut documents = self.documents.write().await;
        documents
            .entry(name.to_string())
            .and_modify(|doc| {
                doc.quantity = quantity;
                doc.revision += 1;
            })
            .or_insert_with(|| InventoryDocument::new(name, quantity));
        Ok(())
    }

    async fn delete(&self, name: &str) -> InventoryResult<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(name).is_some())
    }

    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool> {
        let mut documents = self.documents.write().await;

        match expected_revision {
            None => {
                if documents.contains_key(name) {
                    return Ok(false);
                }
                documents.insert(name.to_string(), InventoryDocument::new(name, quantity));
                Ok(true)
            }
            Some(expected) => match documents.get_mut(name) {
                Some(doc) if doc.revision == expected => {
                    doc.quantity = quantity;
                    doc.revision = expected + 1;
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }

    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool> {
        let mut documents = self.documents.write().await;

        let current = documents.get(name).map(|doc| doc.revision);
        if current != Some(expected_revision) {
            return Ok(false);
        }
        documents.remove(name);
        Ok(true)
    }
}
