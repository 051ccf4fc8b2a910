//! MongoDB implementation of InventoryRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
};
use tracing::instrument;

use crate::error::InventoryResult;
use crate::models::{INVENTORY_COLLECTION, InventoryDocument};
use crate::repository::InventoryRepository;

const DUPLICATE_KEY: i32 = 11000;

/// Inventory documents stored as `{ _id: <name>, quantity, revision }`
pub struct MongoInventoryRepository {
    collection: Collection<InventoryDocument>,
}

impl MongoInventoryRepository {
    /// Use the `inventory` collection of `db`
    ///
    /// ```ignore
    /// let client = database::mongodb::connect(&config).await?;
    /// let repo = MongoInventoryRepository::new(client.database(config.database()));
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, INVENTORY_COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<InventoryDocument>(collection_name);
        Self { collection }
    }

    /// Match `name` at `revision`. Documents that predate revision tracking
    /// have no `revision` field and count as revision 0.
    fn revision_filter(name: &str, revision: i64) -> Document {
        if revision == 0 {
            doc! {
                "_id": name,
                "$or": [
                    { "revision": 0_i64 },
                    { "revision": { "$exists": false } },
                ],
            }
        } else {
            doc! { "_id": name, "revision": revision }
        }
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        matches!(
            &*err.kind,
            ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
        )
    }
}

#[async_trait]
impl InventoryRepository for MongoInventoryRepository {
    #[instrument(skip(self))]
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>> {
        let document = self.collection.find_one(doc! { "_id": name }).await?;
        Ok(document)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>> {
        use futures::TryStreamExt;

        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<InventoryDocument> = cursor.try_collect().await?;
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()> {
        self.collection
            .update_one(
                doc! { "_id": name },
                doc! {
                    "$set": { "quantity": quantity },
                    "$inc": { "revision": 1_i64 },
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> InventoryResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": name }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool> {
        let Some(expected) = expected_revision else {
            // _id is unique, so a concurrent creator makes this fail
            return match self
                .collection
                .insert_one(InventoryDocument::new(name, quantity))
                .await
            {
                Ok(_) => Ok(true),
                Err(err) if Self::is_duplicate_key(&err) => Ok(false),
                Err(err) => Err(err.into()),
            };
        };

        let result = self
            .collection
            .update_one(
                Self::revision_filter(name, expected),
                doc! { "$set": { "quantity": quantity, "revision": expected + 1 } },
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    #[instrument(skip(self))]
    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool> {
        let result = self
            .collection
            .delete_one(Self::revision_filter(name, expected_revision))
            .await?;
        Ok(result.deleted_count == 1)
    }
}
