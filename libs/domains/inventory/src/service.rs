//! Inventory store client - quantity mutations on top of the document store

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::models::{Decrement, InventoryItem, MAX_NAME_LENGTH, StoreOptions, UpdateStrategy};
use crate::repository::InventoryRepository;

/// Increment/decrement semantics over an [`InventoryRepository`]
///
/// Quantities never reach 0 in the store: a decrement from 1 deletes the
/// document. With [`UpdateStrategy::CompareAndSet`] every mutation is a
/// read followed by a revision-checked write, retried up to
/// `max_attempts` times before giving up with
/// [`InventoryError::Contention`].
pub struct InventoryService<R: InventoryRepository> {
    repository: Arc<R>,
    options: StoreOptions,
}

impl<R: InventoryRepository> InventoryService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_options(repository, StoreOptions::default())
    }

    pub fn with_options(repository: R, options: StoreOptions) -> Self {
        Self {
            repository: Arc::new(repository),
            options,
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Every item in the store, in store order
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> InventoryResult<Vec<InventoryItem>> {
        let documents = self.repository.list().await?;
        Ok(documents.into_iter().map(InventoryItem::from).collect())
    }

    /// Add one unit of `name`, creating it at 1. Returns the new quantity.
    #[instrument(skip(self), fields(strategy = %self.options.strategy))]
    pub async fn increment(&self, name: &str) -> InventoryResult<i64> {
        validate_name(name)?;

        let quantity = match self.options.strategy {
            UpdateStrategy::LastWriteWins => {
                let quantity = self.current_quantity(name).await?.map_or(1, |q| q + 1);
                self.repository.set(name, quantity).await?;
                quantity
            }
            UpdateStrategy::CompareAndSet => self.increment_checked(name).await?,
        };

        debug!(quantity, "Incremented");
        Ok(quantity)
    }

    /// Remove one unit of `name`; the item is deleted when its last unit goes.
    #[instrument(skip(self), fields(strategy = %self.options.strategy))]
    pub async fn decrement(&self, name: &str) -> InventoryResult<Decrement> {
        validate_name(name)?;

        let outcome = match self.options.strategy {
            UpdateStrategy::LastWriteWins => match self.current_quantity(name).await? {
                None => Decrement::Absent,
                Some(quantity) if quantity <= 1 => {
                    self.repository.delete(name).await?;
                    Decrement::Removed
                }
                Some(quantity) => {
                    self.repository.set(name, quantity - 1).await?;
                    Decrement::Remaining(quantity - 1)
                }
            },
            UpdateStrategy::CompareAndSet => self.decrement_checked(name).await?,
        };

        debug!(?outcome, "Decremented");
        Ok(outcome)
    }

    async fn current_quantity(&self, name: &str) -> InventoryResult<Option<i64>> {
        Ok(self.repository.get(name).await?.map(|doc| doc.quantity))
    }

    async fn increment_checked(&self, name: &str) -> InventoryResult<i64> {
        let max_attempts = self.options.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let (quantity, expected) = match self.repository.get(name).await? {
                None => (1, None),
                Some(doc) => (doc.quantity + 1, Some(doc.revision)),
            };

            if self.repository.set_if(name, quantity, expected).await? {
                return Ok(quantity);
            }

            debug!(attempt, "Lost write race, re-reading");
            tokio::task::yield_now().await;
        }

        warn!(attempts = max_attempts, "Giving up on contended increment");
        Err(InventoryError::Contention {
            name: name.to_string(),
            attempts: max_attempts,
        })
    }

    async fn decrement_checked(&self, name: &str) -> InventoryResult<Decrement> {
        let max_attempts = self.options.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let Some(doc) = self.repository.get(name).await? else {
                return Ok(Decrement::Absent);
            };

            if doc.quantity <= 1 {
                if self.repository.delete_if(name, doc.revision).await? {
                    return Ok(Decrement::Removed);
                }
            } else if self
                .repository
                .set_if(name, doc.quantity - 1, Some(doc.revision))
                .await?
            {
                return Ok(Decrement::Remaining(doc.quantity - 1));
            }

            debug!(attempt, "Lost write race, re-reading");
            tokio::task::yield_now().await;
        }

        warn!(attempts = max_attempts, "Giving up on contended decrement");
        Err(InventoryError::Contention {
            name: name.to_string(),
            attempts: max_attempts,
        })
    }
}

impl<R: InventoryRepository> Clone for InventoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            options: self.options,
        }
    }
}

fn validate_name(name: &str) -> InventoryResult<()> {
    if name.trim().is_empty() {
        return Err(InventoryError::Validation(
            "Item name must not be blank".to_string(),
        ));
    }
    if name.chars().count() as u64 > MAX_NAME_LENGTH {
        return Err(InventoryError::Validation(format!(
            "Item name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
