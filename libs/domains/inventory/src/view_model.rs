//! Materialised inventory list plus the search query applied to it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, instrument};

use crate::error::InventoryResult;
use crate::models::{Decrement, InventoryItem, InventoryView, filter_items};
use crate::repository::InventoryRepository;
use crate::service::InventoryService;

#[derive(Default)]
struct ViewState {
    /// Full store snapshot, sorted by name
    items: Vec<InventoryItem>,
    query: String,
    /// Generation of the refresh that produced `items`
    generation: u64,
}

/// Owns the in-memory inventory list
///
/// The list is only ever replaced wholesale by [`refresh`](Self::refresh);
/// `add` and `remove` go through the store and then refresh. Refreshes are
/// numbered when issued, and a result older than the one already applied is
/// discarded, so overlapping refreshes cannot roll the list back.
pub struct InventoryViewModel<R: InventoryRepository> {
    service: InventoryService<R>,
    state: RwLock<ViewState>,
    issued: AtomicU64,
}

impl<R: InventoryRepository> InventoryViewModel<R> {
    /// Empty until the first refresh
    pub fn new(service: InventoryService<R>) -> Self {
        Self {
            service,
            state: RwLock::new(ViewState::default()),
            issued: AtomicU64::new(0),
        }
    }

    pub fn service(&self) -> &InventoryService<R> {
        &self.service
    }

    /// Re-read the whole store and replace the list
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> InventoryResult<InventoryView> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut items = self.service.fetch_all().await?;
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if generation > state.generation {
            debug!(generation, count = items.len(), "Inventory snapshot replaced");
            state.items = items;
            state.generation = generation;
        } else {
            debug!(
                generation,
                applied = state.generation,
                "Discarding stale inventory snapshot"
            );
        }

        Ok(render(&state))
    }

    /// Add one unit of `name`, then refresh
    #[instrument(skip(self))]
    pub async fn add(&self, name: &str) -> InventoryResult<InventoryView> {
        let quantity = self.service.increment(name).await?;
        info!(quantity, "Item added");
        self.refresh().await
    }

    /// Remove one unit of `name`, then refresh
    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> InventoryResult<InventoryView> {
        match self.service.decrement(name).await? {
            Decrement::Absent => debug!("Nothing to remove"),
            Decrement::Removed => info!("Last unit removed, item deleted"),
            Decrement::Remaining(quantity) => info!(quantity, "Item removed"),
        }
        self.refresh().await
    }

    /// Change the search query; no I/O
    pub fn set_query(&self, query: impl Into<String>) -> InventoryView {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.query = query.into();
        render(&state)
    }

    /// Current filtered view
    pub fn view(&self) -> InventoryView {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        render(&state)
    }

    /// Current unfiltered list
    pub fn snapshot(&self) -> Vec<InventoryItem> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.items.clone()
    }
}

fn render(state: &ViewState) -> InventoryView {
    let items = filter_items(&state.items, &state.query);
    InventoryView {
        query: state.query.clone(),
        empty: items.is_empty(),
        total: state.items.len(),
        items,
    }
}
