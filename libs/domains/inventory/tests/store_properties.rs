//! Store client and view model behaviour against the in-memory store,
//! including interleaved writers on the same item.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain_inventory::models::InventoryDocument;
use domain_inventory::*;
use tokio::sync::Notify;

fn service() -> (InMemoryInventoryRepository, InventoryService<InMemoryInventoryRepository>) {
    let repo = InMemoryInventoryRepository::new();
    (repo.clone(), InventoryService::new(repo))
}

async fn quantity_of<R: InventoryRepository>(service: &InventoryService<R>, name: &str) -> Option<i64> {
    service
        .fetch_all()
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.name == name)
        .map(|item| item.quantity)
}

#[tokio::test]
async fn test_increment_new_name_yields_single_item_at_one() {
    let (_, service) = service();

    service.increment("bottle").await.unwrap();

    let items = service.fetch_all().await.unwrap();
    assert_eq!(
        items,
        vec![InventoryItem {
            name: "bottle".to_string(),
            quantity: 1
        }]
    );
}

#[tokio::test]
async fn test_decrement_above_one_keeps_item_listed() {
    let (repo, service) = service();
    repo.insert(InventoryDocument::new("cup", 4)).await;

    assert_eq!(service.decrement("cup").await.unwrap(), Decrement::Remaining(3));
    assert_eq!(quantity_of(&service, "cup").await, Some(3));
}

#[tokio::test]
async fn test_decrement_from_one_removes_item() {
    let (repo, service) = service();
    repo.insert(InventoryDocument::new("cup", 1)).await;

    assert_eq!(service.decrement("cup").await.unwrap(), Decrement::Removed);
    assert_eq!(quantity_of(&service, "cup").await, None);
    assert!(repo.get("cup").await.unwrap().is_none());
}

#[tokio::test]
async fn test_decrement_absent_leaves_store_unchanged() {
    let (repo, service) = service();
    repo.insert(InventoryDocument::new("cup", 2)).await;
    let before = service.fetch_all().await.unwrap();

    assert_eq!(service.decrement("laptop").await.unwrap(), Decrement::Absent);
    assert_eq!(service.fetch_all().await.unwrap(), before);
}

#[tokio::test]
async fn test_fetch_all_is_repeatable() {
    let (repo, service) = service();
    repo.insert(InventoryDocument::new("cup", 2)).await;
    repo.insert(InventoryDocument::new("plate", 5)).await;

    let mut first = service.fetch_all().await.unwrap();
    let mut second = service.fetch_all().await.unwrap();
    first.sort_by(|a, b| a.name.cmp(&b.name));
    second.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_quantity_never_stored_as_zero() {
    let (repo, service) = service();

    service.increment("mug").await.unwrap();
    service.increment("mug").await.unwrap();
    service.decrement("mug").await.unwrap();
    service.decrement("mug").await.unwrap();
    service.decrement("mug").await.unwrap();

    assert!(repo.get("mug").await.unwrap().is_none());
}

#[tokio::test]
async fn test_documents_without_revision_are_still_mutable() {
    let (repo, service) = service();
    repo.insert(InventoryDocument {
        name: "bowl".to_string(),
        quantity: 2,
        revision: 0,
    })
    .await;

    assert_eq!(service.increment("bowl").await.unwrap(), 3);
    assert_eq!(service.decrement("bowl").await.unwrap(), Decrement::Remaining(2));
}

/// Yields to the scheduler right after every read, which opens the
/// read-then-write window deterministically on a single-threaded runtime.
struct YieldingRepository(InMemoryInventoryRepository);

#[async_trait]
impl InventoryRepository for YieldingRepository {
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>> {
        let doc = self.0.get(name).await;
        tokio::task::yield_now().await;
        doc
    }

    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>> {
        self.0.list().await
    }

    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()> {
        self.0.set(name, quantity).await
    }

    async fn delete(&self, name: &str) -> InventoryResult<bool> {
        self.0.delete(name).await
    }

    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool> {
        self.0.set_if(name, quantity, expected_revision).await
    }

    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool> {
        self.0.delete_if(name, expected_revision).await
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_last_write_wins_loses_concurrent_increment() {
    let repo = InMemoryInventoryRepository::new();
    let service = InventoryService::with_options(
        YieldingRepository(repo.clone()),
        StoreOptions {
            strategy: UpdateStrategy::LastWriteWins,
            ..Default::default()
        },
    );

    let (a, b) = tokio::join!(service.increment("x"), service.increment("x"));
    a.unwrap();
    b.unwrap();

    // Both callers read "absent" and both wrote 1
    let doc = repo.get("x").await.unwrap().unwrap();
    assert_eq!(doc.quantity, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_compare_and_set_keeps_both_concurrent_increments() {
    let repo = InMemoryInventoryRepository::new();
    let service = InventoryService::new(YieldingRepository(repo.clone()));

    let (a, b) = tokio::join!(service.increment("x"), service.increment("x"));
    let mut results = vec![a.unwrap(), b.unwrap()];
    results.sort();

    assert_eq!(results, vec![1, 2]);
    assert_eq!(repo.get("x").await.unwrap().unwrap().quantity, 2);
}

#[tokio::test(flavor = "current_thread")]
async fn test_compare_and_set_concurrent_decrements_remove_exactly_once() {
    let repo = InMemoryInventoryRepository::new();
    repo.insert(InventoryDocument::new("x", 2)).await;
    let service = InventoryService::new(YieldingRepository(repo.clone()));

    let (a, b) = tokio::join!(service.decrement("x"), service.decrement("x"));
    let outcomes = [a.unwrap(), b.unwrap()];

    assert!(outcomes.contains(&Decrement::Remaining(1)));
    assert!(outcomes.contains(&Decrement::Removed));
    assert!(repo.get("x").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_compare_and_set_under_parallel_load() {
    let repo = InMemoryInventoryRepository::new();
    let service = InventoryService::with_options(
        repo.clone(),
        StoreOptions {
            max_attempts: 1000,
            ..Default::default()
        },
    );

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.increment("x").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(repo.get("x").await.unwrap().unwrap().quantity, 50);
}

/// Holds the first `list` call (after it has read the store) until released
struct GatedListRepository {
    inner: InMemoryInventoryRepository,
    gated: AtomicBool,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl InventoryRepository for GatedListRepository {
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>> {
        self.inner.get(name).await
    }

    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>> {
        let documents = self.inner.list().await;
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        documents
    }

    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()> {
        self.inner.set(name, quantity).await
    }

    async fn delete(&self, name: &str) -> InventoryResult<bool> {
        self.inner.delete(name).await
    }

    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool> {
        self.inner.set_if(name, quantity, expected_revision).await
    }

    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool> {
        self.inner.delete_if(name, expected_revision).await
    }
}

#[tokio::test]
async fn test_slow_older_refresh_does_not_overwrite_newer_snapshot() {
    let store = InMemoryInventoryRepository::new();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let repo = GatedListRepository {
        inner: store.clone(),
        gated: AtomicBool::new(true),
        entered: entered.clone(),
        release: release.clone(),
    };
    let view_model = Arc::new(InventoryViewModel::new(InventoryService::new(repo)));

    let slow = tokio::spawn({
        let view_model = view_model.clone();
        async move { view_model.refresh().await }
    });

    // The slow refresh has read the store while it was still empty
    entered.notified().await;

    store.insert(InventoryDocument::new("bottle", 1)).await;
    let fresh = view_model.refresh().await.unwrap();
    assert_eq!(fresh.total, 1);

    release.notify_one();
    let stale = slow.await.unwrap().unwrap();

    // The stale result is discarded, the caller sees the current list
    assert_eq!(stale.total, 1);
    assert_eq!(view_model.snapshot().len(), 1);
}
