use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Collection holding one document per item, keyed by item name
pub const INVENTORY_COLLECTION: &str = "inventory";

/// Longest accepted item name, in characters
pub const MAX_NAME_LENGTH: u64 = 200;

/// One inventory line as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryItem {
    /// Canonical item key, unique across the store
    pub name: String,
    /// Always at least 1; items that would reach 0 are deleted instead
    pub quantity: i64,
}

/// Stored form of an item: `{ _id: name, quantity, revision }`
///
/// `revision` is bumped on every write and drives conditional updates.
/// Documents written without it read as revision 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(rename = "_id", alias = "name")]
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub revision: i64,
}

impl InventoryDocument {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            revision: 1,
        }
    }
}

impl From<InventoryDocument> for InventoryItem {
    fn from(doc: InventoryDocument) -> Self {
        Self {
            name: doc.name,
            quantity: doc.quantity,
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Manual add form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddItem {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub name: String,
}

/// Search box contents
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub query: String,
}

/// The list as rendered: items matching `query`, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryView {
    pub query: String,
    pub items: Vec<InventoryItem>,
    /// Number of items in the full snapshot, before filtering
    pub total: usize,
    /// Nothing matches the current query (or the inventory is empty)
    pub empty: bool,
}

/// How increments and decrements guard against concurrent writers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpdateStrategy {
    /// Read, then write only if the revision is unchanged; retry on conflict
    #[default]
    CompareAndSet,
    /// Read, then overwrite unconditionally. Concurrent updates to the same
    /// item can be lost.
    LastWriteWins,
}

/// Tuning for [`InventoryService`](crate::service::InventoryService)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub strategy: UpdateStrategy,
    /// Upper bound on read/conditional-write rounds per mutation
    pub max_attempts: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            strategy: UpdateStrategy::CompareAndSet,
            max_attempts: 5,
        }
    }
}

/// Result of removing one unit of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "quantity", rename_all = "snake_case")]
pub enum Decrement {
    /// No such item; nothing changed
    Absent,
    /// Quantity was 1, the item is gone
    Removed,
    /// New quantity
    Remaining(i64),
}

/// Case-insensitive substring match of `query` against item names.
/// An empty query matches everything.
pub fn filter_items(items: &[InventoryItem], query: &str) -> Vec<InventoryItem> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
