//! ItemStore port - レコードの正本（source of truth）
//!
//! バッチ処理のコアが使うのは `list_all_ids` / `get` / `put` の 3 つだけ。
//! `find_all` / `delete` は CRUD 用（ItemService から素通し）。

use async_trait::async_trait;

use crate::domain::{Item, ItemId, StoreError};

/// Persistence seam for items.
///
/// Implementations must be safe to call from many workers at once and must
/// not hold internal locks across their own `.await` points longer than a
/// single operation.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Snapshot of every id currently stored.
    async fn list_all_ids(&self) -> Result<Vec<ItemId>, StoreError>;

    /// `Ok(None)` when no item has this id.
    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Insert or replace. An item without id gets one assigned.
    /// Returns the stored version.
    async fn put(&self, item: Item) -> Result<Item, StoreError>;

    async fn find_all(&self) -> Result<Vec<Item>, StoreError>;

    /// Deleting a missing id is not an error.
    async fn delete(&self, id: ItemId) -> Result<(), StoreError>;
}
