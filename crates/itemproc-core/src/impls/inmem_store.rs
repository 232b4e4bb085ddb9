//! InMemoryItemStore - 開発・テスト用のストア
//!
//! # 実装詳細
//! - BTreeMap<ItemId, Item> を tokio::sync::Mutex で保護
//! - ロックは各操作の中で完結（ロックを跨いで await しない）
//! - id なしの put には連番を採番

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Item, ItemId, StoreError};
use crate::ports::ItemStore;

struct InMemoryStoreState {
    items: BTreeMap<ItemId, Item>,

    /// Next id to assign.
    next_id: u64,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn put(&mut self, mut item: Item) -> Item {
        let id = match item.id {
            Some(id) => {
                // keep the counter ahead of explicitly chosen ids
                if id.get() >= self.next_id {
                    self.next_id = id.get() + 1;
                }
                id
            }
            None => self.allocate_id(),
        };
        item.id = Some(id);
        self.items.insert(id, item.clone());
        item
    }
}

/// In-memory [`ItemStore`].
///
/// Cloning shares the same underlying map.
#[derive(Clone)]
pub struct InMemoryItemStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
        }
    }

    /// Store every item, returning the stored versions (with ids).
    pub async fn seed(&self, items: impl IntoIterator<Item = Item>) -> Vec<Item> {
        let mut state = self.state.lock().await;
        items.into_iter().map(|item| state.put(item)).collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list_all_ids(&self) -> Result<Vec<ItemId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.keys().copied().collect())
    }

    async fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.get(&id).cloned())
    }

    async fn put(&self, item: Item) -> Result<Item, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.put(item))
    }

    async fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.items.remove(&id);
        Ok(())
    }
}
