//! ItemService - 外側（HTTP 層など）から呼ばれる窓口
//!
//! CRUD はストアへの素通し。バッチ処理は BatchCoordinator に委譲。

use std::sync::Arc;

use tracing::info;

use super::coordinator::{BatchCoordinator, RunHandle};
use super::pool::{ShutdownReport, WorkerPool};
use crate::config::ProcessorConfig;
use crate::domain::{Item, ItemId, StoreError};
use crate::ports::ItemStore;

/// Entry point for the surrounding application.
///
/// Build it with [`ProcessorBuilder`](super::ProcessorBuilder) and call
/// [`shutdown`](Self::shutdown) once at teardown.
pub struct ItemService {
    store: Arc<dyn ItemStore>,
    coordinator: BatchCoordinator,
    config: ProcessorConfig,
}

impl ItemService {
    pub(crate) fn new(
        store: Arc<dyn ItemStore>,
        coordinator: BatchCoordinator,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            coordinator,
            config,
        }
    }

    pub async fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        self.store.find_all().await
    }

    pub async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.store.get(id).await
    }

    pub async fn save(&self, item: Item) -> Result<Item, StoreError> {
        self.store.put(item).await
    }

    pub async fn delete_by_id(&self, id: ItemId) -> Result<(), StoreError> {
        self.store.delete(id).await
    }

    /// Process every stored item. Returns without waiting; await the
    /// handle (optionally with a timeout) for the result.
    pub fn process_items(&self) -> RunHandle {
        self.coordinator.process_all()
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        self.coordinator.pool()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Shut the worker pool down. Safe to call more than once.
    pub async fn shutdown(&self) -> ShutdownReport {
        let report = self.pool().shutdown().await;
        info!(?report, "item service stopped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::app::ProcessorBuilder;
    use crate::config::PoolConfig;
    use crate::domain::{RunError, STATUS_NEW, STATUS_PROCESSED};
    use crate::impls::InMemoryItemStore;

    fn service(store: InMemoryItemStore) -> ItemService {
        let config = ProcessorConfig::default()
            .with_pool(PoolConfig::default().with_workers(4))
            .with_task_delay(Duration::from_millis(5));
        ProcessorBuilder::new()
            .store(Arc::new(store))
            .config(config)
            .build()
            .unwrap()
    }

    fn item(name: &str) -> Item {
        Item::new(name, format!("{name} description"), STATUS_NEW, format!("{name}@example.com"))
    }

    #[tokio::test]
    async fn crud_passes_through_to_store() {
        let service = service(InMemoryItemStore::new());

        let saved = service.save(item("TestItem")).await.unwrap();
        let id = saved.id.unwrap();
        assert_eq!(service.find_by_id(id).await.unwrap(), Some(saved.clone()));

        let mut updated = saved.clone();
        updated.name = "Updated".to_string();
        updated.status = Some("UPDATED".to_string());
        let updated = service.save(updated).await.unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(service.find_all().await.unwrap(), vec![updated]);

        service.delete_by_id(id).await.unwrap();
        assert_eq!(service.find_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn process_items_updates_store() {
        let store = InMemoryItemStore::new();
        store.seed([item("Item1"), item("Item2")]).await;
        let service = service(store);

        let result = service
            .process_items()
            .wait_timeout(Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        for stored in service.find_all().await.unwrap() {
            assert_eq!(stored.status(), Some(STATUS_PROCESSED));
        }
    }

    #[tokio::test]
    async fn shutdown_then_process_reports_failures() {
        let store = InMemoryItemStore::new();
        store.seed([item("a")]).await;
        let service = service(store);

        assert_eq!(service.shutdown().await, ShutdownReport::Drained);
        assert_eq!(service.shutdown().await, ShutdownReport::AlreadyShutDown);

        let err = service.process_items().await.unwrap_err();
        assert!(matches!(err, RunError::TasksFailed(_)));
    }
}
