//! ProcessorBuilder - ストア・プール・設定のワイヤリング
//!
//! # Fail-fast 設計
//! - ストア未設定・不正な設定は `build()` 時に BuildError
//! - プールを渡さなければ設定からプールを作る（tokio runtime 内で呼ぶこと）

use std::sync::Arc;

use crate::config::{ConfigError, ProcessorConfig};
use crate::ports::ItemStore;

use super::coordinator::BatchCoordinator;
use super::pool::WorkerPool;
use super::service::ItemService;

/// Builds an [`ItemService`].
///
/// # 使用例
/// ```ignore
/// let service = ProcessorBuilder::new()
///     .store(Arc::new(InMemoryItemStore::new()))
///     .config(ProcessorConfig::from_env()?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ProcessorBuilder {
    store: Option<Arc<dyn ItemStore>>,
    pool: Option<Arc<WorkerPool>>,
    config: ProcessorConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no item store configured")]
    MissingStore,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn ItemStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing pool instead of creating one from the config.
    /// `config.pool` is then ignored.
    pub fn pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Result<ItemService, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        self.config.validate()?;

        let pool = match self.pool {
            Some(pool) => pool,
            None => Arc::new(WorkerPool::new(&self.config.pool)?),
        };
        let coordinator =
            BatchCoordinator::new(Arc::clone(&store), pool, self.config.task_delay());

        Ok(ItemService::new(store, coordinator, self.config))
    }
}
