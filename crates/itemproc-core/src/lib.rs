//! itemproc-core
//!
//! Bulk asynchronous item processing over a pluggable item store.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, outcome, run, state, errors）
//! - **ports**: 抽象化レイヤー（ItemStore）
//! - **app**: WorkerPool, BatchCoordinator, ItemService, ProcessorBuilder
//! - **impls**: 実装（InMemoryItemStore など開発用）
//! - **config**: ProcessorConfig / PoolConfig
//! - **observability**: run ごとの集計ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{BatchCoordinator, ItemService, ProcessorBuilder, RunHandle, WorkerPool};
pub use config::{PoolConfig, ProcessorConfig};
pub use domain::{Item, ItemId, RunError, RunResult};
pub use ports::ItemStore;
