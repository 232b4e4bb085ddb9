//! App - アプリケーション層
//!
//! ports を組み合わせてバッチ処理を実装します。
//!
//! # 主要コンポーネント
//! - **WorkerPool**: 固定サイズのワーカープール
//! - **item_task**: 1 件分の処理
//! - **BatchCoordinator**: run 全体（snapshot → dispatch → barrier → aggregate）
//! - **ItemService**: 外側からの窓口（CRUD + process_items + shutdown）
//! - **ProcessorBuilder**: ワイヤリング

pub mod builder;
pub mod coordinator;
pub mod item_task;
pub mod pool;
pub mod service;

pub use self::builder::{BuildError, ProcessorBuilder};
pub use self::coordinator::{BatchCoordinator, RunHandle};
pub use self::pool::{CancellationSignal, ShutdownReport, TaskHandle, WorkerPool};
pub use self::service::ItemService;
