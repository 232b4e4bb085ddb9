//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryItemStore**: 開発・テスト用のストア
//!
//! 本番用の実装（PostgreSQL など）は別クレートに配置します。

pub mod inmem_store;

pub use self::inmem_store::InMemoryItemStore;
