//! Ports - 抽象化レイヤー
//!
//! コアが外部（DB など）に要求するインターフェースを trait で定義します。
//! 実装は `impls`（開発・テスト用）か、別クレートに置きます。

pub mod item_store;

pub use self::item_store::ItemStore;
