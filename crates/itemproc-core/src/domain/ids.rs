//! Domain identifiers (strongly-typed IDs).
//!
//! Item の ID はストアが採番する連番（u64）です。
//! newtype にしておくことで、件数やインデックスと取り違えないようにしています。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an [`Item`](super::Item).
///
/// Assigned by the store on first `put`, immutable afterwards.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Identifier of one processing run.
///
/// Runs are numbered per coordinator, starting at 1.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert_eq!(ItemId::new(42).to_string(), "item-42");
        assert_eq!(RunId::new(3).to_string(), "run-3");
    }

    #[test]
    fn item_id_serializes_as_plain_number() {
        let s = serde_json::to_string(&ItemId::new(7)).unwrap();
        assert_eq!(s, "7");
        let back: ItemId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ItemId::new(7));
    }

    #[test]
    fn ids_are_ordered_by_value() {
        let mut ids = vec![ItemId::new(3), ItemId::new(1), ItemId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)]);
    }
}
