//! Item: the single record type handled by the backend.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// Status value of a freshly created item.
pub const STATUS_NEW: &str = "NEW";

/// Status value written by the batch processor.
pub const STATUS_PROCESSED: &str = "PROCESSED";

/// A stored record.
///
/// The processor treats this as an opaque value except for `status`.
/// `email` format checks belong to the request layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form. Unset and `NEW` both mean "not processed yet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    pub email: String,
}

impl Item {
    /// Build an item that has not been stored yet (no id).
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            status: Some(status.into()),
            email: email.into(),
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_processed(&self) -> bool {
        self.status() == Some(STATUS_PROCESSED)
    }

    /// Apply the processing transition. Re-applying is a no-op.
    pub fn mark_processed(&mut self) {
        self.status = Some(STATUS_PROCESSED.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::new(Some(STATUS_NEW))]
    #[case::unset(None)]
    #[case::arbitrary(Some("satus"))]
    #[case::already_processed(Some(STATUS_PROCESSED))]
    fn mark_processed_always_ends_processed(#[case] status: Option<&str>) {
        let mut item = Item::new("a", "b", "x", "a@example.com");
        item.status = status.map(str::to_string);

        item.mark_processed();
        assert!(item.is_processed());
        assert_eq!(item.status(), Some("PROCESSED"));
    }

    #[test]
    fn new_item_has_no_id() {
        let item = Item::new("Item1", "D1", STATUS_NEW, "test1@ex.com");
        assert_eq!(item.id, None);
        assert!(!item.is_processed());
    }

    #[test]
    fn json_omits_unset_fields() {
        let item = Item {
            id: None,
            name: "n".to_string(),
            description: None,
            status: None,
            email: "n@example.com".to_string(),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v, serde_json::json!({"name": "n", "email": "n@example.com"}));
    }
}
