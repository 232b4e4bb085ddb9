//! Outcome model: the terminal result of one per-item task.
//!
//! Each task writes only its own outcome; the run aggregates them after the
//! barrier. Nothing here is shared between workers.

use super::{ItemId, Item, ProcessError, TaskState};

/// Terminal outcome of the task for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The item was updated and persisted. Holds the stored version.
    Processed(Item),

    /// The item did not exist at fetch time.
    Skipped(ItemId),

    Failed(ProcessError),
}

impl TaskOutcome {
    /// Identifier the outcome refers to, when known.
    ///
    /// `Processed` items coming back from a store always carry an id,
    /// so this is `None` only for a misbehaving store.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            TaskOutcome::Processed(item) => item.id,
            TaskOutcome::Skipped(id) => Some(*id),
            TaskOutcome::Failed(err) => Some(err.item_id()),
        }
    }

    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Processed(_) => TaskState::Succeeded,
            TaskOutcome::Skipped(_) => TaskState::Skipped,
            TaskOutcome::Failed(_) => TaskState::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PoolError, STATUS_PROCESSED};

    #[test]
    fn outcome_state_is_always_terminal() {
        let processed = TaskOutcome::Processed(
            Item::new("n", "d", STATUS_PROCESSED, "n@example.com").with_id(ItemId::new(1)),
        );
        let skipped = TaskOutcome::Skipped(ItemId::new(2));
        let failed = TaskOutcome::Failed(ProcessError::Pool {
            id: ItemId::new(3),
            source: PoolError::Aborted,
        });

        assert_eq!(processed.state(), TaskState::Succeeded);
        assert_eq!(skipped.state(), TaskState::Skipped);
        assert_eq!(failed.state(), TaskState::Failed);
        for o in [&processed, &skipped, &failed] {
            assert!(o.state().is_terminal());
        }

        assert_eq!(processed.item_id(), Some(ItemId::new(1)));
        assert_eq!(skipped.item_id(), Some(ItemId::new(2)));
        assert_eq!(failed.item_id(), Some(ItemId::new(3)));
        assert!(failed.is_failure());
        assert!(!skipped.is_failure());
    }
}
