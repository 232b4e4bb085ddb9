//! State - 1 件ごとのタスク状態

use serde::{Deserialize, Serialize};

/// Lifecycle of the task processing one item within a run.
///
/// State transitions:
/// - Dispatched -> Running -> Succeeded
/// - Dispatched -> Running -> Skipped (item no longer exists)
/// - Dispatched -> Running -> Failed
/// - Dispatched -> Failed (pool refused or aborted the task)
///
/// No retries: a terminal state is final for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Submitted to the pool, not yet picked up by a worker.
    Dispatched,

    /// A worker is fetching / updating / persisting the item.
    Running,

    Succeeded,

    Failed,

    /// Item was not found at fetch time. Not a failure.
    Skipped,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Skipped
        )
    }

    /// Can `self` move to `next`?
    pub fn can_transition_to(self, next: TaskState) -> bool {
        match (self, next) {
            (TaskState::Dispatched, TaskState::Running) => true,
            (TaskState::Dispatched, TaskState::Failed) => true,
            (TaskState::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::succeeded(TaskState::Succeeded)]
    #[case::failed(TaskState::Failed)]
    #[case::skipped(TaskState::Skipped)]
    fn terminal_states_are_final(#[case] state: TaskState) {
        assert!(state.is_terminal());
        for next in [
            TaskState::Dispatched,
            TaskState::Running,
            TaskState::Succeeded,
            TaskState::Failed,
            TaskState::Skipped,
        ] {
            assert!(!state.can_transition_to(next));
        }
    }

    #[test]
    fn dispatched_can_only_run_or_fail() {
        assert!(TaskState::Dispatched.can_transition_to(TaskState::Running));
        assert!(TaskState::Dispatched.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Dispatched.can_transition_to(TaskState::Succeeded));
        assert!(!TaskState::Dispatched.can_transition_to(TaskState::Skipped));
    }

    #[test]
    fn running_reaches_any_terminal_state() {
        assert!(TaskState::Running.can_transition_to(TaskState::Succeeded));
        assert!(TaskState::Running.can_transition_to(TaskState::Skipped));
        assert!(TaskState::Running.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Running.can_transition_to(TaskState::Dispatched));
    }
}
