use serde::{Deserialize, Serialize};

use crate::domain::{TaskOutcome, TaskState};

/// Per-run tally of terminal task states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunCounts {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a TaskOutcome>) -> Self {
        let mut counts = RunCounts::default();
        for outcome in outcomes {
            match outcome.state() {
                TaskState::Succeeded => counts.processed += 1,
                TaskState::Skipped => counts.skipped += 1,
                TaskState::Failed => counts.failed += 1,
                // outcomes are terminal by construction
                TaskState::Dispatched | TaskState::Running => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}
