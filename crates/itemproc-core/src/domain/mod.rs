//! Domain model (IDs, items, outcomes, run results, errors).

pub mod errors;
pub mod ids;
pub mod item;
pub mod outcome;
pub mod run;
pub mod state;

pub use errors::{ErrorKind, PoolError, ProcessError, RunError, StoreError};
pub use ids::{ItemId, RunId};
pub use item::{Item, STATUS_NEW, STATUS_PROCESSED};
pub use outcome::TaskOutcome;
pub use run::{RunFailure, RunResult, aggregate};
pub use state::TaskState;
