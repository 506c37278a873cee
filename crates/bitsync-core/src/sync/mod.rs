pub mod state;
pub mod worker;

pub use state::SyncState;
pub use worker::{CycleOutcome, CycleSummary, SyncOptions, Worker};
