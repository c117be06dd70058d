//! The active training run: state machine and its saved file.

pub mod state;
pub mod store;

pub use state::{RunEffect, RunEvent, RunPhase, RunState};
pub use store::RunStore;
