//! App layer - central state management and command processing
//!
//! The App actor receives UI events and host outcomes, updates state,
//! dispatches follow-up requests through the bridge and emits render state.

pub mod state;
pub mod actor;
pub mod commands;

pub use state::{AppState, NameError};
pub use actor::AppActor;
pub use commands::{Continuation, Followup};
