//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines all messages that flow between the UI, App, and Host layers.

pub mod ui_events;
pub mod host;
pub mod render;

pub use ui_events::UiEvent;
pub use host::{HostCommand, HostResponse};
pub use render::{RenderState, Status};
