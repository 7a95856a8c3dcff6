//! Host messages - communication between the bridge and the Host layer

use crate::bridge::{Envelope, Outcome, RequestId};

/// Commands sent from the bridge to the Host layer
#[derive(Debug, Clone)]
pub enum HostCommand {
    /// Run the operation named in the envelope
    Dispatch(Envelope),
    /// Shutdown the host actor
    Shutdown,
}

/// Responses sent from the Host layer back to the bridge
#[derive(Debug, Clone, PartialEq)]
pub struct HostResponse {
    pub id: RequestId,
    pub outcome: Outcome,
}

impl HostResponse {
    pub fn new(id: RequestId, outcome: Outcome) -> Self {
        HostResponse { id, outcome }
    }
}
