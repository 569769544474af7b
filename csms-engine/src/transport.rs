//! Transport contract
//!
//! The engine depends on the transport only through [`Transport::send`]:
//! hand over one CALL frame, get back exactly one terminal outcome. The
//! adapter owns connections, TLS, reconnection and whatever addressing its
//! wire format needs beyond the frame itself.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use csms_wire::frame::{Call, CallError};
use csms_wire::ids::EventTrackingId;
use csms_wire::routing::{Destination, NetworkPath};

/// Addressing metadata handed to the adapter alongside the frame.
///
/// JSON adapters usually need only the destination; envelope-based wire
/// formats also carry the station identity and the traversed path outside
/// the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationMeta {
    pub destination: Destination,
    pub network_path: NetworkPath,
    pub charge_box_identity: Option<String>,
}

impl DestinationMeta {
    pub fn new(destination: Destination) -> Self {
        let charge_box_identity = destination.final_node().map(|n| n.to_string());
        Self {
            destination,
            network_path: NetworkPath::empty(),
            charge_box_identity,
        }
    }

    pub fn with_network_path(mut self, path: NetworkPath) -> Self {
        self.network_path = path;
        self
    }
}

/// Terminal outcome of one send
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The peer answered with a CALLRESULT payload
    Reply(Value),
    /// The peer actively reported an error for this request
    Fault(CallError),
    /// The transport failed before a protocol-level answer existed
    Transport { status: Option<u16>, body: String },
}

/// One-shot send/receive contract the dispatcher consumes.
///
/// `timeout` is the effective deadline of the request; the adapter should
/// bound its own waiting by it. The dispatcher enforces the deadline
/// independently, so an adapter that never returns is still contained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        call: Call,
        meta: &DestinationMeta,
        tracking: &EventTrackingId,
        timeout: Duration,
    ) -> SendOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_derives_station_identity_from_destination() {
        let meta = DestinationMeta::new(Destination::node("CS001"));
        assert_eq!(meta.charge_box_identity.as_deref(), Some("CS001"));

        let routed = DestinationMeta::new(Destination::route(vec![
            "LC1".into(),
            "CS002".into(),
        ]));
        assert_eq!(routed.charge_box_identity.as_deref(), Some("CS002"));
    }
}
