//! Dispatch lifecycle hooks
//!
//! Four observation points around every dispatch: request accepted, frame
//! on the wire, raw outcome back, response resolved. Observers are
//! fire-and-forget: a panicking observer is logged and discarded and can
//! never fail or delay the dispatch it is watching.

use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use csms_wire::frame::Call;
use csms_wire::ids::{EventTrackingId, RequestId};
use csms_wire::routing::Destination;

use crate::envelope::RpcResult;
use crate::transport::SendOutcome;

/// A request has been accepted for dispatch
#[derive(Debug)]
pub struct RequestEvent<'a> {
    pub timestamp: DateTime<Utc>,
    pub request_id: &'a RequestId,
    pub action: &'a str,
    pub event_tracking_id: &'a EventTrackingId,
    pub destination: &'a Destination,
}

/// The serialized frame is about to hit the transport
#[derive(Debug)]
pub struct WireSentEvent<'a> {
    pub timestamp: DateTime<Utc>,
    pub call: &'a Call,
    pub event_tracking_id: &'a EventTrackingId,
}

/// A raw terminal outcome arrived from the transport
#[derive(Debug)]
pub struct WireReceivedEvent<'a> {
    pub timestamp: DateTime<Utc>,
    pub request_id: &'a RequestId,
    pub outcome: &'a SendOutcome,
}

/// The dispatch resolved into a typed response
#[derive(Debug)]
pub struct ResponseEvent<'a> {
    pub timestamp: DateTime<Utc>,
    pub request_id: &'a RequestId,
    pub action: &'a str,
    pub result: &'a RpcResult,
    pub elapsed: Duration,
}

/// Observation contract around the dispatch lifecycle. All methods default
/// to no-ops so observers implement only what they watch.
pub trait DispatchObserver: Send + Sync {
    fn on_request(&self, _event: &RequestEvent<'_>) {}
    fn on_wire_sent(&self, _event: &WireSentEvent<'_>) {}
    fn on_wire_received(&self, _event: &WireReceivedEvent<'_>) {}
    fn on_response(&self, _event: &ResponseEvent<'_>) {}
}

/// Subscriber list with per-subscriber panic isolation
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn DispatchObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn request(&self, event: &RequestEvent<'_>) {
        self.notify(|observer| observer.on_request(event));
    }

    pub(crate) fn wire_sent(&self, event: &WireSentEvent<'_>) {
        self.notify(|observer| observer.on_wire_sent(event));
    }

    pub(crate) fn wire_received(&self, event: &WireReceivedEvent<'_>) {
        self.notify(|observer| observer.on_wire_received(event));
    }

    pub(crate) fn response(&self, event: &ResponseEvent<'_>) {
        self.notify(|observer| observer.on_response(event));
    }

    fn notify<F: Fn(&dyn DispatchObserver)>(&self, notify_one: F) {
        for observer in &self.observers {
            if catch_unwind(AssertUnwindSafe(|| notify_one(observer.as_ref()))).is_err() {
                warn!("dispatch observer panicked; event dropped for this observer");
            }
        }
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Default observer: structured logs via `tracing`
#[derive(Debug, Default)]
pub struct TraceObserver;

impl DispatchObserver for TraceObserver {
    fn on_request(&self, event: &RequestEvent<'_>) {
        debug!(
            request_id = %event.request_id,
            action = event.action,
            tracking = %event.event_tracking_id,
            "dispatching request"
        );
    }

    fn on_wire_sent(&self, event: &WireSentEvent<'_>) {
        debug!(request_id = %event.call.id, action = %event.call.action, "frame sent");
    }

    fn on_wire_received(&self, event: &WireReceivedEvent<'_>) {
        match event.outcome {
            SendOutcome::Reply(_) => {
                debug!(request_id = %event.request_id, "reply received")
            }
            SendOutcome::Fault(fault) => {
                debug!(request_id = %event.request_id, code = %fault.code, "fault received")
            }
            SendOutcome::Transport { status, body } => {
                debug!(request_id = %event.request_id, status = ?status, body = %body, "transport failure")
            }
        }
    }

    fn on_response(&self, event: &ResponseEvent<'_>) {
        info!(
            request_id = %event.request_id,
            action = event.action,
            code = %event.result.code,
            elapsed_ms = event.elapsed.as_millis() as u64,
            "request resolved"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl DispatchObserver for Counting {
        fn on_response(&self, _event: &ResponseEvent<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicking;

    impl DispatchObserver for Panicking {
        fn on_response(&self, _event: &ResponseEvent<'_>) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_panicking_observer_does_not_stop_the_rest() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));

        let mut set = ObserverSet::new();
        set.subscribe(Arc::new(Panicking));
        set.subscribe(counting.clone());

        let id = RequestId::from("r1");
        let result = RpcResult::ok();
        set.response(&ResponseEvent {
            timestamp: Utc::now(),
            request_id: &id,
            action: "Reset",
            result: &result,
            elapsed: Duration::from_millis(3),
        });

        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }
}
