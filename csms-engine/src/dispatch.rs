//! The correlation engine
//!
//! One generic dispatch path for every operation: emit lifecycle events,
//! claim a correlation slot, serialize, hand the frame to the transport,
//! await exactly one terminal outcome, and turn whatever happened into a
//! fully formed typed response. The caller never sees a panic or an error
//! type from [`Dispatcher::dispatch`]; it inspects the response's result.
//!
//! In-flight state machine, per request:
//! `Created -> Sent -> {reply | fault | transport failure | panic |
//! timeout | canceled} -> Resolved`. A slot never re-enters `Sent`;
//! a retry is a fresh envelope with a fresh correlation id.

use chrono::Utc;
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::error;

use csms_wire::codec::{encode, try_decode, EncodeHooks};
use csms_wire::frame::{Call, CallError};
use csms_wire::messages::RequestPayload;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::events::{
    DispatchObserver, ObserverSet, RequestEvent, ResponseEvent, WireReceivedEvent, WireSentEvent,
};
use crate::pending::{PendingEntry, PendingTable};
use crate::transport::{DestinationMeta, SendOutcome, Transport};

/// Validates the signatures carried by a raw reply payload before it is
/// decoded. Returning an error resolves the dispatch as a signature error.
pub type SignatureCheck = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Deadline applied when a request does not carry its own
    pub default_timeout: Duration,
    /// After cancellation fires, how long an already-arriving outcome may
    /// still win over the canceled resolution
    pub cancel_grace: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            cancel_grace: Duration::from_millis(250),
        }
    }
}

impl DispatcherConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }
}

/// Internal terminal verdict of one exchange, before envelope construction
enum Verdict<P> {
    Reply(P),
    BadReply(String),
    BadSignature(String),
    Fault(CallError),
    Transport { status: Option<u16>, body: String },
    Panicked(String),
    EncodeFailed(String),
    TimedOut(Duration),
    Canceled,
}

/// The generic request/response correlation engine
pub struct Dispatcher<T: Transport> {
    transport: T,
    config: DispatcherConfig,
    pending: PendingTable,
    observers: ObserverSet,
    hooks: EncodeHooks,
    signature_check: Option<SignatureCheck>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: DispatcherConfig::default(),
            pending: PendingTable::new(),
            observers: ObserverSet::new(),
            hooks: EncodeHooks::new(),
            signature_check: None,
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: std::sync::Arc<dyn DispatchObserver>) -> Self {
        self.observers.subscribe(observer);
        self
    }

    pub fn with_hooks(mut self, hooks: EncodeHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_signature_check(mut self, check: SignatureCheck) -> Self {
        self.signature_check = Some(check);
        self
    }

    /// Number of in-flight requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch one request and resolve it into a typed response.
    ///
    /// Every failure kind (malformed reply, peer fault, transport failure,
    /// adapter panic, timeout, cancellation, duplicate correlation id)
    /// resolves into a response envelope carrying the matching result code;
    /// none of them escapes as a panic or error.
    pub async fn dispatch<R: RequestPayload>(
        &self,
        request: RequestEnvelope<R>,
    ) -> ResponseEnvelope<R> {
        let started = Instant::now();

        self.observers.request(&RequestEvent {
            timestamp: Utc::now(),
            request_id: request.request_id(),
            action: R::ACTION,
            event_tracking_id: request.event_tracking_id(),
            destination: request.destination(),
        });

        let entry = PendingEntry {
            action: R::ACTION,
            event_tracking_id: request.event_tracking_id().clone(),
            started_at: started,
        };
        if let Err(duplicate) = self.pending.register(request.request_id().clone(), entry) {
            let response =
                ResponseEnvelope::internal_fault(request, duplicate.to_string(), started.elapsed());
            self.emit_response(&response);
            return response;
        }

        let verdict = self.exchange(&request).await;

        // The slot leaves the table on every branch, resolved exactly once.
        if self.pending.complete(request.request_id()).is_none() {
            error!(
                request_id = %request.request_id(),
                "pending correlation slot missing at resolution"
            );
        }

        let elapsed = started.elapsed();
        let response = match verdict {
            Verdict::Reply(payload) => ResponseEnvelope::success(request, payload, elapsed),
            Verdict::BadReply(detail) => {
                ResponseEnvelope::formation_violation(request, detail, elapsed)
            }
            Verdict::BadSignature(detail) => {
                ResponseEnvelope::signature_error(request, detail, elapsed)
            }
            Verdict::Fault(fault) => ResponseEnvelope::request_error(request, &fault, elapsed),
            Verdict::Transport { status, body } => {
                ResponseEnvelope::transport_fault(request, status, body, elapsed)
            }
            Verdict::Panicked(detail) => {
                ResponseEnvelope::exception_occurred(request, detail, elapsed)
            }
            Verdict::EncodeFailed(detail) => {
                ResponseEnvelope::exception_occurred(request, detail, elapsed)
            }
            Verdict::TimedOut(limit) => ResponseEnvelope::timed_out(request, limit, elapsed),
            Verdict::Canceled => ResponseEnvelope::canceled(request, elapsed),
        };

        self.emit_response(&response);
        response
    }

    /// Serialize, send, and await one terminal outcome
    async fn exchange<R: RequestPayload>(&self, request: &RequestEnvelope<R>) -> Verdict<R::Reply> {
        let mut wire = match encode(request.payload()) {
            Ok(value) => value,
            Err(e) => return Verdict::EncodeFailed(e.to_string()),
        };
        self.hooks.apply_encode(&mut wire);

        let call = Call::new(request.request_id().clone(), R::ACTION, wire);
        let meta = DestinationMeta::new(request.destination().clone())
            .with_network_path(request.network_path().clone());
        let limit = request.effective_timeout(self.config.default_timeout);

        self.observers.wire_sent(&WireSentEvent {
            timestamp: Utc::now(),
            call: &call,
            event_tracking_id: request.event_tracking_id(),
        });

        // A panicking adapter must resolve this dispatch, not unwind it.
        let send = AssertUnwindSafe(self.transport.send(
            call,
            &meta,
            request.event_tracking_id(),
            limit,
        ))
        .catch_unwind();
        tokio::pin!(send);

        let raced = match request.cancel_token() {
            Some(cancel) => {
                tokio::select! {
                    finished = tokio::time::timeout(limit, send.as_mut()) => Some(finished),
                    () = cancel.cancelled() => {
                        // Dropping the send future aborts the underlying
                        // operation; an outcome already arriving may still
                        // win within the grace period.
                        match tokio::time::timeout(self.config.cancel_grace, send.as_mut()).await {
                            Ok(finished) => Some(Ok(finished)),
                            Err(_) => None,
                        }
                    }
                }
            }
            None => Some(tokio::time::timeout(limit, send.as_mut()).await),
        };

        let outcome = match raced {
            None => return Verdict::Canceled,
            Some(Err(_)) => return Verdict::TimedOut(limit),
            Some(Ok(Err(panic))) => return Verdict::Panicked(panic_message(panic)),
            Some(Ok(Ok(outcome))) => outcome,
        };

        self.observers.wire_received(&WireReceivedEvent {
            timestamp: Utc::now(),
            request_id: request.request_id(),
            outcome: &outcome,
        });

        match outcome {
            SendOutcome::Reply(mut payload) => {
                self.hooks.apply_decode(&mut payload);
                if let Some(check) = &self.signature_check {
                    if let Err(detail) = check(&payload) {
                        return Verdict::BadSignature(detail);
                    }
                }
                match try_decode::<R::Reply>(&payload) {
                    Ok(reply) => Verdict::Reply(reply),
                    Err(e) => Verdict::BadReply(e.to_string()),
                }
            }
            SendOutcome::Fault(fault) => Verdict::Fault(fault),
            SendOutcome::Transport { status, body } => Verdict::Transport { status, body },
        }
    }

    fn emit_response<R: RequestPayload>(&self, response: &ResponseEnvelope<R>) {
        self.observers.response(&ResponseEvent {
            timestamp: Utc::now(),
            request_id: response.request.request_id(),
            action: R::ACTION,
            result: &response.result,
            elapsed: response.runtime,
        });
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "transport panicked with a non-string payload".to_string()
    }
}
