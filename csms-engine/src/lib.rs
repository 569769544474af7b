//! # csms-engine
//!
//! Request/response correlation engine for the EK central system.
//!
//! A strongly-typed request goes in; a fully formed, strongly-typed
//! response comes out — whatever happened on the way. The engine owns the
//! lifecycle in between:
//!
//! ```text
//! caller ──► RequestEnvelope ──► Dispatcher ──► Transport ──► station
//!                                    │
//!              correlation slot, timeout, cancellation,
//!              outcome mapping, lifecycle events
//!                                    │
//! caller ◄── ResponseEnvelope ◄──────┘
//! ```
//!
//! - `envelope`: the shape every request and response share, plus the
//!   failure factories that make every outcome a typed response
//! - `dispatch`: the generic dispatch loop, one for all operations
//! - `pending`: the in-flight correlation table
//! - `transport`: the narrow send/receive contract adapters implement
//! - `events`: panic-isolated lifecycle hooks
//! - `cancel`: cooperative per-request cancellation
//! - `ws`: WebSocket adapter implementing the transport contract
//!
//! Concurrency model: one dispatch is one task; slots are independent, so
//! any number of dispatches may be in flight against the same station, and
//! correlation is by request id, never by arrival order.

pub mod cancel;
pub mod dispatch;
pub mod envelope;
pub mod events;
pub mod pending;
pub mod transport;
pub mod ws;

pub use cancel::{CancelHandle, CancelToken};
pub use dispatch::{Dispatcher, DispatcherConfig, SignatureCheck};
pub use envelope::{RequestEnvelope, ResponseEnvelope, ResultCode, RpcResult};
pub use events::{
    DispatchObserver, ObserverSet, RequestEvent, ResponseEvent, TraceObserver, WireReceivedEvent,
    WireSentEvent,
};
pub use pending::{DuplicateRequestId, PendingEntry, PendingTable};
pub use transport::{DestinationMeta, SendOutcome, Transport};
pub use ws::{WsConfig, WsError, WsTransport};
