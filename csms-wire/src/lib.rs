//! # csms-wire
//!
//! Wire types and JSON codec for the EK central system's OCPP 2.1 link:
//! - `ids`: typed identifiers (request, tracking, node, EVSE, tariff)
//! - `routing`: overlay-network destination and traversed-path types
//! - `values`: value objects shared by every message (StatusInfo,
//!   Signature, CustomData, per-EVSE status entries)
//! - `frame`: OCPP-J array framing (CALL, CALLRESULT, CALLERROR)
//! - `codec`: payload encode/decode discipline and extension hooks
//! - `fingerprint`: structural digests for dedup and retry detection
//! - `messages`: concrete request/response pairs and the two traits the
//!   correlation engine is generic over
//!
//! Everything here is an immutable value after construction and freely
//! shareable across tasks.

pub mod codec;
pub mod fingerprint;
pub mod frame;
pub mod ids;
pub mod messages;
pub mod routing;
pub mod values;

pub use codec::{decode, encode, try_decode, DecodeError, EncodeError, EncodeHooks};
pub use frame::{Call, CallError, CallErrorCode, CallResult, Frame, FrameError};
pub use ids::{EventTrackingId, EvseId, IdError, NetworkingNodeId, RequestId, TariffId};
pub use messages::{RequestPayload, ResponsePayload};
pub use routing::{Destination, NetworkPath};
pub use values::{
    CustomData, Evse, EVSEStatusInfo, GenericStatus, Signature, SigningKey, StatusInfo,
};
