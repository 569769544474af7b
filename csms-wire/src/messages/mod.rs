//! Concrete message types
//!
//! One request/response pair per operation. Payload structs carry only the
//! operation's own fields; correlation, routing, signatures and timestamps
//! live on the envelope. The two traits here are the full capability set the
//! correlation engine needs from a message type — adding an operation means
//! two serde structs and two trait impls, nothing else.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::values::StatusInfo;

mod availability;
mod heartbeat;
mod reset;
mod tariffs;
mod variables;

pub use availability::{
    ChangeAvailabilityRequest, ChangeAvailabilityResponse, ChangeAvailabilityStatus,
    OperationalStatus,
};
pub use heartbeat::{HeartbeatRequest, HeartbeatResponse};
pub use reset::{ResetKind, ResetRequest, ResetResponse, ResetStatus};
pub use tariffs::{
    GetDefaultChargingTariffRequest, GetDefaultChargingTariffResponse,
    RemoveDefaultChargingTariffRequest, RemoveDefaultChargingTariffResponse,
    RemoveDefaultChargingTariffStatus, SetDefaultE2EChargingTariffRequest,
    SetDefaultE2EChargingTariffResponse, Tariff, TariffStatus,
};
pub use variables::{
    Component, GetVariableData, GetVariableResult, GetVariableStatus, GetVariablesRequest,
    GetVariablesResponse, Variable,
};

/// A concrete request payload.
///
/// `ACTION` is the operation name on the wire, by convention the type name
/// without the `Request` suffix.
pub trait RequestPayload:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const ACTION: &'static str;

    /// The response payload this operation resolves to
    type Reply: ResponsePayload;
}

/// A concrete response payload.
pub trait ResponsePayload:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Rejected-equivalent form of this payload, used by every failure path
    /// of the engine. The envelope's result object carries the error
    /// taxonomy; this carries whatever the payload schema can express about
    /// rejection (at minimum its rejected status, where one exists).
    fn rejected(info: StatusInfo) -> Self;
}
