//! Request/response envelope model
//!
//! The common shape every operation shares. Concrete message types supply
//! only their payload; the envelope carries identification, routing,
//! timestamps, signatures and the machine-readable outcome. A response
//! envelope is always fully formed: every failure path produces a complete,
//! typed response, never a panic crossing the engine boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use csms_wire::codec::encode;
use csms_wire::fingerprint;
use csms_wire::frame::CallError;
use csms_wire::ids::{EventTrackingId, RequestId};
use csms_wire::messages::{RequestPayload, ResponsePayload};
use csms_wire::routing::{Destination, NetworkPath};
use csms_wire::values::{CustomData, Signature, StatusInfo};

use crate::cancel::CancelToken;

/// Machine-readable outcome classifier of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    Ok,
    FormationViolation,
    SignatureError,
    GenericError,
    ProtocolError,
    TransportFault,
    Timeout,
    Canceled,
    ExceptionOccurred,
    InternalFault,
}

impl ResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Ok => "Ok",
            ResultCode::FormationViolation => "FormationViolation",
            ResultCode::SignatureError => "SignatureError",
            ResultCode::GenericError => "GenericError",
            ResultCode::ProtocolError => "ProtocolError",
            ResultCode::TransportFault => "TransportFault",
            ResultCode::Timeout => "Timeout",
            ResultCode::Canceled => "Canceled",
            ResultCode::ExceptionOccurred => "ExceptionOccurred",
            ResultCode::InternalFault => "InternalFault",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one dispatch: a code plus optional human-readable description
/// and structured details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResult {
    pub code: ResultCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RpcResult {
    pub fn ok() -> Self {
        Self {
            code: ResultCode::Ok,
            description: None,
            details: None,
        }
    }

    pub fn new(code: ResultCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Payload-level rendition of this result, for rejected reply payloads
    pub fn status_info(&self) -> StatusInfo {
        let info = StatusInfo::new(self.code.as_str());
        match &self.description {
            Some(description) => info.with_detail(description.clone()),
            None => info,
        }
    }
}

/// One outgoing request: payload plus everything the engine needs to route,
/// correlate, sign and expire it.
///
/// The structural fingerprint is frozen at construction over action,
/// destination, payload and custom data. Signatures are appended afterwards
/// and are not part of it, so a signed and an unsigned copy of the same
/// request deduplicate to the same fingerprint.
#[derive(Debug, Clone)]
pub struct RequestEnvelope<R: RequestPayload> {
    destination: Destination,
    network_path: NetworkPath,
    request_id: RequestId,
    request_timestamp: DateTime<Utc>,
    timeout: Option<Duration>,
    event_tracking_id: EventTrackingId,
    signatures: Vec<Signature>,
    custom_data: Option<CustomData>,
    cancel: Option<CancelToken>,
    payload: R,
    fingerprint: u64,
}

impl<R: RequestPayload> RequestEnvelope<R> {
    pub fn new(destination: Destination, payload: R) -> Self {
        let mut envelope = Self {
            destination,
            network_path: NetworkPath::empty(),
            request_id: RequestId::random(),
            request_timestamp: Utc::now(),
            timeout: None,
            event_tracking_id: EventTrackingId::random(),
            signatures: Vec::new(),
            custom_data: None,
            cancel: None,
            payload,
            fingerprint: 0,
        };
        envelope.refresh_fingerprint();
        envelope
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.request_timestamp = timestamp;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_event_tracking_id(mut self, id: EventTrackingId) -> Self {
        self.event_tracking_id = id;
        self
    }

    pub fn with_network_path(mut self, path: NetworkPath) -> Self {
        self.network_path = path;
        self
    }

    pub fn with_custom_data(mut self, data: CustomData) -> Self {
        self.custom_data = Some(data);
        self.refresh_fingerprint();
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Append a signature. Does not alter the fingerprint.
    pub fn sign(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn network_path(&self) -> &NetworkPath {
        &self.network_path
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn request_timestamp(&self) -> DateTime<Utc> {
        self.request_timestamp
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn effective_timeout(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    pub fn event_tracking_id(&self) -> &EventTrackingId {
        &self.event_tracking_id
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn custom_data(&self) -> Option<&CustomData> {
        self.custom_data.as_ref()
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    pub fn payload(&self) -> &R {
        &self.payload
    }

    pub fn action(&self) -> &'static str {
        R::ACTION
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn refresh_fingerprint(&mut self) {
        let mut acc = fingerprint::hash_str(R::ACTION);
        acc = fingerprint::combine(
            acc,
            encode(&self.destination).map_or(0, |v| fingerprint::of_json(&v)),
        );
        acc = fingerprint::combine(
            acc,
            encode(&self.payload).map_or(0, |v| fingerprint::of_json(&v)),
        );
        acc = fingerprint::combine(
            acc,
            self.custom_data
                .as_ref()
                .and_then(|d| encode(d).ok())
                .map_or(0, |v| fingerprint::of_json(&v)),
        );
        self.fingerprint = acc;
    }
}

/// Structural equality: correlation identity plus the frozen fingerprint.
/// Signatures and the cancellation signal do not participate, and
/// collection-order differences inside the payload wash out through the
/// fingerprint.
impl<R: RequestPayload> PartialEq for RequestEnvelope<R> {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
            && self.fingerprint == other.fingerprint
            && self.network_path == other.network_path
            && self.timeout == other.timeout
            && self.request_timestamp == other.request_timestamp
    }
}

impl<R: RequestPayload> Eq for RequestEnvelope<R> {}

impl<R: RequestPayload> Hash for RequestEnvelope<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request_id.hash(state);
        state.write_u64(self.fingerprint);
    }
}

/// One resolved dispatch: the originating request, the outcome, and a fully
/// formed reply payload.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<R: RequestPayload> {
    pub request: RequestEnvelope<R>,
    pub result: RpcResult,
    pub response_timestamp: DateTime<Utc>,
    /// Wall-clock time from dispatch to resolution
    pub runtime: Duration,
    pub payload: R::Reply,
    pub signatures: Vec<Signature>,
    pub custom_data: Option<CustomData>,
}

impl<R: RequestPayload> ResponseEnvelope<R> {
    fn build(request: RequestEnvelope<R>, result: RpcResult, payload: R::Reply, runtime: Duration) -> Self {
        Self {
            request,
            result,
            response_timestamp: Utc::now(),
            runtime,
            payload,
            signatures: Vec::new(),
            custom_data: None,
        }
    }

    /// Rejected-equivalent response carrying the given result
    fn from_result(request: RequestEnvelope<R>, result: RpcResult, runtime: Duration) -> Self {
        let payload = R::Reply::rejected(result.status_info());
        Self::build(request, result, payload, runtime)
    }

    pub fn success(request: RequestEnvelope<R>, payload: R::Reply, runtime: Duration) -> Self {
        Self::build(request, RpcResult::ok(), payload, runtime)
    }

    /// The peer actively reported a protocol-level error for this request
    pub fn request_error(
        request: RequestEnvelope<R>,
        fault: &CallError,
        runtime: Duration,
    ) -> Self {
        let mut result = RpcResult::new(
            ResultCode::ProtocolError,
            format!("{}: {}", fault.code, fault.description),
        );
        if !fault.details.is_null() {
            result = result.with_details(fault.details.clone());
        }
        Self::from_result(request, result, runtime)
    }

    /// The reply arrived but was structurally malformed
    pub fn formation_violation(
        request: RequestEnvelope<R>,
        description: impl Into<String>,
        runtime: Duration,
    ) -> Self {
        let result = RpcResult::new(ResultCode::FormationViolation, description);
        Self::from_result(request, result, runtime)
    }

    /// The reply carried a signature that failed validation
    pub fn signature_error(
        request: RequestEnvelope<R>,
        description: impl Into<String>,
        runtime: Duration,
    ) -> Self {
        let result = RpcResult::new(ResultCode::SignatureError, description);
        Self::from_result(request, result, runtime)
    }

    /// Generic server-side failure
    pub fn failed(
        request: RequestEnvelope<R>,
        description: Option<String>,
        runtime: Duration,
    ) -> Self {
        let result = RpcResult {
            code: ResultCode::GenericError,
            description,
            details: None,
        };
        Self::from_result(request, result, runtime)
    }

    /// The transport failed before a protocol-level answer existed
    pub fn transport_fault(
        request: RequestEnvelope<R>,
        status: Option<u16>,
        body: impl Into<String>,
        runtime: Duration,
    ) -> Self {
        let body = body.into();
        let description = match status {
            Some(code) => format!("transport failure (status {code}): {body}"),
            None => format!("transport failure: {body}"),
        };
        let result = RpcResult::new(ResultCode::TransportFault, description);
        Self::from_result(request, result, runtime)
    }

    /// A local fault surfaced while building, sending or parsing
    pub fn exception_occurred(
        request: RequestEnvelope<R>,
        description: impl Into<String>,
        runtime: Duration,
    ) -> Self {
        let result = RpcResult::new(ResultCode::ExceptionOccurred, description);
        Self::from_result(request, result, runtime)
    }

    /// No terminal outcome before the deadline
    pub fn timed_out(request: RequestEnvelope<R>, limit: Duration, runtime: Duration) -> Self {
        let result = RpcResult::new(
            ResultCode::Timeout,
            format!("no response within {}ms", limit.as_millis()),
        );
        Self::from_result(request, result, runtime)
    }

    /// The caller canceled the request before a terminal outcome
    pub fn canceled(request: RequestEnvelope<R>, runtime: Duration) -> Self {
        let result = RpcResult::new(ResultCode::Canceled, "request canceled by caller");
        Self::from_result(request, result, runtime)
    }

    /// An engine-internal invariant failed; distinct from success by design
    pub fn internal_fault(
        request: RequestEnvelope<R>,
        description: impl Into<String>,
        runtime: Duration,
    ) -> Self {
        let result = RpcResult::new(ResultCode::InternalFault, description);
        Self::from_result(request, result, runtime)
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Append a signature over the response payload
    pub fn sign(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }
}

/// Structural equality over request, outcome and payload. Resolution
/// timestamps and measured runtime are transient and do not participate.
impl<R: RequestPayload> PartialEq for ResponseEnvelope<R> {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request
            && self.result == other.result
            && self.payload == other.payload
            && self.signatures == other.signatures
            && self.custom_data == other.custom_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csms_wire::messages::{ResetKind, ResetRequest, ResetStatus};
    use csms_wire::values::CustomData;

    fn reset_envelope() -> RequestEnvelope<ResetRequest> {
        RequestEnvelope::new(
            Destination::node("CS001"),
            ResetRequest::new(ResetKind::Immediate),
        )
    }

    #[test]
    fn test_fingerprint_frozen_and_signature_independent() {
        let mut envelope = reset_envelope();
        let before = envelope.fingerprint();

        envelope.sign(Signature::new("key-1", "sig-bytes"));
        assert_eq!(envelope.fingerprint(), before);
    }

    #[test]
    fn test_fingerprint_ignores_correlation_id() {
        // A retry keeps the fingerprint of the original
        let a = reset_envelope().with_request_id(RequestId::from("r1"));
        let b = reset_envelope().with_request_id(RequestId::from("r2"));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_payload_and_custom_data() {
        let plain = reset_envelope();
        let other_payload = RequestEnvelope::new(
            Destination::node("CS001"),
            ResetRequest::new(ResetKind::OnIdle),
        );
        assert_ne!(plain.fingerprint(), other_payload.fingerprint());

        let extended = reset_envelope().with_custom_data(CustomData::new("com.ek"));
        assert_ne!(plain.fingerprint(), extended.fingerprint());
    }

    #[test]
    fn test_failure_factories_are_total() {
        let runtime = Duration::from_millis(5);

        let cases: Vec<ResponseEnvelope<ResetRequest>> = vec![
            ResponseEnvelope::formation_violation(reset_envelope(), "bad status", runtime),
            ResponseEnvelope::signature_error(reset_envelope(), "", runtime),
            ResponseEnvelope::failed(reset_envelope(), None, runtime),
            ResponseEnvelope::exception_occurred(reset_envelope(), "panicked", runtime),
            ResponseEnvelope::transport_fault(reset_envelope(), Some(500), "Internal error", runtime),
            ResponseEnvelope::timed_out(reset_envelope(), Duration::from_secs(30), runtime),
            ResponseEnvelope::canceled(reset_envelope(), runtime),
            ResponseEnvelope::internal_fault(reset_envelope(), "slot collision", runtime),
        ];

        for response in cases {
            assert!(!response.is_success());
            assert_eq!(response.payload.status, ResetStatus::Rejected);
            assert!(response.payload.status_info.is_some());
        }
    }

    #[test]
    fn test_request_error_preserves_fault_details() {
        use csms_wire::frame::{CallError, CallErrorCode};

        let fault = CallError::new(
            RequestId::from("r1"),
            CallErrorCode::NotImplemented,
            "no such action",
        )
        .with_details(serde_json::json!({"hint": "upgrade firmware"}));

        let response = ResponseEnvelope::request_error(reset_envelope(), &fault, Duration::ZERO);
        assert_eq!(response.result.code, ResultCode::ProtocolError);
        let description = response.result.description.as_deref().unwrap();
        assert!(description.contains("NotImplemented"));
        assert!(description.contains("no such action"));
        assert_eq!(response.result.details.as_ref().unwrap()["hint"], "upgrade firmware");
    }

    #[test]
    fn test_envelope_equality_ignores_signatures() {
        let a = reset_envelope()
            .with_request_id(RequestId::from("r1"))
            .with_timestamp(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let mut b = a.clone();
        b.sign(Signature::new("key-1", "sig"));
        assert_eq!(a, b);
    }
}
