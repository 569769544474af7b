//! OCPP-J array framing
//!
//! Every message on the wire is a JSON array tagged by its first element:
//! - CALL:       `[2, "<id>", "<Action>", <payload>]`
//! - CALLRESULT: `[3, "<id>", <payload>]`
//! - CALLERROR:  `[4, "<id>", "<code>", "<description>", <details>]`
//!
//! The id is the correlation key; the peer echoes it back, and the engine
//! matches responses by id, never by arrival order.

use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ids::RequestId;

/// Message-type tags from the RPC framework chapter of the protocol
const TAG_CALL: u64 = 2;
const TAG_CALL_RESULT: u64 = 3;
const TAG_CALL_ERROR: u64 = 4;

/// Errors in frame encoding/decoding
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame must be a JSON array")]
    NotAnArray,

    #[error("unknown message type tag: {0}")]
    UnknownTag(Value),

    #[error("{kind} frame must have {expected} elements, got {actual}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} frame element {index} must be a {expected}")]
    BadElement {
        kind: &'static str,
        index: usize,
        expected: &'static str,
    },
}

/// RPC framework error codes a peer may report in a CALLERROR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallErrorCode {
    FormatViolation,
    GenericError,
    InternalError,
    MessageTypeNotSupported,
    NotImplemented,
    NotSupported,
    OccurrenceConstraintViolation,
    PropertyConstraintViolation,
    ProtocolError,
    RpcFrameworkError,
    SecurityError,
    TypeConstraintViolation,
}

impl CallErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            CallErrorCode::FormatViolation => "FormatViolation",
            CallErrorCode::GenericError => "GenericError",
            CallErrorCode::InternalError => "InternalError",
            CallErrorCode::MessageTypeNotSupported => "MessageTypeNotSupported",
            CallErrorCode::NotImplemented => "NotImplemented",
            CallErrorCode::NotSupported => "NotSupported",
            CallErrorCode::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            CallErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            CallErrorCode::ProtocolError => "ProtocolError",
            CallErrorCode::RpcFrameworkError => "RpcFrameworkError",
            CallErrorCode::SecurityError => "SecurityError",
            CallErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
        }
    }

    /// Parse an inbound code string. Unknown codes degrade to
    /// `GenericError` so an error frame is never dropped because the peer
    /// speaks a newer revision of the error vocabulary.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(CallErrorCode::GenericError)
    }
}

impl fmt::Display for CallErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FormatViolation" => Ok(CallErrorCode::FormatViolation),
            "GenericError" => Ok(CallErrorCode::GenericError),
            "InternalError" => Ok(CallErrorCode::InternalError),
            "MessageTypeNotSupported" => Ok(CallErrorCode::MessageTypeNotSupported),
            "NotImplemented" => Ok(CallErrorCode::NotImplemented),
            "NotSupported" => Ok(CallErrorCode::NotSupported),
            "OccurrenceConstraintViolation" => Ok(CallErrorCode::OccurrenceConstraintViolation),
            "PropertyConstraintViolation" => Ok(CallErrorCode::PropertyConstraintViolation),
            "ProtocolError" => Ok(CallErrorCode::ProtocolError),
            "RpcFrameworkError" => Ok(CallErrorCode::RpcFrameworkError),
            "SecurityError" => Ok(CallErrorCode::SecurityError),
            "TypeConstraintViolation" => Ok(CallErrorCode::TypeConstraintViolation),
            _ => Err(()),
        }
    }
}

/// Outgoing request frame
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: RequestId,
    pub action: String,
    pub payload: Value,
}

impl Call {
    pub fn new(id: RequestId, action: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            action: action.into(),
            payload,
        }
    }
}

/// Successful response frame
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub id: RequestId,
    pub payload: Value,
}

impl CallResult {
    pub fn new(id: RequestId, payload: Value) -> Self {
        Self { id, payload }
    }
}

/// Error response frame: the peer actively rejected the request
#[derive(Debug, Clone, PartialEq)]
pub struct CallError {
    pub id: RequestId,
    pub code: CallErrorCode,
    pub description: String,
    pub details: Value,
}

impl CallError {
    pub fn new(id: RequestId, code: CallErrorCode, description: impl Into<String>) -> Self {
        Self {
            id,
            code,
            description: description.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Any parsed wire frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Call(Call),
    Result(CallResult),
    Error(CallError),
}

impl Frame {
    /// Parse a frame from raw bytes.
    ///
    /// Structural violations (wrong tag, wrong arity, wrong element types)
    /// are hard errors; only the error-code string inside a CALLERROR is
    /// parsed leniently.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        let items: Vec<Value> = serde_json::from_slice(bytes)?;

        let tag = items
            .first()
            .ok_or(FrameError::NotAnArray)?
            .as_u64()
            .ok_or_else(|| FrameError::UnknownTag(items[0].clone()))?;

        match tag {
            TAG_CALL => {
                expect_len("CALL", &items, 4)?;
                Ok(Frame::Call(Call {
                    id: parse_id("CALL", &items)?,
                    action: expect_str("CALL", &items, 2)?.to_string(),
                    payload: items[3].clone(),
                }))
            }
            TAG_CALL_RESULT => {
                expect_len("CALLRESULT", &items, 3)?;
                Ok(Frame::Result(CallResult {
                    id: parse_id("CALLRESULT", &items)?,
                    payload: items[2].clone(),
                }))
            }
            TAG_CALL_ERROR => {
                expect_len("CALLERROR", &items, 5)?;
                Ok(Frame::Error(CallError {
                    id: parse_id("CALLERROR", &items)?,
                    code: CallErrorCode::parse_lenient(expect_str("CALLERROR", &items, 2)?),
                    description: expect_str("CALLERROR", &items, 3)?.to_string(),
                    details: items[4].clone(),
                }))
            }
            other => Err(FrameError::UnknownTag(json!(other))),
        }
    }

    /// Serialize to the wire array form
    pub fn to_bytes(&self) -> Result<Vec<u8>, FrameError> {
        let array = match self {
            Frame::Call(c) => json!([TAG_CALL, c.id, c.action, c.payload]),
            Frame::Result(r) => json!([TAG_CALL_RESULT, r.id, r.payload]),
            Frame::Error(e) => {
                json!([TAG_CALL_ERROR, e.id, e.code.as_str(), e.description, e.details])
            }
        };
        Ok(serde_json::to_vec(&array)?)
    }

    /// Correlation id of the frame
    pub fn id(&self) -> &RequestId {
        match self {
            Frame::Call(c) => &c.id,
            Frame::Result(r) => &r.id,
            Frame::Error(e) => &e.id,
        }
    }
}

impl From<Call> for Frame {
    fn from(c: Call) -> Self {
        Frame::Call(c)
    }
}

impl From<CallResult> for Frame {
    fn from(r: CallResult) -> Self {
        Frame::Result(r)
    }
}

impl From<CallError> for Frame {
    fn from(e: CallError) -> Self {
        Frame::Error(e)
    }
}

fn expect_len(kind: &'static str, items: &[Value], expected: usize) -> Result<(), FrameError> {
    if items.len() != expected {
        return Err(FrameError::WrongLength {
            kind,
            expected,
            actual: items.len(),
        });
    }
    Ok(())
}

fn expect_str<'a>(
    kind: &'static str,
    items: &'a [Value],
    index: usize,
) -> Result<&'a str, FrameError> {
    items[index].as_str().ok_or(FrameError::BadElement {
        kind,
        index,
        expected: "string",
    })
}

fn parse_id(kind: &'static str, items: &[Value]) -> Result<RequestId, FrameError> {
    expect_str(kind, items, 1)?
        .parse()
        .map_err(|_| FrameError::BadElement {
            kind,
            index: 1,
            expected: "non-empty string",
        })
}
