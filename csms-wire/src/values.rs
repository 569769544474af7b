//! Common value objects shared by every message type

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::EvseId;

/// Generic accept/reject outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GenericStatus {
    Accepted,
    Rejected,
}

/// Structured elaboration accompanying a status enum in a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub reason_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl StatusInfo {
    pub fn new(reason_code: impl Into<String>) -> Self {
        Self {
            reason_code: reason_code.into(),
            additional_info: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.additional_info = Some(detail.into());
        self
    }
}

/// Detached cryptographic signature over a message payload.
///
/// Carried verbatim; producing and verifying the signature value is the
/// host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub key_id: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_method: Option<String>,
}

impl Signature {
    pub fn new(key_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            value: value.into(),
            signing_method: None,
            encoding_method: None,
        }
    }

    pub fn with_signing_method(mut self, method: impl Into<String>) -> Self {
        self.signing_method = Some(method.into());
        self
    }

    pub fn with_encoding_method(mut self, method: impl Into<String>) -> Self {
        self.encoding_method = Some(method.into());
        self
    }
}

/// Signing material attached to an outgoing request.
///
/// The private part never goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningKey {
    pub key_id: String,
    pub algorithm: String,
    pub public_key: String,
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl SigningKey {
    pub fn new(
        key_id: impl Into<String>,
        algorithm: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm: algorithm.into(),
            public_key: public_key.into(),
            private_key: None,
        }
    }
}

/// Open, schema-unvalidated extension object.
///
/// Everything except the mandatory `vendorId` is preserved verbatim through
/// serialize/parse so vendors can ship fields this crate has never heard of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    pub vendor_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CustomData {
    pub fn new(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Per-EVSE outcome within a multi-target operation. Each EVSE may
/// independently succeed or fail inside one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EVSEStatusInfo<S> {
    pub evse_id: EvseId,
    pub status: S,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
}

impl<S> EVSEStatusInfo<S> {
    pub fn new(evse_id: impl Into<EvseId>, status: S) -> Self {
        Self {
            evse_id: evse_id.into(),
            status,
            status_info: None,
        }
    }

    pub fn with_status_info(mut self, info: StatusInfo) -> Self {
        self.status_info = Some(info);
        self
    }
}

/// EVSE selector used where a request narrows its scope to one EVSE or one
/// connector of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evse {
    pub id: EvseId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<u32>,
}

impl Evse {
    pub fn new(id: impl Into<EvseId>) -> Self {
        Self {
            id: id.into(),
            connector_id: None,
        }
    }

    pub fn with_connector(mut self, connector_id: u32) -> Self {
        self.connector_id = Some(connector_id);
        self
    }
}
