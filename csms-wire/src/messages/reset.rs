//! Reset operation (central system -> charging station)

use serde::{Deserialize, Serialize};

use super::{RequestPayload, ResponsePayload};
use crate::ids::EvseId;
use crate::values::{CustomData, StatusInfo};

/// How the station should perform the reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetKind {
    Immediate,
    OnIdle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(rename = "type")]
    pub kind: ResetKind,
    /// Restrict the reset to one EVSE; absent means the whole station
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<EvseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ResetRequest {
    pub fn new(kind: ResetKind) -> Self {
        Self {
            kind,
            evse_id: None,
            custom_data: None,
        }
    }

    pub fn with_evse(mut self, evse_id: impl Into<EvseId>) -> Self {
        self.evse_id = Some(evse_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetStatus {
    Accepted,
    Rejected,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub status: ResetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ResetResponse {
    pub fn new(status: ResetStatus) -> Self {
        Self {
            status,
            status_info: None,
            custom_data: None,
        }
    }
}

impl RequestPayload for ResetRequest {
    const ACTION: &'static str = "Reset";
    type Reply = ResetResponse;
}

impl ResponsePayload for ResetResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: ResetStatus::Rejected,
            status_info: Some(info),
            custom_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let req = ResetRequest::new(ResetKind::Immediate).with_evse(2u32);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"type": "Immediate", "evseId": 2})
        );
    }

    #[test]
    fn test_minimal_response_has_only_status_key() {
        let resp = ResetResponse::new(ResetStatus::Accepted);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v, json!({"status": "Accepted"}));
    }

    #[test]
    fn test_unknown_status_string_is_an_error() {
        let result: Result<ResetResponse, _> =
            serde_json::from_value(json!({"status": "Accpted"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejected_factory_carries_reason() {
        let resp = ResetResponse::rejected(StatusInfo::new("Timeout"));
        assert_eq!(resp.status, ResetStatus::Rejected);
        assert_eq!(resp.status_info.unwrap().reason_code, "Timeout");
    }
}
