//! ChangeAvailability operation (central system -> charging station)

use serde::{Deserialize, Serialize};

use super::{RequestPayload, ResponsePayload};
use crate::values::{CustomData, Evse, StatusInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalStatus {
    Operative,
    Inoperative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    pub operational_status: OperationalStatus,
    /// Narrow to one EVSE or connector; absent means the whole station
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ChangeAvailabilityRequest {
    pub fn new(operational_status: OperationalStatus) -> Self {
        Self {
            operational_status,
            evse: None,
            custom_data: None,
        }
    }

    pub fn with_evse(mut self, evse: Evse) -> Self {
        self.evse = Some(evse);
        self
    }
}

/// `Scheduled` means the change is accepted but deferred until the running
/// transaction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAvailabilityStatus {
    Accepted,
    Rejected,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityResponse {
    pub status: ChangeAvailabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl ChangeAvailabilityResponse {
    pub fn new(status: ChangeAvailabilityStatus) -> Self {
        Self {
            status,
            status_info: None,
            custom_data: None,
        }
    }
}

impl RequestPayload for ChangeAvailabilityRequest {
    const ACTION: &'static str = "ChangeAvailability";
    type Reply = ChangeAvailabilityResponse;
}

impl ResponsePayload for ChangeAvailabilityResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: ChangeAvailabilityStatus::Rejected,
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
    fn test_request_roundtrip() {
        let req = ChangeAvailabilityRequest::new(OperationalStatus::Inoperative)
            .with_evse(Evse::new(1u32).with_connector(2));

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "operationalStatus": "Inoperative",
                "evse": {"id": 1, "connectorId": 2}
            })
        );

        let parsed: ChangeAvailabilityRequest = serde_json::from_value(v).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn test_scheduled_status_parses() {
        let resp: ChangeAvailabilityResponse =
            serde_json::from_value(json!({"status": "Scheduled"})).unwrap();
        assert_eq!(resp.status, ChangeAvailabilityStatus::Scheduled);
    }
}
