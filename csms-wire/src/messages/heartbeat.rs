//! Heartbeat operation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RequestPayload, ResponsePayload};
use crate::values::{CustomData, StatusInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl HeartbeatRequest {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl RequestPayload for HeartbeatRequest {
    const ACTION: &'static str = "Heartbeat";
    type Reply = HeartbeatResponse;
}

impl ResponsePayload for HeartbeatResponse {
    // Heartbeat has no status field; the rejected form is just a fresh
    // timestamp, with the failure detail on the envelope result.
    fn rejected(_info: StatusInfo) -> Self {
        Self {
            current_time: Utc::now(),
            custom_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_request_serializes_to_empty_object() {
        let v = serde_json::to_value(HeartbeatRequest::new()).unwrap();
        assert_eq!(v, json!({}));
    }

    #[test]
    fn test_response_parses_timestamp() {
        let resp: HeartbeatResponse =
            serde_json::from_value(json!({"currentTime": "2026-01-20T12:00:00Z"})).unwrap();
        assert_eq!(resp.current_time.timestamp(), 1768910400);
    }
}
