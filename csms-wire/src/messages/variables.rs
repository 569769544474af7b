//! GetVariables operation (central system -> charging station)
//!
//! One request queries any number of component/variable pairs; the response
//! answers each query independently.

use serde::{Deserialize, Serialize};

use super::{RequestPayload, ResponsePayload};
use crate::values::{CustomData, Evse, StatusInfo};

/// Physical or logical component a variable belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse: Option<Evse>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
            evse: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
        }
    }
}

/// One query in a GetVariables request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableData {
    pub component: Component,
    pub variable: Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GetVariableStatus {
    Accepted,
    Rejected,
    UnknownComponent,
    UnknownVariable,
    NotSupportedAttributeType,
}

/// Per-query answer in a GetVariables response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableResult {
    pub attribute_status: GetVariableStatus,
    pub component: Component,
    pub variable: Variable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_status_info: Option<StatusInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVariablesRequest {
    pub get_variable_data: Vec<GetVariableData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl GetVariablesRequest {
    pub fn new(queries: Vec<GetVariableData>) -> Self {
        Self {
            get_variable_data: queries,
            custom_data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVariablesResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub get_variable_result: Vec<GetVariableResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl RequestPayload for GetVariablesRequest {
    const ACTION: &'static str = "GetVariables";
    type Reply = GetVariablesResponse;
}

impl ResponsePayload for GetVariablesResponse {
    // No top-level status in this schema; the rejected form is the empty
    // answer set, with the failure detail on the envelope result.
    fn rejected(_info: StatusInfo) -> Self {
        Self {
            get_variable_result: Vec::new(),
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
        let req = GetVariablesRequest::new(vec![GetVariableData {
            component: Component::new("OCPPCommCtrlr"),
            variable: Variable::new("HeartbeatInterval"),
        }]);

        let v = serde_json::to_value(&req).unwrap();
        let parsed: GetVariablesRequest = serde_json::from_value(v).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn test_per_query_results_kept_independent() {
        let resp: GetVariablesResponse = serde_json::from_value(json!({
            "getVariableResult": [
                {
                    "attributeStatus": "Accepted",
                    "component": {"name": "OCPPCommCtrlr"},
                    "variable": {"name": "HeartbeatInterval"},
                    "attributeValue": "300"
                },
                {
                    "attributeStatus": "UnknownVariable",
                    "component": {"name": "OCPPCommCtrlr"},
                    "variable": {"name": "NoSuchThing"}
                }
            ]
        }))
        .unwrap();

        assert_eq!(resp.get_variable_result.len(), 2);
        assert_eq!(
            resp.get_variable_result[0].attribute_value.as_deref(),
            Some("300")
        );
        assert_eq!(
            resp.get_variable_result[1].attribute_status,
            GetVariableStatus::UnknownVariable
        );
    }

    #[test]
    fn test_empty_result_list_omitted_on_wire() {
        let resp = GetVariablesResponse::rejected(StatusInfo::new("GenericError"));
        assert_eq!(serde_json::to_value(&resp).unwrap(), json!({}));
    }
}
