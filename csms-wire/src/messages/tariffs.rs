//! Default-charging-tariff operations (E2E tariff exchange extension)
//!
//! Multi-target operations: one request may address several EVSEs, and each
//! EVSE answers for itself inside the shared response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{RequestPayload, ResponsePayload};
use crate::codec::lenient_tariff_map;
use crate::ids::{EvseId, TariffId};
use crate::values::{CustomData, EVSEStatusInfo, GenericStatus, StatusInfo};

/// A tariff definition as exchanged with the station. Pricing semantics
/// live with the host; this type only moves the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    pub tariff_id: TariffId,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_kwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl Tariff {
    pub fn new(tariff_id: impl Into<TariffId>, currency: impl Into<String>) -> Self {
        Self {
            tariff_id: tariff_id.into(),
            currency: currency.into(),
            description: None,
            price_kwh: None,
            custom_data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price_kwh(mut self, price: f64) -> Self {
        self.price_kwh = Some(price);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TariffStatus {
    Accepted,
    Rejected,
    NotSupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDefaultE2EChargingTariffRequest {
    pub tariff: Tariff,
    /// EVSEs the tariff applies to; empty means every EVSE and is omitted
    /// from the wire form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evse_ids: Vec<EvseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl SetDefaultE2EChargingTariffRequest {
    pub fn new(tariff: Tariff) -> Self {
        Self {
            tariff,
            evse_ids: Vec::new(),
            custom_data: None,
        }
    }

    pub fn with_evse_ids(mut self, evse_ids: Vec<EvseId>) -> Self {
        self.evse_ids = evse_ids;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDefaultE2EChargingTariffResponse {
    pub status: TariffStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    /// Per-EVSE outcomes; an EVSE may reject a tariff its siblings accept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evse_status_infos: Vec<EVSEStatusInfo<TariffStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl SetDefaultE2EChargingTariffResponse {
    pub fn new(status: TariffStatus) -> Self {
        Self {
            status,
            status_info: None,
            evse_status_infos: Vec::new(),
            custom_data: None,
        }
    }
}

impl RequestPayload for SetDefaultE2EChargingTariffRequest {
    const ACTION: &'static str = "SetDefaultE2EChargingTariff";
    type Reply = SetDefaultE2EChargingTariffResponse;
}

impl ResponsePayload for SetDefaultE2EChargingTariffResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: TariffStatus::Rejected,
            status_info: Some(info),
            evse_status_infos: Vec::new(),
            custom_data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDefaultChargingTariffRequest {
    /// Restrict the report to these EVSEs; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evse_ids: Vec<EvseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl GetDefaultChargingTariffRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evse_ids(mut self, evse_ids: Vec<EvseId>) -> Self {
        self.evse_ids = evse_ids;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDefaultChargingTariffResponse {
    pub status: GenericStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    /// Which tariff is the default on which EVSEs, keyed by tariff id.
    /// Parsed leniently: a malformed entry is skipped, not fatal.
    #[serde(
        default,
        deserialize_with = "lenient_tariff_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub charging_tariff_map: BTreeMap<TariffId, Vec<EvseId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl RequestPayload for GetDefaultChargingTariffRequest {
    const ACTION: &'static str = "GetDefaultChargingTariff";
    type Reply = GetDefaultChargingTariffResponse;
}

impl ResponsePayload for GetDefaultChargingTariffResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: GenericStatus::Rejected,
            status_info: Some(info),
            charging_tariff_map: BTreeMap::new(),
            custom_data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDefaultChargingTariffRequest {
    /// Remove only this tariff; absent means remove whatever default is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff_id: Option<TariffId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evse_ids: Vec<EvseId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl RemoveDefaultChargingTariffRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tariff_id(mut self, tariff_id: impl Into<TariffId>) -> Self {
        self.tariff_id = Some(tariff_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveDefaultChargingTariffStatus {
    Accepted,
    Rejected,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDefaultChargingTariffResponse {
    pub status: RemoveDefaultChargingTariffStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evse_status_infos: Vec<EVSEStatusInfo<RemoveDefaultChargingTariffStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<CustomData>,
}

impl RequestPayload for RemoveDefaultChargingTariffRequest {
    const ACTION: &'static str = "RemoveDefaultChargingTariff";
    type Reply = RemoveDefaultChargingTariffResponse;
}

impl ResponsePayload for RemoveDefaultChargingTariffResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: RemoveDefaultChargingTariffStatus::Rejected,
            status_info: Some(info),
            evse_status_infos: Vec::new(),
            custom_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ek_tariff() -> Tariff {
        Tariff::new("T-EK-1", "EUR").with_price_kwh(0.31)
    }

    #[test]
    fn test_empty_evse_ids_omitted_from_wire() {
        let req = SetDefaultE2EChargingTariffRequest::new(ek_tariff());
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("evseIds").is_none());
        assert_eq!(v["tariff"]["tariffId"], "T-EK-1");
    }

    #[test]
    fn test_populated_evse_ids_on_wire() {
        let req = SetDefaultE2EChargingTariffRequest::new(ek_tariff())
            .with_evse_ids(vec![EvseId::new(1), EvseId::new(2)]);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["evseIds"], json!([1, 2]));
    }

    #[test]
    fn test_remove_response_keeps_per_evse_statuses() {
        let resp: RemoveDefaultChargingTariffResponse = serde_json::from_value(json!({
            "status": "Accepted",
            "evseStatusInfos": [
                {"evseId": 1, "status": "Accepted"},
                {"evseId": 2, "status": "Rejected", "statusInfo": {"reasonCode": "InUse"}}
            ]
        }))
        .unwrap();

        assert_eq!(resp.evse_status_infos.len(), 2);
        assert_eq!(
            resp.evse_status_infos[0].status,
            RemoveDefaultChargingTariffStatus::Accepted
        );
        assert_eq!(
            resp.evse_status_infos[1].status,
            RemoveDefaultChargingTariffStatus::Rejected
        );
        assert_eq!(
            resp.evse_status_infos[1]
                .status_info
                .as_ref()
                .unwrap()
                .reason_code,
            "InUse"
        );
    }

    #[test]
    fn test_tariff_map_lenient_parse() {
        let resp: GetDefaultChargingTariffResponse = serde_json::from_value(json!({
            "status": "Accepted",
            "chargingTariffMap": {
                "T-EK-1": [1, 2],
                "T-EK-2": ["bogus"]
            }
        }))
        .unwrap();

        assert_eq!(resp.charging_tariff_map.len(), 1);
        assert_eq!(
            resp.charging_tariff_map[&TariffId::from("T-EK-1")],
            vec![EvseId::new(1), EvseId::new(2)]
        );
    }

    #[test]
    fn test_empty_tariff_map_omitted_from_wire() {
        let resp = GetDefaultChargingTariffResponse::rejected(StatusInfo::new("GenericError"));
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v.get("chargingTariffMap").is_none());
    }
}
