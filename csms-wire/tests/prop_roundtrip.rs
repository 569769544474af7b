//! Property tests for the payload codec
//!
//! The round-trip law: for any payload value satisfying its mandatory-field
//! invariants, `try_decode(encode(x)) == x`, including the empty-optional
//! cases where keys are omitted from the wire form entirely.

use proptest::prelude::*;

use csms_wire::codec::{encode, try_decode};
use csms_wire::ids::EvseId;
use csms_wire::messages::*;
use csms_wire::values::{CustomData, Evse, StatusInfo};

// ============================================================================
// Strategies
// ============================================================================

fn reset_kind() -> impl Strategy<Value = ResetKind> {
    prop_oneof![Just(ResetKind::Immediate), Just(ResetKind::OnIdle)]
}

fn reset_status() -> impl Strategy<Value = ResetStatus> {
    prop_oneof![
        Just(ResetStatus::Accepted),
        Just(ResetStatus::Rejected),
        Just(ResetStatus::Scheduled),
    ]
}

fn tariff_status() -> impl Strategy<Value = TariffStatus> {
    prop_oneof![
        Just(TariffStatus::Accepted),
        Just(TariffStatus::Rejected),
        Just(TariffStatus::NotSupported),
    ]
}

fn evse_id() -> impl Strategy<Value = EvseId> {
    (0u32..64).prop_map(EvseId::new)
}

fn status_info() -> impl Strategy<Value = StatusInfo> {
    ("[A-Za-z]{1,16}", proptest::option::of("[ -~]{0,32}")).prop_map(|(reason, detail)| {
        let info = StatusInfo::new(reason);
        match detail {
            Some(d) => info.with_detail(d),
            None => info,
        }
    })
}

fn custom_data() -> impl Strategy<Value = CustomData> {
    ("[a-z]{1,12}\\.[a-z]{1,12}", proptest::option::of(0i64..1000)).prop_map(|(vendor, tag)| {
        let data = CustomData::new(vendor);
        match tag {
            Some(t) => data.with("tag", serde_json::json!(t)),
            None => data,
        }
    })
}

fn reset_request() -> impl Strategy<Value = ResetRequest> {
    (
        reset_kind(),
        proptest::option::of(evse_id()),
        proptest::option::of(custom_data()),
    )
        .prop_map(|(kind, evse_id, custom)| {
            let mut req = ResetRequest::new(kind);
            req.evse_id = evse_id;
            req.custom_data = custom;
            req
        })
}

fn reset_response() -> impl Strategy<Value = ResetResponse> {
    (reset_status(), proptest::option::of(status_info())).prop_map(|(status, info)| {
        let mut resp = ResetResponse::new(status);
        resp.status_info = info;
        resp
    })
}

fn tariff() -> impl Strategy<Value = Tariff> {
    (
        "[A-Z]-[0-9]{1,4}",
        prop_oneof![Just("EUR"), Just("RSD"), Just("CHF")],
        proptest::option::of(0u32..10_000),
    )
        .prop_map(|(id, currency, price)| {
            let t = Tariff::new(id.as_str(), currency);
            match price {
                // Quarter-cent steps keep the price exactly representable,
                // so equality after the round trip is exact.
                Some(p) => t.with_price_kwh(f64::from(p) / 4.0),
                None => t,
            }
        })
}

fn set_tariff_request() -> impl Strategy<Value = SetDefaultE2EChargingTariffRequest> {
    (tariff(), proptest::collection::vec(evse_id(), 0..5)).prop_map(|(tariff, evse_ids)| {
        SetDefaultE2EChargingTariffRequest::new(tariff).with_evse_ids(evse_ids)
    })
}

fn set_tariff_response() -> impl Strategy<Value = SetDefaultE2EChargingTariffResponse> {
    (
        tariff_status(),
        proptest::collection::vec((evse_id(), tariff_status()), 0..5),
    )
        .prop_map(|(status, entries)| {
            let mut resp = SetDefaultE2EChargingTariffResponse::new(status);
            resp.evse_status_infos = entries
                .into_iter()
                .map(|(id, st)| csms_wire::values::EVSEStatusInfo::new(id, st))
                .collect();
            resp
        })
}

fn change_availability_request() -> impl Strategy<Value = ChangeAvailabilityRequest> {
    (
        prop_oneof![
            Just(OperationalStatus::Operative),
            Just(OperationalStatus::Inoperative)
        ],
        proptest::option::of((evse_id(), proptest::option::of(1u32..4))),
    )
        .prop_map(|(status, evse)| {
            let mut req = ChangeAvailabilityRequest::new(status);
            req.evse = evse.map(|(id, connector)| Evse {
                id,
                connector_id: connector,
            });
            req
        })
}

// ============================================================================
// Round-trip law
// ============================================================================

proptest! {
    #[test]
    fn reset_request_roundtrip(req in reset_request()) {
        let wire = encode(&req).unwrap();
        let back: ResetRequest = try_decode(&wire).unwrap();
        prop_assert_eq!(back, req);
    }

    #[test]
    fn reset_response_roundtrip(resp in reset_response()) {
        let wire = encode(&resp).unwrap();
        let back: ResetResponse = try_decode(&wire).unwrap();
        prop_assert_eq!(back, resp);
    }

    #[test]
    fn change_availability_roundtrip(req in change_availability_request()) {
        let wire = encode(&req).unwrap();
        let back: ChangeAvailabilityRequest = try_decode(&wire).unwrap();
        prop_assert_eq!(back, req);
    }

    #[test]
    fn set_tariff_request_roundtrip(req in set_tariff_request()) {
        let wire = encode(&req).unwrap();
        let back: SetDefaultE2EChargingTariffRequest = try_decode(&wire).unwrap();
        prop_assert_eq!(back, req);
    }

    #[test]
    fn set_tariff_response_roundtrip(resp in set_tariff_response()) {
        let wire = encode(&resp).unwrap();
        let back: SetDefaultE2EChargingTariffResponse = try_decode(&wire).unwrap();
        prop_assert_eq!(back, resp);
    }

    /// Absent optionals must be absent keys, not nulls
    #[test]
    fn optional_keys_never_null(req in reset_request()) {
        let wire = encode(&req).unwrap();
        let object = wire.as_object().unwrap();
        prop_assert!(!object.values().any(|v| v.is_null()));
    }

    /// Frames survive the byte-level round trip too
    #[test]
    fn frame_roundtrip(req in reset_request(), id in "[a-z0-9]{1,24}") {
        use csms_wire::frame::{Call, Frame};
        use csms_wire::ids::RequestId;

        let call = Call::new(RequestId::from(id.as_str()), "Reset", encode(&req).unwrap());
        let bytes = Frame::from(call.clone()).to_bytes().unwrap();
        prop_assert_eq!(Frame::parse(&bytes).unwrap(), Frame::Call(call));
    }
}
