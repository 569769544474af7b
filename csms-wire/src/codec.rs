//! Payload codec discipline
//!
//! All payloads move through two primitives:
//! - [`try_decode`] reports every malformation as a descriptive error
//!   value; it never panics and never yields a partial object.
//! - [`encode`] produces the JSON object form; optional fields that are
//!   absent or empty are omitted entirely (enforced by the payload types'
//!   serde attributes), never emitted as `null`.
//!
//! [`decode`] is the opt-in panicking variant for input that has already
//! been validated; it is a thin wrapper over [`try_decode`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::ids::{EvseId, TariffId};

/// A payload failed structural validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {type_name} payload: {detail}")]
pub struct DecodeError {
    pub type_name: &'static str,
    pub detail: String,
}

/// A payload could not be serialized (a local fault, not a peer fault)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not serialize {type_name} payload: {detail}")]
pub struct EncodeError {
    pub type_name: &'static str,
    pub detail: String,
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Serialize a payload to its wire object form
pub fn encode<T: Serialize>(payload: &T) -> Result<Value, EncodeError> {
    serde_json::to_value(payload).map_err(|e| EncodeError {
        type_name: short_type_name::<T>(),
        detail: e.to_string(),
    })
}

/// Reconstruct a payload from its wire object form.
///
/// Mandatory-field absence or type mismatch is a hard failure carrying a
/// descriptive message; optional-field absence yields the type's explicit
/// default.
pub fn try_decode<T: DeserializeOwned>(value: &Value) -> Result<T, DecodeError> {
    serde_json::from_value(value.clone()).map_err(|e| DecodeError {
        type_name: short_type_name::<T>(),
        detail: e.to_string(),
    })
}

/// Panicking variant of [`try_decode`] for pre-validated input (tests,
/// fixtures). Library code uses [`try_decode`].
#[track_caller]
pub fn decode<T: DeserializeOwned>(value: &Value) -> T {
    match try_decode(value) {
        Ok(payload) => payload,
        Err(e) => panic!("{}", e),
    }
}

/// Caller-supplied wire transforms, applied after serialization and before
/// deserialization. This is the extension point for overriding the wire
/// representation of a payload without touching the payload type.
#[derive(Default)]
pub struct EncodeHooks {
    post_encode: Vec<Box<dyn Fn(&mut Value) + Send + Sync>>,
    pre_decode: Vec<Box<dyn Fn(&mut Value) + Send + Sync>>,
}

impl EncodeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run after a request payload is serialized, before it hits the wire
    pub fn on_encode(mut self, f: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        self.post_encode.push(Box::new(f));
        self
    }

    /// Run on a raw response payload before it is decoded
    pub fn on_decode(mut self, f: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        self.pre_decode.push(Box::new(f));
        self
    }

    pub fn apply_encode(&self, value: &mut Value) {
        for f in &self.post_encode {
            f(value);
        }
    }

    pub fn apply_decode(&self, value: &mut Value) {
        for f in &self.pre_decode {
            f(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.post_encode.is_empty() && self.pre_decode.is_empty()
    }
}

impl fmt::Debug for EncodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeHooks")
            .field("post_encode", &self.post_encode.len())
            .field("pre_decode", &self.pre_decode.len())
            .finish()
    }
}

/// Tolerant deserializer for maps keyed by dynamic tariff ids.
///
/// Device-side implementations are not guaranteed spec-perfect: an entry
/// whose key or EVSE-id list does not parse is skipped with a warning, and
/// the well-formed remainder is kept.
pub fn lenient_tariff_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<TariffId, Vec<EvseId>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: serde_json::Map<String, Value> = serde::Deserialize::deserialize(deserializer)?;

    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let tariff_id: TariffId = match key.parse() {
            Ok(id) => id,
            Err(e) => {
                warn!(key = %key, error = %e, "skipping tariff map entry with bad key");
                continue;
            }
        };
        match serde_json::from_value::<Vec<EvseId>>(value) {
            Ok(evse_ids) => {
                out.insert(tariff_id, evse_ids);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "skipping tariff map entry with bad EVSE ids");
            }
        }
    }

    Ok(out)
}
