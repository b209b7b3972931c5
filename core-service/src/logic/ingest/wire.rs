//! Upstream wire types
//!
//! Outbound: `{"event":"subscribeEvents","data":{"type":"entityUpdates"}}`.
//! Inbound: JSON objects, of interest only when they carry an `entity`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum UpstreamRequest {
    SubscribeEvents {
        #[serde(rename = "type")]
        kind: EventKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    EntityUpdates,
}

impl UpstreamRequest {
    pub fn subscribe_entity_updates() -> Self {
        Self::SubscribeEvents {
            kind: EventKind::EntityUpdates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredValue {
    #[serde(default)]
    pub rssi: Option<f64>,
    #[serde(default)]
    pub measured_power: Option<f64>,
}

/// One entity update. Consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementEvent {
    pub id: String,
    /// Upstream's own room guess; forwarded, never used as a label
    #[serde(default)]
    pub state: Option<Value>,
    /// Anchor display name → reading
    #[serde(default)]
    pub measured_values: HashMap<String, MeasuredValue>,
}

impl MeasurementEvent {
    /// `(anchor display name, rssi)` for readings that carry an rssi
    pub fn readings(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.measured_values
            .iter()
            .filter_map(|(name, value)| value.rssi.map(|rssi| (name.as_str(), rssi)))
    }

    pub fn state_label(&self) -> Option<String> {
        match &self.state {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamMessage {
    EntityUpdate(MeasurementEvent),
    /// Acknowledgements and anything else without an `entity`
    Other,
}

impl UpstreamMessage {
    /// Fails only when the text is not JSON or `entity` is malformed
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;
        match value.get_mut("entity").map(Value::take) {
            Some(Value::Null) | None => Ok(Self::Other),
            Some(entity) => Ok(Self::EntityUpdate(serde_json::from_value(entity)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_request_shape() {
        let value = serde_json::to_value(UpstreamRequest::subscribe_entity_updates()).unwrap();
        assert_eq!(value, json!({"event": "subscribeEvents", "data": {"type": "entityUpdates"}}));
    }

    #[test]
    fn test_parse_entity_update() {
        let text = r#"{
            "entity": {
                "id": "ble-1",
                "state": "bedroom",
                "measuredValues": {
                    "Bedroom": {"rssi": -75.2, "measuredPower": -59},
                    "Living Room": {"measuredPower": -59}
                }
            }
        }"#;

        let UpstreamMessage::EntityUpdate(event) = UpstreamMessage::parse(text).unwrap() else {
            panic!("expected entity update");
        };
        assert_eq!(event.id, "ble-1");
        assert_eq!(event.state_label().as_deref(), Some("bedroom"));
        let readings: Vec<_> = event.readings().collect();
        assert_eq!(readings, vec![("Bedroom", -75.2)]);
    }

    #[test]
    fn test_parse_other_messages() {
        assert_eq!(UpstreamMessage::parse(r#"{"ok": true}"#).unwrap(), UpstreamMessage::Other);
        assert_eq!(UpstreamMessage::parse(r#"{"entity": null}"#).unwrap(), UpstreamMessage::Other);
        assert!(UpstreamMessage::parse(r#"{"entity": {"state": "x"}}"#).is_err());
        assert!(UpstreamMessage::parse("not json").is_err());
    }
}
