//! Subscriber wire protocol
//!
//! Server → client: `{"type":"room","payload":{..}}`,
//! `{"type":"training","payload":{..}}` and `{"type":"pong"}`.
//! Client → server: `{"type":"ping"}`.

use serde::{Deserialize, Serialize};

use crate::logic::model::{Room, TrainingStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    Room(RoomPayload),
    Training(TrainingPayload),
    Pong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room: Room,
    /// State label reported upstream for the entity
    pub node: Option<String>,
    pub device_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    Started,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPayload {
    pub state: TrainingPhase,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TrainingStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn room(device_id: impl Into<String>, room: Room, node: Option<String>) -> Self {
        Self::Room(RoomPayload {
            room,
            node,
            device_id: device_id.into(),
        })
    }

    pub fn training_started(device_id: impl Into<String>) -> Self {
        Self::Training(TrainingPayload {
            state: TrainingPhase::Started,
            device_id: device_id.into(),
            stats: None,
            error: None,
        })
    }

    pub fn training_finished(device_id: impl Into<String>, stats: TrainingStats) -> Self {
        Self::Training(TrainingPayload {
            state: TrainingPhase::Finished,
            device_id: device_id.into(),
            stats: Some(stats),
            error: None,
        })
    }

    /// `finished` carrying an error instead of stats
    pub fn training_failed(device_id: impl Into<String>, error: impl ToString) -> Self {
        Self::Training(TrainingPayload {
            state: TrainingPhase::Finished,
            device_id: device_id.into(),
            stats: None,
            error: Some(error.to_string()),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_room_message_shape() {
        let msg = ServerMessage::room("ble-1", Room::LivingRoom, Some("living-room".into()));
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "room",
                "payload": { "room": "living room", "node": "living-room", "deviceId": "ble-1" }
            })
        );
    }

    #[test]
    fn test_training_messages_shape() {
        let started = serde_json::to_value(ServerMessage::training_started("ble-1")).unwrap();
        assert_eq!(started, json!({"type": "training", "payload": {"state": "started", "deviceId": "ble-1"}}));

        let stats = TrainingStats {
            accuracy: 1.0,
            precision: 0.5,
            recall: 0.25,
        };
        let finished = serde_json::to_value(ServerMessage::training_finished("ble-1", stats)).unwrap();
        assert_eq!(finished["payload"]["state"], "finished");
        assert_eq!(finished["payload"]["stats"]["recall"], 0.25);
        assert!(finished["payload"].get("error").is_none());

        let failed = serde_json::to_value(ServerMessage::training_failed("ble-1", "no rows")).unwrap();
        assert_eq!(failed["payload"]["error"], "no rows");
        assert!(failed["payload"].get("stats").is_none());
    }

    #[test]
    fn test_pong_and_ping() {
        assert_eq!(ServerMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping);
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
