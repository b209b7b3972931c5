//! Room labels and their fixed numeric encoding

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::canonicalize;

/// The two rooms the classifier separates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Room {
    #[serde(rename = "living room")]
    LivingRoom,
    #[serde(rename = "bedroom")]
    Bedroom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown room label '{0}'")]
pub struct RoomParseError(pub String);

impl Room {
    pub const ALL: [Room; 2] = [Room::LivingRoom, Room::Bedroom];

    /// Number of classes
    pub const COUNT: usize = Self::ALL.len();

    /// Positive class for precision / recall
    pub const POSITIVE: Room = Room::Bedroom;

    pub fn as_str(&self) -> &'static str {
        match self {
            Room::LivingRoom => "living room",
            Room::Bedroom => "bedroom",
        }
    }

    /// Class index: living room = 0, bedroom = 1
    pub fn index(self) -> usize {
        match self {
            Room::LivingRoom => 0,
            Room::Bedroom => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Room> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Room {
    type Err = RoomParseError;

    /// Accepts any casing / spacing that canonicalizes to a known label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonicalize(s).as_str() {
            "living-room" => Ok(Room::LivingRoom),
            "bedroom" => Ok(Room::Bedroom),
            _ => Err(RoomParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_round_trip() {
        for room in Room::ALL {
            assert_eq!(Room::from_index(room.index()), Some(room));
        }
        assert_eq!(Room::from_index(2), None);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("living room".parse::<Room>(), Ok(Room::LivingRoom));
        assert_eq!("Living Room".parse::<Room>(), Ok(Room::LivingRoom));
        assert_eq!("BEDROOM".parse::<Room>(), Ok(Room::Bedroom));
        assert!("kitchen".parse::<Room>().is_err());
    }

    #[test]
    fn test_serde_uses_display_labels() {
        assert_eq!(serde_json::to_string(&Room::LivingRoom).unwrap(), "\"living room\"");
        let room: Room = serde_json::from_str("\"bedroom\"").unwrap();
        assert_eq!(room, Room::Bedroom);
    }
}
