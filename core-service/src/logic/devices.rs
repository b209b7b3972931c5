//! Device directory
//!
//! Trackable devices keyed by id. Registered from the entity directory,
//! mutated by room assignment and gathering requests, never removed.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::logic::model::Room;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub room: Option<Room>,
    pub is_gathering: bool,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            room: None,
            is_gathering: false,
        }
    }

    /// Gathering with a user-assigned room: the label for a new training row
    pub fn gathering_label(&self) -> Option<Room> {
        if self.is_gathering {
            self.room
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<BTreeMap<String, Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids not seen before; known devices keep their state.
    /// Returns how many were added.
    pub fn register<I, S>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut devices = self.devices.write();
        let mut added = 0;
        for id in ids {
            let id = id.into();
            if !devices.contains_key(&id) {
                devices.insert(id.clone(), Device::new(id));
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, id: &str) -> Option<Device> {
        self.devices.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.read().contains_key(id)
    }

    /// Apply `f` to a known device; `None` if the id is unknown
    pub fn update<T>(&self, id: &str, f: impl FnOnce(&mut Device) -> T) -> Option<T> {
        self.devices.write().get_mut(id).map(f)
    }

    pub fn set_room(&self, id: &str, room: Room) -> Option<Device> {
        self.update(id, |device| {
            device.room = Some(room);
            device.clone()
        })
    }

    pub fn set_gathering(&self, id: &str, gathering: bool) -> Option<Device> {
        self.update(id, |device| {
            device.is_gathering = gathering;
            device.clone()
        })
    }

    pub fn list(&self) -> Vec<Device> {
        self.devices.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_existing_state() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.register(["ble-1", "ble-2"]), 2);
        registry.set_room("ble-1", Room::Bedroom).unwrap();
        registry.set_gathering("ble-1", true).unwrap();

        assert_eq!(registry.register(["ble-1", "ble-3"]), 1);

        let device = registry.get("ble-1").unwrap();
        assert_eq!(device.room, Some(Room::Bedroom));
        assert!(device.is_gathering);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_device() {
        let registry = DeviceRegistry::new();
        assert!(registry.set_room("ghost", Room::Bedroom).is_none());
        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn test_gathering_label_needs_room() {
        let mut device = Device::new("ble-1");
        device.is_gathering = true;
        assert_eq!(device.gathering_label(), None);

        device.room = Some(Room::LivingRoom);
        assert_eq!(device.gathering_label(), Some(Room::LivingRoom));

        device.is_gathering = false;
        assert_eq!(device.gathering_label(), None);
    }
}
