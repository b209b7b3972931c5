//! Anchor Layout - Feature column definition
//!
//! The anchor set is fixed once at startup from the entity directory and is
//! the single source of truth for feature-vector column order. Every vector,
//! training row and model artifact carries (or is checked against) the CRC32
//! of this layout.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEVICE_ID_COLUMN, ROOM_COLUMN};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A member of the anchor set has no reading in the measurement
    #[error("missing reading for anchor '{0}'")]
    MissingAnchorReading(String),

    /// Two display names collapse onto the same canonical key
    #[error("duplicate anchor after canonicalization: '{0}'")]
    DuplicateAnchor(String),
}

// ============================================================================
// CANONICALIZATION
// ============================================================================

/// Normalize an anchor display name to its column key.
///
/// `"Living Room 2"` becomes `"living-room-2"`.
pub fn canonicalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// ANCHOR SET
// ============================================================================

/// Ordered, duplicate-free list of canonical anchor identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSet {
    anchors: Vec<String>,
}

impl AnchorSet {
    /// Build from display names; keys are canonicalized and sorted ascending.
    pub fn from_names<I, S>(names: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut anchors: Vec<String> = names
            .into_iter()
            .map(|name| canonicalize(name.as_ref()))
            .collect();
        anchors.sort();

        if let Some(pair) = anchors.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(CodecError::DuplicateAnchor(pair[0].clone()));
        }

        Ok(Self { anchors })
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.anchors.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.anchors
    }

    /// CRC32 over the ordered anchor keys
    pub fn layout_hash(&self) -> u32 {
        layout_hash_of(&self.anchors)
    }

    /// Dataset columns: `deviceId, room, <anchors...>`
    pub fn schema_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.anchors.len() + 2);
        columns.push(DEVICE_ID_COLUMN.to_string());
        columns.push(ROOM_COLUMN.to_string());
        columns.extend(self.anchors.iter().cloned());
        columns
    }
}

/// Layout hash for an arbitrary ordered column list
pub fn layout_hash_of<S: AsRef<str>>(anchors: &[S]) -> u32 {
    let mut hasher = Hasher::new();
    for name in anchors {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("Living Room 2"), "living-room-2");
        assert_eq!(canonicalize("BEDROOM"), "bedroom");
        assert_eq!(canonicalize("  Hall\tWay "), "hall-way");
        assert_eq!(canonicalize("living-room"), "living-room");
    }

    #[test]
    fn test_anchor_set_sorted() {
        let set = AnchorSet::from_names(["Living Room 2", "bedroom", "Living Room"]).unwrap();
        let keys: Vec<&str> = set.iter().collect();
        assert_eq!(keys, vec!["bedroom", "living-room", "living-room-2"]);
    }

    #[test]
    fn test_anchor_set_duplicate_fails() {
        let err = AnchorSet::from_names(["Bedroom", "bedroom"]).unwrap_err();
        assert_eq!(err, CodecError::DuplicateAnchor("bedroom".to_string()));
    }

    #[test]
    fn test_surrounding_whitespace_is_dropped() {
        let set = AnchorSet::from_names([" Bedroom ", "Living Room\n"]).unwrap();
        let keys: Vec<&str> = set.iter().collect();
        assert_eq!(keys, vec!["bedroom", "living-room"]);
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        let a = layout_hash_of(&["bedroom", "living-room"]);
        let b = layout_hash_of(&["living-room", "bedroom"]);
        assert_ne!(a, b);

        let set = AnchorSet::from_names(["living-room", "bedroom"]).unwrap();
        assert_eq!(set.layout_hash(), a);
    }

    #[test]
    fn test_schema_columns() {
        let set = AnchorSet::from_names(["bedroom", "living-room"]).unwrap();
        assert_eq!(set.schema_columns(), vec!["deviceId", "room", "bedroom", "living-room"]);
    }
}
