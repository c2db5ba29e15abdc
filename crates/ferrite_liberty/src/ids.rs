//! Opaque ID newtypes for library entities.

use serde::{Deserialize, Serialize};

/// Opaque, copyable ID for a cell in a [`Library`](crate::Library).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LibCellId(u32);

impl LibCellId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LibCellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
