//! Opaque ID newtypes for netlist entities.
//!
//! [`InstId`], [`NetId`], [`PinId`], and [`ModNetId`] are thin `u32`
//! wrappers used as arena indices into the [`Netlist`](crate::Netlist).
//! Indices are never reused, so an ID that outlives its object simply stops
//! resolving.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for an instance in the netlist.
    InstId
);

define_id!(
    /// Opaque, copyable ID for a flat net in the netlist.
    NetId
);

define_id!(
    /// Opaque, copyable ID for an instance pin or top-level port.
    PinId
);

define_id!(
    /// Opaque, copyable ID for a hierarchical (module) net.
    ModNetId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn roundtrip() {
        assert_eq!(InstId::from_raw(42).as_raw(), 42);
        assert_eq!(NetId::from_raw(99).as_raw(), 99);
        assert_eq!(PinId::from_raw(7).index(), 7);
    }

    #[test]
    fn ordered_in_sets() {
        let set: BTreeSet<NetId> = [3, 1, 2, 1].into_iter().map(NetId::from_raw).collect();
        let raw: Vec<u32> = set.into_iter().map(NetId::as_raw).collect();
        assert_eq!(raw, vec![1, 2, 3]);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ModNetId::from_raw(5);
        let json = serde_json::to_string(&id).unwrap();
        let back: ModNetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
