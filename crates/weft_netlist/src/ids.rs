//! Typed IDs for the entity stores.
//!
//! Each ID kind is a `u32` newtype generated by `entity_id!`, implementing
//! [`EntityId`] once (no duplicated inherent surface) and a `Debug` form
//! that prints as `Kind(n)`. IDs come from
//! [`Store::insert`](crate::store::Store::insert) and address slots in O(1).

use crate::store::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u32);

        impl EntityId for $name {
            fn from_index(index: usize) -> Self {
                match u32::try_from(index) {
                    Ok(raw) => Self(raw),
                    Err(_) => panic!("entity index {index} overflows the ID space"),
                }
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

entity_id!(
    /// Addresses a signal in the circuit.
    SignalId
);

entity_id!(
    /// Addresses a module in the circuit.
    ModuleId
);

entity_id!(
    /// Addresses a conditional-block process.
    ProcessId
);

entity_id!(
    /// Addresses a change-event monitor on a signal.
    MonitorId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn index_roundtrip() {
        let id = SignalId::from_index(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn equality_and_ordering() {
        assert_eq!(ModuleId::from_index(7), ModuleId::from_index(7));
        assert_ne!(ModuleId::from_index(7), ModuleId::from_index(8));
        assert!(ModuleId::from_index(7) < ModuleId::from_index(8));
    }

    #[test]
    fn ids_work_as_set_keys() {
        let mut set = HashSet::new();
        set.insert(ProcessId::from_index(1));
        set.insert(ProcessId::from_index(2));
        set.insert(ProcessId::from_index(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_prints_kind_and_slot() {
        assert_eq!(format!("{:?}", MonitorId::from_index(3)), "MonitorId(3)");
    }

    #[test]
    fn serde_roundtrip() {
        let id = MonitorId::from_index(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: MonitorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
