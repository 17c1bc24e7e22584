//! Deep union of nested setting maps.
//!
//! - Maps on both sides: merged key by key (recursive)
//! - Anything else: the overlay value replaces the base value
//!
//! Keys keep the position they had in `base`; new keys are appended.

use indexmap::map::Entry;

use crate::models::{SettingMap, SettingValue};

/// Union `overlay` into `base`, with `overlay` winning leaf conflicts.
pub fn deep_union(mut base: SettingMap, overlay: SettingMap) -> SettingMap {
    for (key, incoming) in overlay {
        match base.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (SettingValue::Map(existing), SettingValue::Map(incoming)) => {
                    let current = std::mem::take(existing);
                    *existing = deep_union(current, incoming);
                }
                (existing, incoming) => *existing = incoming,
            },
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }
    base
}
