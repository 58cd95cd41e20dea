use spacetimedb::{SpacetimeType, Identity};

// --- Data structs for ItemLocation variants ---

#[derive(SpacetimeType, Clone, Debug, PartialEq)] // No Serialize/Deserialize due to Identity
pub struct InventoryLocationData {
    pub owner_id: Identity,
    pub slot_index: u16,
}

#[derive(SpacetimeType, Clone, Debug, PartialEq)] // No Serialize/Deserialize due to Identity
pub struct HotbarLocationData {
    pub owner_id: Identity,
    pub slot_index: u8,
}

/// Represents the specific location of an InventoryItem.
#[derive(SpacetimeType, Clone, Debug, PartialEq)]
pub enum ItemLocation {
    Inventory(InventoryLocationData),
    Hotbar(HotbarLocationData),
    Unknown, // Represents an undefined or invalid location
}

impl ItemLocation {
    pub fn is_player_bound(&self) -> Option<Identity> {
        match self {
            ItemLocation::Inventory(data) => Some(data.owner_id),
            ItemLocation::Hotbar(data) => Some(data.owner_id),
            ItemLocation::Unknown => None,
        }
    }

    /// True when this location is the given hotbar slot of the given player.
    pub fn is_hotbar_slot(&self, player_id: Identity, slot_index: u8) -> bool {
        matches!(self, ItemLocation::Hotbar(data) if data.owner_id == player_id && data.slot_index == slot_index)
    }
}
