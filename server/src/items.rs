use spacetimedb::{Identity, ReducerContext, SpacetimeType, Table};
use log;
use std::collections::HashSet;

use crate::items_database;
use crate::models::{HotbarLocationData, InventoryLocationData, ItemLocation};
use crate::player_inventory::{NUM_PLAYER_HOTBAR_SLOTS, NUM_PLAYER_INVENTORY_SLOTS};

// --- Item Enums and Structs ---

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, SpacetimeType)]
pub enum ItemCategory {
    Material,
    Consumable,
}

/// Catalogue entry for an item type.
///
/// IDs are fixed rather than auto-incremented: the bait mapping configuration
/// refers to items by these numbers.
#[spacetimedb::table(name = item_definition, public)]
#[derive(Clone, Debug)]
pub struct ItemDefinition {
    #[primary_key]
    pub id: u64,
    pub name: String,
    pub description: String,
    pub category: ItemCategory,
    pub icon_asset_name: String, // e.g., "cooked_meat.png", used by client
    pub is_stackable: bool,
    pub stack_size: u32,
}

// --- Inventory Table ---

// Represents an instance of an item in a player's inventory or hotbar
#[spacetimedb::table(name = inventory_item, public)]
#[derive(Clone, Debug)]
pub struct InventoryItem {
    #[primary_key]
    #[auto_inc]
    pub instance_id: u64,
    pub item_def_id: u64,
    pub quantity: u32,
    pub location: ItemLocation,
}

// --- Item Reducers ---

// Seeds the item catalogue if the table is empty
#[spacetimedb::reducer]
pub fn seed_items(ctx: &ReducerContext) -> Result<(), String> {
    let items = ctx.db.item_definition();
    if items.iter().count() > 0 {
        log::info!("Item definitions already seeded ({}). Skipping.", items.iter().count());
        return Ok(());
    }

    log::info!("Seeding initial item definitions...");

    let mut seeded_count = 0;
    for item_def in items_database::get_initial_item_definitions() {
        match items.try_insert(item_def) {
            Ok(_) => seeded_count += 1,
            Err(e) => log::error!("Failed to insert item definition during seeding: {}", e),
        }
    }

    log::info!("Finished seeding {} item definitions.", seeded_count);
    Ok(())
}

/// Debug/admin helper: puts `quantity` of an item into the caller's hotbar or inventory.
#[spacetimedb::reducer]
pub fn give_item(ctx: &ReducerContext, item_def_id: u64, quantity: u32) -> Result<(), String> {
    if quantity == 0 {
        return Err("Quantity must be at least 1.".to_string());
    }
    add_item_to_player_inventory(ctx, ctx.sender, item_def_id, quantity)?;
    crate::active_equipment::refresh_active_item(ctx, ctx.sender);
    Ok(())
}

/// Display name of an item definition, if it exists.
pub(crate) fn item_name(ctx: &ReducerContext, item_def_id: u64) -> Option<String> {
    ctx.db.item_definition().id().find(item_def_id).map(|def| def.name)
}

// Helper to add an item to inventory, prioritizing hotbar for stacking and new slots.
pub(crate) fn add_item_to_player_inventory(ctx: &ReducerContext, player_id: Identity, item_def_id: u64, quantity: u32) -> Result<Option<u64>, String> {
    let inventory = ctx.db.inventory_item();
    let item_defs = ctx.db.item_definition();
    let mut remaining_quantity = quantity;

    let item_def = item_defs.id().find(item_def_id)
        .ok_or_else(|| format!("Item definition {} not found", item_def_id))?;

    if item_def.is_stackable {
        let mut items_to_update: Vec<InventoryItem> = Vec::new();

        // Hotbar stacks first, then inventory stacks
        let owned_stacks = inventory.iter()
            .filter(|i| i.item_def_id == item_def_id && matches!(i.location, ItemLocation::Hotbar(ref data) if data.owner_id == player_id))
            .chain(inventory.iter()
                .filter(|i| i.item_def_id == item_def_id && matches!(i.location, ItemLocation::Inventory(ref data) if data.owner_id == player_id)));

        for mut item in owned_stacks {
            let space_available = item_def.stack_size.saturating_sub(item.quantity);
            if space_available > 0 {
                let transfer_qty = std::cmp::min(remaining_quantity, space_available);
                item.quantity += transfer_qty;
                remaining_quantity -= transfer_qty;
                items_to_update.push(item);
                if remaining_quantity == 0 { break; }
            }
        }
        for item in items_to_update {
            inventory.instance_id().update(item);
        }
        if remaining_quantity == 0 {
            log::info!("[AddItem] Fully stacked {} of item def {} for player {:?}.", quantity, item_def_id, player_id);
            return Ok(None);
        }
    }

    let final_quantity_to_add = if item_def.is_stackable { remaining_quantity } else { 1 };

    let occupied_hotbar_slots: HashSet<u8> = inventory.iter()
        .filter_map(|i| match &i.location {
            ItemLocation::Hotbar(data) if data.owner_id == player_id => Some(data.slot_index),
            _ => None,
        })
        .collect();

    let location = if let Some(slot_index) = (0..NUM_PLAYER_HOTBAR_SLOTS).find(|slot| !occupied_hotbar_slots.contains(slot)) {
        ItemLocation::Hotbar(HotbarLocationData { owner_id: player_id, slot_index })
    } else {
        let occupied_inventory_slots: HashSet<u16> = inventory.iter()
            .filter_map(|i| match &i.location {
                ItemLocation::Inventory(data) if data.owner_id == player_id => Some(data.slot_index),
                _ => None,
            })
            .collect();
        match (0..NUM_PLAYER_INVENTORY_SLOTS).find(|slot| !occupied_inventory_slots.contains(slot)) {
            Some(slot_index) => ItemLocation::Inventory(InventoryLocationData { owner_id: player_id, slot_index }),
            None => {
                log::error!("[AddItem] No empty hotbar or inventory slots for player {:?} to add item def {}.", player_id, item_def_id);
                return Err("Inventory is full".to_string());
            }
        }
    };

    let inserted_item = inventory.insert(InventoryItem {
        instance_id: 0,
        item_def_id,
        quantity: final_quantity_to_add,
        location: location.clone(),
    });
    log::info!("[AddItem] Added {} of item def {} at {:?} for player {:?}. New ID: {}",
        final_quantity_to_add, item_def_id, location, player_id, inserted_item.instance_id);
    Ok(Some(inserted_item.instance_id))
}
