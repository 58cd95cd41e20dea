use spacetimedb::{ReducerContext, Identity, Table};
use log;

use crate::items::InventoryItem;
use crate::items::{
    inventory_item as InventoryItemTableTrait,
    item_definition as ItemDefinitionTableTrait
};
use crate::models::{ItemLocation, HotbarLocationData, InventoryLocationData};

pub(crate) const NUM_PLAYER_INVENTORY_SLOTS: u16 = 24;
pub(crate) const NUM_PLAYER_HOTBAR_SLOTS: u8 = 6;

// --- Helper Functions ---

// Item occupying a specific hotbar slot of the given player
pub(crate) fn find_item_in_hotbar_slot(ctx: &ReducerContext, player_id: Identity, slot_index: u8) -> Option<InventoryItem> {
    ctx.db
        .inventory_item().iter()
        .find(|i| i.location.is_hotbar_slot(player_id, slot_index))
}

// Item occupying a specific inventory slot of the given player
pub(crate) fn find_item_in_inventory_slot(ctx: &ReducerContext, player_id: Identity, slot_index: u16) -> Option<InventoryItem> {
    ctx.db
        .inventory_item().iter()
        .find(|i| matches!(&i.location, ItemLocation::Inventory(data) if data.owner_id == player_id && data.slot_index == slot_index))
}

/// Removes one unit from a stack and returns how many are left.
///
/// The row is deleted when the last unit goes. `None` if the item no longer exists.
pub(crate) fn consume_one_from_stack(ctx: &ReducerContext, instance_id: u64) -> Option<u32> {
    let inventory_items = ctx.db.inventory_item();
    let mut item = inventory_items.instance_id().find(instance_id)?;

    if item.quantity <= 1 {
        inventory_items.instance_id().delete(instance_id);
        log::debug!("[Consume] Used the last unit of item {} (def {}). Stack removed.", instance_id, item.item_def_id);
        return Some(0);
    }

    item.quantity -= 1;
    let remaining = item.quantity;
    inventory_items.instance_id().update(item);
    Some(remaining)
}

// --- Reducers ---

/// Moves an owned item into a hotbar slot. Stacks of the same item merge up to the
/// stack size; anything else in the target slot swaps into the source slot.
#[spacetimedb::reducer]
pub fn move_item_to_hotbar(ctx: &ReducerContext, item_instance_id: u64, target_hotbar_slot: u8) -> Result<(), String> {
    let sender_id = ctx.sender;
    if target_hotbar_slot >= NUM_PLAYER_HOTBAR_SLOTS {
        return Err("Invalid target hotbar slot index".to_string());
    }
    let target_location = ItemLocation::Hotbar(HotbarLocationData { owner_id: sender_id, slot_index: target_hotbar_slot });
    move_owned_item(ctx, sender_id, item_instance_id, target_location, find_item_in_hotbar_slot(ctx, sender_id, target_hotbar_slot))
}

/// Moves an owned item into a backpack slot, with the same merge/swap rules as the hotbar.
#[spacetimedb::reducer]
pub fn move_item_to_inventory(ctx: &ReducerContext, item_instance_id: u64, target_inventory_slot: u16) -> Result<(), String> {
    let sender_id = ctx.sender;
    if target_inventory_slot >= NUM_PLAYER_INVENTORY_SLOTS {
        return Err("Invalid target inventory slot index".to_string());
    }
    let target_location = ItemLocation::Inventory(InventoryLocationData { owner_id: sender_id, slot_index: target_inventory_slot });
    move_owned_item(ctx, sender_id, item_instance_id, target_location, find_item_in_inventory_slot(ctx, sender_id, target_inventory_slot))
}

fn move_owned_item(
    ctx: &ReducerContext,
    sender_id: Identity,
    item_instance_id: u64,
    target_location: ItemLocation,
    target_item_opt: Option<InventoryItem>,
) -> Result<(), String> {
    let inventory_items = ctx.db.inventory_item();

    let mut item_to_move = inventory_items.instance_id().find(item_instance_id)
        .ok_or_else(|| format!("Item instance {} not found", item_instance_id))?;
    if item_to_move.location.is_player_bound() != Some(sender_id) {
        return Err("Item does not belong to the caller or is not in their direct possession.".to_string());
    }
    let original_location = item_to_move.location.clone();

    match target_item_opt {
        Some(target_item) if target_item.instance_id == item_instance_id => {
            log::debug!("[MoveItem] Item {} dropped onto its own slot. Nothing to do.", item_instance_id);
        }
        Some(mut target_item) => {
            let item_def = ctx.db.item_definition().id().find(item_to_move.item_def_id)
                .ok_or_else(|| format!("Item definition {} not found", item_to_move.item_def_id))?;
            let space_available = item_def.stack_size.saturating_sub(target_item.quantity);

            if item_def.is_stackable && target_item.item_def_id == item_to_move.item_def_id && space_available > 0 {
                let transfer_qty = std::cmp::min(item_to_move.quantity, space_available);
                target_item.quantity += transfer_qty;
                inventory_items.instance_id().update(target_item.clone());
                if transfer_qty == item_to_move.quantity {
                    inventory_items.instance_id().delete(item_instance_id);
                } else {
                    item_to_move.quantity -= transfer_qty;
                    inventory_items.instance_id().update(item_to_move);
                }
                log::info!("[MoveItem Merge] Merged {} of item {} onto {}. Target now {}.",
                    transfer_qty, item_instance_id, target_item.instance_id, target_item.quantity);
            } else {
                log::info!("[MoveItem Swap] Swapping item {} at {:?} with item {} at {:?}.",
                    item_instance_id, original_location, target_item.instance_id, target_location);
                target_item.location = original_location;
                inventory_items.instance_id().update(target_item);
                item_to_move.location = target_location;
                inventory_items.instance_id().update(item_to_move);
            }
        }
        None => {
            log::info!("[MoveItem Place] Moving item {} from {:?} to {:?}.", item_instance_id, original_location, target_location);
            item_to_move.location = target_location;
            inventory_items.instance_id().update(item_to_move);
        }
    }

    // Whatever sits in the selected slot may have changed.
    crate::active_equipment::refresh_active_item(ctx, sender_id);
    Ok(())
}
