/******************************************************************************
 *                                                                            *
 * Tracks which hotbar slot each player has selected and the item currently   *
 * in hand. The hand record mirrors the selected slot and is cleared when     *
 * the held stack runs out.                                                   *
 *                                                                            *
 ******************************************************************************/

use spacetimedb::{Identity, ReducerContext, Table};
use log;

use crate::items::InventoryItem;
use crate::items::item_definition as ItemDefinitionTableTrait;
use crate::player_inventory::{find_item_in_hotbar_slot, NUM_PLAYER_HOTBAR_SLOTS};

/// The player's selected hotbar slot and the item held from it
#[spacetimedb::table(name = active_equipment, public)]
#[derive(Clone, Default, Debug)]
pub struct ActiveEquipment {
    #[primary_key]
    pub player_identity: Identity,
    pub selected_hotbar_slot: u8,
    pub equipped_item_def_id: Option<u64>, // ID from ItemDefinition table
    pub equipped_item_instance_id: Option<u64>, // Instance ID from InventoryItem
    pub icon_asset_name: Option<String>, // Icon to display for the item in hand
}

/// Selects a hotbar slot. Whatever sits in it becomes the item in hand.
#[spacetimedb::reducer]
pub fn select_hotbar_slot(ctx: &ReducerContext, slot: u8) -> Result<(), String> {
    let sender_id = ctx.sender;
    if slot >= NUM_PLAYER_HOTBAR_SLOTS {
        return Err(format!("Invalid hotbar slot {} (must be below {}).", slot, NUM_PLAYER_HOTBAR_SLOTS));
    }

    let mut equipment = get_or_create_active_equipment(ctx, sender_id)?;
    equipment.selected_hotbar_slot = slot;
    let held = find_item_in_hotbar_slot(ctx, sender_id, slot);
    apply_held_item(ctx, &mut equipment, held.as_ref());

    log::debug!("Player {:?} selected hotbar slot {} (item {:?}).", sender_id, slot, equipment.equipped_item_instance_id);
    ctx.db.active_equipment().player_identity().update(equipment);
    Ok(())
}

/// Item sitting in the player's selected hotbar slot.
pub(crate) fn held_item(ctx: &ReducerContext, player_id: Identity) -> Option<InventoryItem> {
    let equipment = ctx.db.active_equipment().player_identity().find(player_id)?;
    find_item_in_hotbar_slot(ctx, player_id, equipment.selected_hotbar_slot)
}

/// Re-syncs the hand record with the selected slot after inventory changes.
pub(crate) fn refresh_active_item(ctx: &ReducerContext, player_id: Identity) {
    let active_equipments = ctx.db.active_equipment();
    let Some(mut equipment) = active_equipments.player_identity().find(player_id) else {
        return;
    };
    let held = find_item_in_hotbar_slot(ctx, player_id, equipment.selected_hotbar_slot);
    if equipment.equipped_item_instance_id == held.as_ref().map(|item| item.instance_id) {
        return;
    }
    apply_held_item(ctx, &mut equipment, held.as_ref());
    active_equipments.player_identity().update(equipment);
}

/// Empties the player's hand. The selected slot stays selected.
pub(crate) fn clear_active_item(ctx: &ReducerContext, player_identity: Identity) {
    let active_equipments = ctx.db.active_equipment();
    if let Some(mut equipment) = active_equipments.player_identity().find(player_identity) {
        if equipment.equipped_item_instance_id.is_some() {
            log::info!("Player {:?} cleared active item (was instance ID: {:?}, def ID: {:?}).",
                player_identity, equipment.equipped_item_instance_id, equipment.equipped_item_def_id);
            apply_held_item(ctx, &mut equipment, None);
            active_equipments.player_identity().update(equipment);
        } else {
            log::debug!("Player {:?} has no active item to clear.", player_identity);
        }
    } else {
        log::info!("Player {:?} tried to clear active item, but no ActiveEquipment row found.", player_identity);
    }
}

pub(crate) fn get_or_create_active_equipment(ctx: &ReducerContext, player_id: Identity) -> Result<ActiveEquipment, String> {
    let table = ctx.db.active_equipment();
    if let Some(existing) = table.player_identity().find(player_id) {
        return Ok(existing);
    }
    log::info!("Creating new ActiveEquipment row for player {:?}", player_id);
    let new_equip = ActiveEquipment {
        player_identity: player_id,
        ..Default::default()
    };
    table.try_insert(new_equip)
        .map_err(|e| format!("Failed to create active equipment for {:?}: {}", player_id, e))
}

fn apply_held_item(ctx: &ReducerContext, equipment: &mut ActiveEquipment, held: Option<&InventoryItem>) {
    match held {
        Some(item) => {
            equipment.equipped_item_def_id = Some(item.item_def_id);
            equipment.equipped_item_instance_id = Some(item.instance_id);
            equipment.icon_asset_name = ctx.db.item_definition().id().find(item.item_def_id)
                .map(|def| def.icon_asset_name);
        }
        None => {
            equipment.equipped_item_def_id = None;
            equipment.equipped_item_instance_id = None;
            equipment.icon_asset_name = None;
        }
    }
}
