use spacetimedb::{Identity, ReducerContext};
use spacetimedb::Table;
use log;

use crate::items::{InventoryItem, item_definition as ItemDefinitionTableTrait, inventory_item as InventoryItemTableTrait};
use crate::models::{ItemLocation, HotbarLocationData};

/// Grants the starting hotbar to a newly registered player and selects slot 0.
pub(crate) fn grant_starting_items(ctx: &ReducerContext, player_id: Identity, username: &str) -> Result<(), String> {
    log::info!("[GrantItems] Granting starting items to player {} ({:?})...", username, player_id);

    let item_defs = ctx.db.item_definition();
    let inventory = ctx.db.inventory_item();

    // (item_name, quantity, hotbar_slot)
    let starting_hotbar_items = [
        ("Cooked Meat", 5, 0u8),
        ("Apple", 3, 1u8),
        ("Stone", 10, 2u8),
    ];

    for (item_name, quantity, slot_index) in starting_hotbar_items.iter() {
        let Some(item_def) = item_defs.iter().find(|def| def.name == *item_name) else {
            log::error!("[GrantItems] Starting item definition '{}' not found.", item_name);
            continue;
        };
        let item_to_insert = InventoryItem {
            instance_id: 0,
            item_def_id: item_def.id,
            quantity: *quantity,
            location: ItemLocation::Hotbar(HotbarLocationData { owner_id: player_id, slot_index: *slot_index }),
        };
        match inventory.try_insert(item_to_insert) {
            Ok(_) => log::info!("[GrantItems] Granted {} x{} in hotbar slot {} to player {:?}",
                item_name, quantity, slot_index, player_id),
            Err(e) => log::error!("[GrantItems] FAILED hotbar insert for {} for player {:?}: {}", item_name, player_id, e),
        }
    }

    crate::active_equipment::get_or_create_active_equipment(ctx, player_id)?;
    crate::active_equipment::refresh_active_item(ctx, player_id);

    log::info!("[GrantItems] Finished granting starting items to player {}.", username);
    Ok(())
}
