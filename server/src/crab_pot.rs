/******************************************************************************
 *                                                                            *
 * Crab pot interaction for connected players. Backs the fill state machine   *
 * with the world, inventory and chat tables, and keeps each player's bait    *
 * reserve for the length of their session.                                   *
 *                                                                            *
 ******************************************************************************/

use spacetimedb::{Identity, ReducerContext, Table};
use log;

use crate::bait_config::{get_bait_config, get_bait_mapping};
use crate::bait_feedback::{Feedback, FeedbackTier};
use crate::bait_mapping::ItemId;
use crate::pot_fill::{BaitInventory, Notifier, PotFillStateMachine, PotWorld, StageReplicator, TileRef};
use crate::tile_object::{emit_tile_status_change, find_tile_object, is_tile_within_reach, set_tile_growth_stage};

use crate::active_equipment::active_equipment as ActiveEquipmentTableTrait;
use crate::player as PlayerTableTrait;

/// Bait portions a player has prepared but not yet put into pots.
/// A row exists only while the reserve is above zero.
#[spacetimedb::table(name = bait_reserve, public)]
#[derive(Clone, Debug)]
pub struct BaitReserve {
    #[primary_key]
    pub player_identity: Identity,
    pub portions_remaining: u32,
}

/// Primary action on a tile. Rejections are normal outcomes, so this never errors.
#[spacetimedb::reducer]
pub fn fill_crab_pot(ctx: &ReducerContext, tile_x: i32, tile_y: i32, tile_z: i32) -> Result<(), String> {
    let sender_id = ctx.sender;

    let config = match get_bait_config(ctx) {
        Ok(config) => config,
        Err(e) => {
            log::error!("[CrabPot] Cannot fill pot for {:?}: {}", sender_id, e);
            return Ok(());
        }
    };

    let reserve_before = ctx.db.bait_reserve().player_identity().find(sender_id)
        .map(|reserve| reserve.portions_remaining)
        .unwrap_or(0);

    let player_verbose = ctx.db.player().identity().find(&sender_id)
        .map(|player| player.is_bait_verbose)
        .unwrap_or(false);

    let mut machine = PotFillStateMachine::new(get_bait_mapping(ctx), config.pot_settings(player_verbose))
        .with_reserve(reserve_before);
    let mut host = TableFillHost::new(ctx, sender_id, TileRef { x: tile_x, y: tile_y, z: tile_z });
    let result = machine.attempt_fill(&mut host);

    store_bait_reserve(ctx, sender_id, reserve_before, machine.portions_remaining());

    if result.filled_pot() {
        log::debug!("[CrabPot] Player {:?} filled pot at ({}, {}, {}). Reserve {:?}: {}",
            sender_id, tile_x, tile_y, tile_z, machine.state(), machine.portions_remaining());
    } else {
        log::debug!("[CrabPot] Player {:?} fill at ({}, {}, {}) did nothing: {:?}", sender_id, tile_x, tile_y, tile_z, result);
    }
    Ok(())
}

/// Drops the player's reserve. Called when their session ends.
pub(crate) fn clear_bait_reserve(ctx: &ReducerContext, player_id: Identity) {
    let reserves = ctx.db.bait_reserve();
    if let Some(reserve) = reserves.player_identity().find(player_id) {
        log::info!("[CrabPot] Discarding {} unused bait for {:?}.", reserve.portions_remaining, player_id);
        reserves.player_identity().delete(player_id);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReserveWrite {
    Keep,
    Upsert(u32),
    Delete,
}

fn reserve_write(before: u32, after: u32) -> ReserveWrite {
    match (before, after) {
        (b, a) if b == a => ReserveWrite::Keep,
        (_, 0) => ReserveWrite::Delete,
        (_, a) => ReserveWrite::Upsert(a),
    }
}

fn store_bait_reserve(ctx: &ReducerContext, player_id: Identity, before: u32, after: u32) {
    let reserves = ctx.db.bait_reserve();
    match reserve_write(before, after) {
        ReserveWrite::Keep => {}
        ReserveWrite::Delete => {
            reserves.player_identity().delete(player_id);
        }
        ReserveWrite::Upsert(portions_remaining) => {
            let row = BaitReserve { player_identity: player_id, portions_remaining };
            if reserves.player_identity().find(player_id).is_some() {
                reserves.player_identity().update(row);
            } else if let Err(e) = reserves.try_insert(row) {
                log::error!("[CrabPot] Failed to store bait reserve for {:?}: {}", player_id, e);
            }
        }
    }
}

/// Collaborators for one fill attempt, reading and writing the module tables.
struct TableFillHost<'a> {
    ctx: &'a ReducerContext,
    player_id: Identity,
    target: TileRef,
}

impl<'a> TableFillHost<'a> {
    fn new(ctx: &'a ReducerContext, player_id: Identity, target: TileRef) -> Self {
        Self { ctx, player_id, target }
    }
}

impl PotWorld for TableFillHost<'_> {
    fn target_tile(&self) -> Option<TileRef> {
        if is_tile_within_reach(self.ctx, self.player_id, self.target.x, self.target.z) {
            Some(self.target)
        } else {
            log::debug!("[CrabPot] Tile ({}, {}) is out of reach for {:?}.", self.target.x, self.target.z, self.player_id);
            None
        }
    }

    // An empty tile, or an object at another height, is simply not a pot.
    fn tile_object_id_at(&self, x: i32, y: i32, z: i32) -> Option<i32> {
        let object_id = find_tile_object(self.ctx, x, z)
            .filter(|tile| tile.tile_y == y)
            .map(|tile| tile.object_id)
            .unwrap_or(0);
        Some(object_id)
    }

    fn growth_stage_at(&self, x: i32, z: i32) -> Option<i32> {
        find_tile_object(self.ctx, x, z).map(|tile| tile.growth_stage)
    }

    fn set_growth_stage(&mut self, x: i32, z: i32, stage: i32) {
        set_tile_growth_stage(self.ctx, x, z, stage);
    }
}

impl BaitInventory for TableFillHost<'_> {
    fn is_menu_open(&self) -> Option<bool> {
        self.ctx.db.player().identity().find(&self.player_id).map(|player| player.is_menu_open)
    }

    fn selected_item_id(&self) -> Option<ItemId> {
        // No hand record means the player never finished registering.
        self.ctx.db.active_equipment().player_identity().find(self.player_id)?;
        let held_def_id = crate::active_equipment::held_item(self.ctx, self.player_id)
            .map(|item| item.item_def_id as ItemId)
            .unwrap_or(0);
        Some(held_def_id)
    }

    fn item_name(&self, item_id: ItemId) -> Option<String> {
        let def_id = u64::try_from(item_id).ok()?;
        crate::items::item_name(self.ctx, def_id)
    }

    fn decrement_selected_stack(&mut self) -> Option<u32> {
        let held = crate::active_equipment::held_item(self.ctx, self.player_id)?;
        crate::player_inventory::consume_one_from_stack(self.ctx, held.instance_id)
    }

    fn on_hands_emptied(&mut self) {
        crate::active_equipment::clear_active_item(self.ctx, self.player_id);
    }
}

impl StageReplicator for TableFillHost<'_> {
    fn broadcast_stage_change(&mut self, stage: i32, x: i32, z: i32) {
        emit_tile_status_change(self.ctx, stage, x, z, self.player_id);
    }
}

impl Notifier for TableFillHost<'_> {
    fn notify(&mut self, feedback: &Feedback) {
        match feedback.tier {
            FeedbackTier::Silent => return,
            FeedbackTier::Informational => log::info!("[CrabPot] To {:?}: {}", self.player_id, feedback.text),
            FeedbackTier::Warning => log::warn!("[CrabPot] To {:?}: {}", self.player_id, feedback.text),
        }
        crate::chat::send_private_notification(self.ctx, self.player_id, feedback.text.clone());
    }
}
