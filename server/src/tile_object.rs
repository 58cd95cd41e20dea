/******************************************************************************
 *                                                                            *
 * World tile objects (crab pots and anything else placed on the tile grid)   *
 * with their growth stage, plus the tile status event stream clients         *
 * subscribe to for stage changes. Events are pruned on a schedule.           *
 *                                                                            *
 ******************************************************************************/

use spacetimedb::{Identity, ReducerContext, Table, Timestamp};
use spacetimedb::spacetimedb_lib::ScheduleAt;
use log;
use std::time::Duration;

use crate::pot_fill::EMPTY_GROWTH_STAGE;
use crate::utils::{get_distance_squared, tile_center_px};
use crate::{WORLD_WIDTH_TILES, WORLD_HEIGHT_TILES};

use crate::player as PlayerTableTrait;

pub(crate) const PLAYER_TILE_INTERACTION_DISTANCE: f32 = 96.0;
pub(crate) const PLAYER_TILE_INTERACTION_DISTANCE_SQUARED: f32 =
    PLAYER_TILE_INTERACTION_DISTANCE * PLAYER_TILE_INTERACTION_DISTANCE;

const TILE_STATUS_CLEANUP_INTERVAL_SECS: u64 = 10;
const TILE_STATUS_EVENT_LIFETIME_MICROS: i64 = 5_000_000;

/// An object occupying one tile. At most one per (tile_x, tile_z) column.
#[spacetimedb::table(name = tile_object, public)]
#[derive(Clone, Debug)]
pub struct TileObject {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    #[index(btree)]
    pub tile_x: i32,
    pub tile_y: i32, // height
    pub tile_z: i32,
    pub object_id: i32, // object type, e.g. crab pot
    pub growth_stage: i32,
    pub placed_by: Identity,
    pub placed_at: Timestamp,
}

/// Stage change notification for clients.
#[spacetimedb::table(name = tile_status_change, public)]
#[derive(Clone, Debug)]
pub struct TileStatusChange {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub tile_x: i32,
    pub tile_z: i32,
    pub stage: i32,
    pub triggered_by: Identity,
    pub changed_at: Timestamp,
}

#[spacetimedb::table(name = tile_status_cleanup_schedule, scheduled(cleanup_tile_status_changes))]
#[derive(Clone)]
pub struct TileStatusCleanupSchedule {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub scheduled_at: ScheduleAt,
}

pub fn init_tile_status_cleanup_schedule(ctx: &ReducerContext) -> Result<(), String> {
    let schedule_table = ctx.db.tile_status_cleanup_schedule();
    if schedule_table.iter().count() == 0 {
        log::info!("Starting tile status cleanup schedule (every {}s).", TILE_STATUS_CLEANUP_INTERVAL_SECS);
        let interval = Duration::from_secs(TILE_STATUS_CLEANUP_INTERVAL_SECS);
        match schedule_table.try_insert(TileStatusCleanupSchedule {
            id: 0,
            scheduled_at: ScheduleAt::Interval(interval.into()),
        }) {
            Ok(_) => log::info!("Tile status cleanup schedule inserted."),
            Err(e) => log::error!("Failed to insert tile status cleanup schedule: {}", e),
        };
    } else {
        log::debug!("Tile status cleanup schedule already exists.");
    }
    Ok(())
}

#[spacetimedb::reducer]
pub fn cleanup_tile_status_changes(ctx: &ReducerContext, _schedule: TileStatusCleanupSchedule) -> Result<(), String> {
    if ctx.sender != ctx.identity() {
        return Err("Tile status cleanup can only be run by the scheduler".to_string());
    }

    let cutoff_micros = ctx.timestamp.to_micros_since_unix_epoch() - TILE_STATUS_EVENT_LIFETIME_MICROS;
    let changes = ctx.db.tile_status_change();
    let expired: Vec<u64> = changes.iter()
        .filter(|change| change.changed_at.to_micros_since_unix_epoch() < cutoff_micros)
        .map(|change| change.id)
        .collect();

    let removed_count = expired.len();
    for id in expired {
        changes.id().delete(id);
    }
    if removed_count > 0 {
        log::trace!("Cleaned up {} old tile status changes", removed_count);
    }
    Ok(())
}

/// Places an object on an empty tile near the caller. New objects start at the empty stage.
#[spacetimedb::reducer]
pub fn place_tile_object(ctx: &ReducerContext, tile_x: i32, tile_y: i32, tile_z: i32, object_id: i32) -> Result<(), String> {
    let sender_id = ctx.sender;

    if object_id <= 0 {
        return Err(format!("Invalid tile object type {}.", object_id));
    }
    if tile_x < 0 || tile_z < 0 || tile_x >= WORLD_WIDTH_TILES as i32 || tile_z >= WORLD_HEIGHT_TILES as i32 {
        return Err(format!("Tile ({}, {}) is outside the world.", tile_x, tile_z));
    }
    if !is_tile_within_reach(ctx, sender_id, tile_x, tile_z) {
        return Err("Too far away to place an object there.".to_string());
    }
    if let Some(existing) = find_tile_object(ctx, tile_x, tile_z) {
        return Err(format!("Tile ({}, {}) is already occupied by object {}.", tile_x, tile_z, existing.object_id));
    }

    let placed = ctx.db.tile_object().try_insert(TileObject {
        id: 0,
        tile_x,
        tile_y,
        tile_z,
        object_id,
        growth_stage: EMPTY_GROWTH_STAGE,
        placed_by: sender_id,
        placed_at: ctx.timestamp,
    }).map_err(|e| {
        log::error!("[PlaceTileObject] Failed to insert tile object for {:?}: {}", sender_id, e);
        format!("Failed to place object: {}", e)
    })?;

    log::info!("[PlaceTileObject] Player {:?} placed object {} (ID {}) at ({}, {}, {}).",
        sender_id, object_id, placed.id, tile_x, tile_y, tile_z);
    Ok(())
}

/// Object occupying the (x, z) column, if any.
pub(crate) fn find_tile_object(ctx: &ReducerContext, tile_x: i32, tile_z: i32) -> Option<TileObject> {
    ctx.db.tile_object().tile_x().filter(tile_x).find(|tile| tile.tile_z == tile_z)
}

pub(crate) fn set_tile_growth_stage(ctx: &ReducerContext, tile_x: i32, tile_z: i32, stage: i32) -> bool {
    match find_tile_object(ctx, tile_x, tile_z) {
        Some(mut tile) => {
            tile.growth_stage = stage;
            ctx.db.tile_object().id().update(tile);
            true
        }
        None => {
            log::warn!("[TileObject] No object at ({}, {}) to set growth stage {}.", tile_x, tile_z, stage);
            false
        }
    }
}

pub(crate) fn emit_tile_status_change(ctx: &ReducerContext, stage: i32, tile_x: i32, tile_z: i32, triggered_by: Identity) {
    match ctx.db.tile_status_change().try_insert(TileStatusChange {
        id: 0,
        tile_x,
        tile_z,
        stage,
        triggered_by,
        changed_at: ctx.timestamp,
    }) {
        Ok(inserted) => log::debug!("Tile status change {} emitted: stage {} at ({}, {})", inserted.id, stage, tile_x, tile_z),
        Err(e) => log::error!("Failed to emit tile status change at ({}, {}): {:?}", tile_x, tile_z, e),
    }
}

/// Whether a live player stands close enough to the tile to interact with it.
pub(crate) fn is_tile_within_reach(ctx: &ReducerContext, player_id: Identity, tile_x: i32, tile_z: i32) -> bool {
    let Some(player) = ctx.db.player().identity().find(&player_id) else {
        return false;
    };
    let (center_x, center_y) = tile_center_px(tile_x, tile_z);
    get_distance_squared(player.position_x, player.position_y, center_x, center_y) <= PLAYER_TILE_INTERACTION_DISTANCE_SQUARED
}
