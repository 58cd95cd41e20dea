use spacetimedb::{Identity, Timestamp, ReducerContext, Table, ConnectionId};
use log;

// Declare the modules
mod models;
mod items;
mod items_database;
mod player_inventory;
mod active_equipment;
mod starting_items;
mod chat;
mod utils;
mod tile_object;
mod bait_mapping;
mod bait_resolver;
mod bait_feedback;
mod pot_fill;
mod bait_config;
mod crab_pot;

// --- Global Constants ---
pub const TILE_SIZE_PX: u32 = 48;
pub const PLAYER_RADIUS: f32 = 32.0; // Player collision radius
pub const PLAYER_SPEED: f32 = 600.0; // Speed in pixels per second

// World Dimensions
pub const WORLD_WIDTH_TILES: u32 = 500;
pub const WORLD_HEIGHT_TILES: u32 = 500;
pub const WORLD_WIDTH_PX: f32 = (WORLD_WIDTH_TILES * TILE_SIZE_PX) as f32;
pub const WORLD_HEIGHT_PX: f32 = (WORLD_HEIGHT_TILES * TILE_SIZE_PX) as f32;

const SPAWN_X: f32 = 640.0;
const SPAWN_Y: f32 = 480.0;

// Table for private system messages to individual players
#[spacetimedb::table(name = private_message, public)] // Public so client can subscribe with filter
#[derive(Clone, Debug)]
pub struct PrivateMessage {
    #[primary_key]
    #[auto_inc]
    pub id: u64,
    pub recipient_identity: Identity, // The player who should see this message
    pub sender_display_name: String,  // e.g., "SYSTEM"
    pub text: String,
    pub sent: Timestamp,
}

#[spacetimedb::table(name = player, public)]
#[derive(Clone)]
pub struct Player {
    #[primary_key]
    pub identity: Identity,
    pub username: String,
    pub position_x: f32,
    pub position_y: f32,
    pub color: String,
    pub direction: String,
    pub last_update: Timestamp,
    pub is_online: bool,
    pub is_menu_open: bool, // Inventory/crafting UI open; world clicks are ignored
    pub is_bait_verbose: bool, // Whether this player gets bait chat feedback
}

#[spacetimedb::table(name = active_connection, public)]
#[derive(Clone, Debug)]
pub struct ActiveConnection {
    #[primary_key]
    identity: Identity,
    // Store the ID of the current WebSocket connection for this identity
    connection_id: ConnectionId,
    timestamp: Timestamp,
}

// --- Lifecycle Reducers ---

// Called once when the module is published or updated
#[spacetimedb::reducer(init)]
pub fn init_module(ctx: &ReducerContext) -> Result<(), String> {
    log::info!("Initializing module...");

    crate::items::seed_items(ctx)?;
    crate::bait_config::init_bait_config(ctx)?;
    crate::tile_object::init_tile_status_cleanup_schedule(ctx)?;
    crate::chat::init_private_message_cleanup_schedule(ctx)?;

    log::info!("Module initialization complete.");
    Ok(())
}

#[spacetimedb::reducer(client_connected)]
pub fn identity_connected(ctx: &ReducerContext) -> Result<(), String> {
    // --- Track Active Connection ---
    let client_identity = ctx.sender;
    let connection_id = ctx.connection_id.ok_or_else(|| {
        log::error!("[Connect] Missing ConnectionId in client_connected context for {:?}", client_identity);
        "Internal error: Missing connection ID on connect".to_string()
    })?;

    log::info!("[Connect] Tracking active connection for identity {:?} with connection ID {:?}",
        client_identity, connection_id);

    let active_connections = ctx.db.active_connection();
    let new_active_conn = ActiveConnection {
        identity: client_identity,
        connection_id,
        timestamp: ctx.timestamp,
    };

    if active_connections.identity().find(&client_identity).is_some() {
        active_connections.identity().update(new_active_conn);
        log::info!("[Connect] Updated existing active connection record for {:?}.", client_identity);
    } else {
        active_connections.try_insert(new_active_conn).map_err(|e| {
            log::error!("[Connect] Failed to insert active connection for {:?}: {}", client_identity, e);
            format!("Failed to track connection: {}", e)
        })?;
        log::info!("[Connect] Inserted new active connection record for {:?}.", client_identity);
    }

    // --- Set Player Online Status ---
    let players = ctx.db.player();
    if let Some(mut player) = players.identity().find(&client_identity) {
        if !player.is_online {
            player.is_online = true;
            players.identity().update(player);
            log::info!("[Connect] Set player {:?} to online.", client_identity);
        }
    } else {
        // Not registered yet. is_online will be set during registration.
        log::debug!("[Connect] Player {:?} not found in Player table yet (likely needs registration).", client_identity);
    }

    Ok(())
}

#[spacetimedb::reducer(client_disconnected)]
pub fn identity_disconnected(ctx: &ReducerContext) {
    let sender_id = ctx.sender;
    let Some(disconnecting_connection_id) = ctx.connection_id else {
        log::error!("[Disconnect] Missing ConnectionId for {:?}. Cannot clean up.", sender_id);
        return;
    };

    let active_connections = ctx.db.active_connection();
    let players = ctx.db.player();

    let Some(active_conn) = active_connections.identity().find(&sender_id) else {
        log::info!("[Disconnect] No active connection record found for identity {:?}.", sender_id);
        return;
    };

    // A quick reconnect may already have replaced the record. Leave the new session alone.
    if active_conn.connection_id != disconnecting_connection_id {
        log::info!("[Disconnect] Stale disconnect for {:?}. Ignoring connection {:?}.", sender_id, disconnecting_connection_id);
        return;
    }

    active_connections.identity().delete(&sender_id);

    if let Some(mut player) = players.identity().find(&sender_id) {
        if player.is_online || player.is_menu_open {
            player.is_online = false;
            player.is_menu_open = false;
            players.identity().update(player);
            log::info!("[Disconnect] Set player {:?} to offline.", sender_id);
        }
    } else {
        log::warn!("[Disconnect] Player {:?} not found in Player table during disconnect cleanup.", sender_id);
    }

    crate::crab_pot::clear_bait_reserve(ctx, sender_id);
}

// Register a new player, or refresh an existing one on reconnect
#[spacetimedb::reducer]
pub fn register_player(ctx: &ReducerContext, username: String) -> Result<(), String> {
    let sender_id = ctx.sender;
    let players = ctx.db.player();
    log::info!("Attempting registration/login for identity: {:?}, username: {}", sender_id, username);

    let username = username.trim().to_string();
    if username.is_empty() {
        return Err("Username cannot be empty.".to_string());
    }

    if let Some(mut existing_player) = players.identity().find(&sender_id) {
        log::info!("[RegisterPlayer] Found existing player {} ({:?}).", existing_player.username, sender_id);
        existing_player.last_update = ctx.timestamp;
        existing_player.is_online = true;
        players.identity().update(existing_player);
        return Ok(());
    }

    let username_taken_by_other = players.iter().any(|p| p.username == username && p.identity != sender_id);
    if username_taken_by_other {
        log::warn!("Username '{}' already taken by another player. Registration failed for {:?}.", username, sender_id);
        return Err(format!("Username '{}' is already taken.", username));
    }

    let player = Player {
        identity: sender_id,
        username: username.clone(),
        position_x: SPAWN_X,
        position_y: SPAWN_Y,
        color: random_color(&username),
        direction: "down".to_string(),
        last_update: ctx.timestamp,
        is_online: true,
        is_menu_open: false,
        is_bait_verbose: crate::bait_config::default_bait_verbose(ctx),
    };

    players.try_insert(player).map_err(|e| {
        log::error!("Failed to insert new player {} ({:?}): {}", username, sender_id, e);
        "Failed to register player: Database error.".to_string()
    })?;
    log::info!("Player registered: {}. Granting starting items...", username);

    if let Err(e) = crate::starting_items::grant_starting_items(ctx, sender_id, &username) {
        log::error!("Unexpected error during grant_starting_items for player {}: {}", username, e);
    }
    Ok(())
}

/// Client reports whether an inventory or crafting menu is open.
#[spacetimedb::reducer]
pub fn set_menu_open(ctx: &ReducerContext, open: bool) -> Result<(), String> {
    let sender_id = ctx.sender;
    let players = ctx.db.player();

    let mut player = players.identity().find(&sender_id)
        .ok_or_else(|| "Player not found".to_string())?;
    if player.is_menu_open != open {
        player.is_menu_open = open;
        player.last_update = ctx.timestamp;
        players.identity().update(player);
        log::debug!("Player {:?} set menu open to {}", sender_id, open);
    }
    Ok(())
}

// Moves the player along a direction vector, clamped to the world.
#[spacetimedb::reducer]
pub fn update_player_position(ctx: &ReducerContext, move_x: f32, move_y: f32) -> Result<(), String> {
    let sender_id = ctx.sender;
    let players = ctx.db.player();

    let mut player = players.identity().find(&sender_id)
        .ok_or_else(|| "Player not found".to_string())?;

    if !move_x.is_finite() || !move_y.is_finite() {
        return Err("Invalid movement input.".to_string());
    }
    // Longer vectors are normalized so speed stays capped.
    let length = (move_x * move_x + move_y * move_y).sqrt();
    let (dir_x, dir_y) = if length > 1.0 { (move_x / length, move_y / length) } else { (move_x, move_y) };

    let now = ctx.timestamp;
    let elapsed_micros = now.to_micros_since_unix_epoch().saturating_sub(player.last_update.to_micros_since_unix_epoch());
    let delta_time_secs = (elapsed_micros as f32 / 1_000_000.0).min(0.05); // Clamp max delta time

    if dir_x.abs() > 0.01 || dir_y.abs() > 0.01 {
        let direction = if dir_x.abs() > dir_y.abs() {
            if dir_x > 0.0 { "right" } else { "left" }
        } else if dir_y > 0.0 {
            "down"
        } else {
            "up"
        };
        player.direction = direction.to_string();
    }

    player.position_x = (player.position_x + dir_x * PLAYER_SPEED * delta_time_secs)
        .clamp(PLAYER_RADIUS, WORLD_WIDTH_PX - PLAYER_RADIUS);
    player.position_y = (player.position_y + dir_y * PLAYER_SPEED * delta_time_secs)
        .clamp(PLAYER_RADIUS, WORLD_HEIGHT_PX - PLAYER_RADIUS);
    player.last_update = now;

    log::trace!("Player {:?} moved to ({:.1}, {:.1})", sender_id, player.position_x, player.position_y);
    players.identity().update(player);
    Ok(())
}

fn random_color(username: &str) -> String {
    let colors = [
        "#FF0000", // Red
        "#00FF00", // Green
        "#0000FF", // Blue
        "#FFFF00", // Yellow
        "#FF00FF", // Magenta
        "#00FFFF", // Cyan
        "#FF8000", // Orange
        "#8000FF", // Purple
    ];
    let sum_of_bytes: u64 = username.as_bytes().iter().map(|&byte| byte as u64).sum();
    let color_index = (sum_of_bytes % colors.len() as u64) as usize;
    colors[color_index].to_string()
}
