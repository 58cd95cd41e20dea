use spacetimedb::{table, reducer, ReducerContext, Table};
use log;

use crate::bait_mapping::{parse_mapping, BaitMapping, MappingEntry};
use crate::pot_fill::PotSettings;
use crate::player as PlayerTableTrait;

// --- Defaults ---
// Item IDs and yields are positionally paired.
pub const DEFAULT_VERBOSE: bool = true;
pub const DEFAULT_VALID_INPUTS: &str = "19,21,308,310,584,646,647,648,685,691,1168,1169,300,297,17,770,344";
pub const DEFAULT_BAIT_PER_ITEM: &str = "8,4,4,7,5,15,18,6,23,16,10,10,1,1,1,1,1";
pub const DEFAULT_CRAB_POT_OBJECT_ID: i32 = 117;

// --- BaitConfig Table Definition ---

#[table(name = bait_config, public)]
#[derive(Clone, Debug)]
pub struct BaitConfig {
    #[primary_key]
    pub id: u8, // Singleton table, ID will always be 0
    pub verbose: bool, // default feedback setting for newly registered players
    pub valid_inputs: String,  // comma separated item IDs
    pub bait_per_item: String, // comma separated portions, same order as valid_inputs
    pub pot_object_id: i32,
}

impl BaitConfig {
    /// Fill settings for one player. Feedback follows that player's own choice.
    pub fn pot_settings(&self, player_verbose: bool) -> PotSettings {
        PotSettings { pot_object_id: self.pot_object_id, verbose: player_verbose }
    }
}

/// Parsed mapping, one row per usable pair. Written once in `init`.
#[table(name = bait_mapping_entry, public)]
#[derive(Clone, Debug)]
pub struct BaitMappingEntry {
    #[primary_key]
    pub position: u32, // lookup order
    pub item_id: i64,
    pub portions: u32,
}

pub fn init_bait_config(ctx: &ReducerContext) -> Result<(), String> {
    let config_table = ctx.db.bait_config();
    if config_table.iter().count() == 0 {
        log::info!("Initializing BaitConfig table with default bait mapping (pot object {}).", DEFAULT_CRAB_POT_OBJECT_ID);
        match config_table.try_insert(BaitConfig {
            id: 0,
            verbose: DEFAULT_VERBOSE,
            valid_inputs: DEFAULT_VALID_INPUTS.to_string(),
            bait_per_item: DEFAULT_BAIT_PER_ITEM.to_string(),
            pot_object_id: DEFAULT_CRAB_POT_OBJECT_ID,
        }) {
            Ok(_) => log::info!("BaitConfig table initialized."),
            Err(e) => {
                log::error!("Failed to initialize BaitConfig table: {}", e);
                return Err(format!("Failed to init BaitConfig: {}", e));
            }
        }
    } else {
        log::debug!("BaitConfig table already initialized.");
    }

    load_bait_mapping(ctx)
}

// Parses the configured lists and replaces the stored mapping.
fn load_bait_mapping(ctx: &ReducerContext) -> Result<(), String> {
    let config = get_bait_config(ctx)?;
    let parsed = parse_mapping(&config.valid_inputs, &config.bait_per_item);

    let entries_table = ctx.db.bait_mapping_entry();
    let stale: Vec<u32> = entries_table.iter().map(|row| row.position).collect();
    for position in stale {
        entries_table.position().delete(position);
    }

    for (position, entry) in parsed.mapping.entries().iter().enumerate() {
        entries_table.try_insert(BaitMappingEntry {
            position: position as u32,
            item_id: entry.item_id,
            portions: entry.portions,
        }).map_err(|e| format!("Failed to store bait mapping entry {}: {}", position, e))?;
    }

    if parsed.mapping.is_empty() {
        log::warn!("[BaitConfig] Bait mapping is empty. No item will fill crab pots.");
    } else if parsed.diagnostics.is_empty() {
        log::info!("[BaitConfig] Loaded {} bait mapping entries.", parsed.mapping.len());
    } else {
        log::warn!("[BaitConfig] Loaded {} bait mapping entries with {} configuration problem(s).",
            parsed.mapping.len(), parsed.diagnostics.len());
    }
    Ok(())
}

pub fn get_bait_config(ctx: &ReducerContext) -> Result<BaitConfig, String> {
    ctx.db.bait_config().id().find(0)
        .ok_or_else(|| "BaitConfig not found. Was the module initialized?".to_string())
}

/// Reads the stored mapping back in lookup order.
pub fn get_bait_mapping(ctx: &ReducerContext) -> BaitMapping {
    let mut rows: Vec<BaitMappingEntry> = ctx.db.bait_mapping_entry().iter().collect();
    rows.sort_by_key(|row| row.position);
    BaitMapping::new(rows.into_iter().map(|row| MappingEntry { item_id: row.item_id, portions: row.portions }).collect())
}

/// Feedback setting a new player starts with.
pub fn default_bait_verbose(ctx: &ReducerContext) -> bool {
    get_bait_config(ctx).map(|config| config.verbose).unwrap_or(DEFAULT_VERBOSE)
}

/// Turns bait chat feedback on or off for the calling player only.
#[reducer]
pub fn set_bait_verbose(ctx: &ReducerContext, verbose: bool) -> Result<(), String> {
    let sender_id = ctx.sender;
    let players = ctx.db.player();
    let mut player = players.identity().find(&sender_id)
        .ok_or_else(|| "Player not found".to_string())?;
    if player.is_bait_verbose == verbose {
        return Ok(());
    }
    player.is_bait_verbose = verbose;
    players.identity().update(player);
    log::info!("Player {:?} set bait verbose output to {}.", sender_id, verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> BaitConfig {
        BaitConfig {
            id: 0,
            verbose: DEFAULT_VERBOSE,
            valid_inputs: DEFAULT_VALID_INPUTS.to_string(),
            bait_per_item: DEFAULT_BAIT_PER_ITEM.to_string(),
            pot_object_id: DEFAULT_CRAB_POT_OBJECT_ID,
        }
    }

    #[test]
    fn settings_follow_each_players_choice() {
        let config = default_config();
        let quiet = config.pot_settings(false);
        let chatty = config.pot_settings(true);
        assert!(!quiet.verbose);
        assert!(chatty.verbose);
        assert_eq!(quiet.pot_object_id, DEFAULT_CRAB_POT_OBJECT_ID);
        assert_eq!(chatty.pot_object_id, DEFAULT_CRAB_POT_OBJECT_ID);
    }

    #[test]
    fn server_default_does_not_override_a_player() {
        let mut config = default_config();
        config.verbose = false;
        assert!(config.pot_settings(true).verbose);
    }
}
