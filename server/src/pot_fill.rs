/******************************************************************************
 *                                                                            *
 * Crab pot fill state machine. Turns the held item into a reserve of bait    *
 * portions, spends one portion per fill, advances the pot's growth stage     *
 * and replicates it. The world, inventory, replication and chat are reached  *
 * only through the collaborator traits below so the rules can run against    *
 * SpacetimeDB tables or an in-memory host alike.                             *
 *                                                                            *
 ******************************************************************************/

use log;

use crate::bait_feedback::{self, Feedback};
use crate::bait_mapping::{BaitMapping, ItemId};

/// Growth stage of an empty pot. Anything above this counts as full.
pub const EMPTY_GROWTH_STAGE: i32 = 0;
/// The single stage a pot is advanced to when filled.
pub const FILLED_GROWTH_STAGE: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRef {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

// --- Collaborators ---
// Queries return None when the underlying object is not available.

pub trait PotWorld {
    /// The tile the player is currently aiming at.
    fn target_tile(&self) -> Option<TileRef>;
    fn tile_object_id_at(&self, x: i32, y: i32, z: i32) -> Option<i32>;
    fn growth_stage_at(&self, x: i32, z: i32) -> Option<i32>;
    fn set_growth_stage(&mut self, x: i32, z: i32, stage: i32);
}

pub trait BaitInventory {
    fn is_menu_open(&self) -> Option<bool>;
    /// Item in the selected slot; `Some(0)` for an empty slot.
    fn selected_item_id(&self) -> Option<ItemId>;
    fn item_name(&self, item_id: ItemId) -> Option<String>;
    /// Removes one unit from the selected stack, returning what is left.
    fn decrement_selected_stack(&mut self) -> Option<u32>;
    fn on_hands_emptied(&mut self);
}

pub trait StageReplicator {
    /// Fire-and-forget.
    fn broadcast_stage_change(&mut self, stage: i32, x: i32, z: i32);
}

pub trait Notifier {
    /// Best-effort; must not fail.
    fn notify(&mut self, feedback: &Feedback);
}

/// Everything `attempt_fill` needs from its surroundings.
pub trait FillHost: PotWorld + BaitInventory + StageReplicator + Notifier {}

impl<T: PotWorld + BaitInventory + StageReplicator + Notifier> FillHost for T {}

// --- Results ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MenuOpen,
    NotAPot,
    AlreadyFull,
    Unavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoBaitReason {
    EmptyHands,
    NotBait { item_id: ItemId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillAttemptResult {
    Rejected(RejectReason),
    NoValidItem(NoBaitReason),
    /// An item was turned into `portions` bait and one portion went into the pot.
    Consumed { item_id: ItemId, portions: u32, remaining: u32 },
    /// The pot was filled from the existing reserve.
    Advanced { remaining: u32 },
}

impl FillAttemptResult {
    pub fn filled_pot(&self) -> bool {
        matches!(self, FillAttemptResult::Consumed { .. } | FillAttemptResult::Advanced { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillState {
    Idle,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PotSettings {
    /// Tile object type that accepts bait.
    pub pot_object_id: i32,
    /// When false, no feedback reaches the player.
    pub verbose: bool,
}

// --- State Machine ---

#[derive(Clone, Debug)]
pub struct PotFillStateMachine {
    mapping: BaitMapping,
    settings: PotSettings,
    portions_remaining: u32,
}

impl PotFillStateMachine {
    pub fn new(mapping: BaitMapping, settings: PotSettings) -> Self {
        Self { mapping, settings, portions_remaining: 0 }
    }

    /// Resumes with a reserve carried over from earlier calls in the same session.
    pub fn with_reserve(mut self, portions_remaining: u32) -> Self {
        self.portions_remaining = portions_remaining;
        self
    }

    pub fn portions_remaining(&self) -> u32 {
        self.portions_remaining
    }

    pub fn state(&self) -> FillState {
        if self.portions_remaining == 0 { FillState::Idle } else { FillState::Reserved }
    }

    /// One primary-action press against the targeted tile.
    ///
    /// Every early return leaves the reserve, the tile and the inventory
    /// untouched.
    pub fn attempt_fill<H: FillHost>(&mut self, host: &mut H) -> FillAttemptResult {
        let tile = match self.check_target(host) {
            Ok(tile) => tile,
            Err(reason) => {
                log::debug!("[PotFill] Fill rejected: {:?}", reason);
                return FillAttemptResult::Rejected(reason);
            }
        };

        let mut consumed: Option<(ItemId, u32)> = None;

        if self.portions_remaining == 0 {
            let Some(held_item_id) = host.selected_item_id() else {
                return FillAttemptResult::Rejected(RejectReason::Unavailable);
            };

            if held_item_id <= 0 {
                self.emit(host, bait_feedback::empty_hands_feedback());
                return FillAttemptResult::NoValidItem(NoBaitReason::EmptyHands);
            }

            let item_name = host.item_name(held_item_id)
                .unwrap_or_else(|| format!("Item #{}", held_item_id));

            let Some(portions) = self.mapping.resolve(held_item_id) else {
                log::debug!("[PotFill] Item {} ({}) is not configured as bait.", held_item_id, item_name);
                self.emit(host, bait_feedback::not_bait_feedback(&item_name));
                return FillAttemptResult::NoValidItem(NoBaitReason::NotBait { item_id: held_item_id });
            };

            let Some(stack_left) = host.decrement_selected_stack() else {
                return FillAttemptResult::Rejected(RejectReason::Unavailable);
            };
            if stack_left == 0 {
                host.on_hands_emptied();
            }

            log::info!("[PotFill] Converted one {} (item {}) into {} bait. {} left in stack.",
                item_name, held_item_id, portions, stack_left);
            self.emit(host, bait_feedback::bait_made_feedback(&item_name, portions));

            self.portions_remaining = portions;
            consumed = Some((held_item_id, portions));
        }

        self.portions_remaining -= 1;
        host.set_growth_stage(tile.x, tile.z, FILLED_GROWTH_STAGE);
        host.broadcast_stage_change(FILLED_GROWTH_STAGE, tile.x, tile.z);

        let remaining = self.portions_remaining;
        self.emit(host, bait_feedback::fill_feedback(consumed.map(|(_, portions)| portions), remaining));

        log::debug!("[PotFill] Filled pot at ({}, {}, {}). {} bait left in reserve.", tile.x, tile.y, tile.z, remaining);

        match consumed {
            Some((item_id, portions)) => FillAttemptResult::Consumed { item_id, portions, remaining },
            None => FillAttemptResult::Advanced { remaining },
        }
    }

    // Menu, target and pot checks. Pure reads.
    fn check_target<H: FillHost>(&self, host: &H) -> Result<TileRef, RejectReason> {
        if host.is_menu_open().ok_or(RejectReason::Unavailable)? {
            return Err(RejectReason::MenuOpen);
        }

        let tile = host.target_tile().ok_or(RejectReason::Unavailable)?;
        let object_id = host.tile_object_id_at(tile.x, tile.y, tile.z).ok_or(RejectReason::Unavailable)?;
        if object_id != self.settings.pot_object_id {
            return Err(RejectReason::NotAPot);
        }

        // Silent on purpose: players click full pots constantly.
        let stage = host.growth_stage_at(tile.x, tile.z).ok_or(RejectReason::Unavailable)?;
        if stage > EMPTY_GROWTH_STAGE {
            return Err(RejectReason::AlreadyFull);
        }

        Ok(tile)
    }

    fn emit<H: FillHost>(&self, host: &mut H, feedback: Feedback) {
        if self.settings.verbose && !feedback.is_silent() {
            host.notify(&feedback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bait_feedback::FeedbackTier;
    use crate::bait_mapping::MappingEntry;
    use std::collections::HashMap;

    const POT: i32 = 117;

    struct TestHost {
        menu_open: Option<bool>,
        target: Option<TileRef>,
        tile_objects: HashMap<(i32, i32, i32), i32>,
        stages: HashMap<(i32, i32), i32>,
        held_item: Option<ItemId>,
        stack: u32,
        stack_available: bool,
        names: HashMap<ItemId, String>,
        hands_emptied: u32,
        debits: u32,
        broadcasts: Vec<(i32, i32, i32)>,
        messages: Vec<Feedback>,
    }

    impl TestHost {
        fn aiming_at_empty_pot() -> Self {
            let tile = TileRef { x: 4, y: 0, z: 9 };
            let mut tile_objects = HashMap::new();
            tile_objects.insert((tile.x, tile.y, tile.z), POT);
            let mut stages = HashMap::new();
            stages.insert((tile.x, tile.z), EMPTY_GROWTH_STAGE);
            let mut names = HashMap::new();
            names.insert(19, "Cooked Meat".to_string());
            names.insert(300, "Apple".to_string());
            names.insert(2, "Stone".to_string());
            Self {
                menu_open: Some(false),
                target: Some(tile),
                tile_objects,
                stages,
                held_item: Some(0),
                stack: 0,
                stack_available: true,
                names,
                hands_emptied: 0,
                debits: 0,
                broadcasts: Vec::new(),
                messages: Vec::new(),
            }
        }

        fn holding(mut self, item_id: ItemId, stack: u32) -> Self {
            self.held_item = Some(item_id);
            self.stack = stack;
            self
        }

        fn stage(&self) -> i32 {
            let tile = self.target.unwrap();
            self.stages[&(tile.x, tile.z)]
        }

        fn empty_pot(&mut self) {
            let tile = self.target.unwrap();
            self.stages.insert((tile.x, tile.z), EMPTY_GROWTH_STAGE);
        }

        fn texts(&self) -> Vec<&str> {
            self.messages.iter().map(|m| m.text.as_str()).collect()
        }
    }

    impl PotWorld for TestHost {
        fn target_tile(&self) -> Option<TileRef> {
            self.target
        }
        fn tile_object_id_at(&self, x: i32, y: i32, z: i32) -> Option<i32> {
            self.tile_objects.get(&(x, y, z)).copied()
        }
        fn growth_stage_at(&self, x: i32, z: i32) -> Option<i32> {
            self.stages.get(&(x, z)).copied()
        }
        fn set_growth_stage(&mut self, x: i32, z: i32, stage: i32) {
            self.stages.insert((x, z), stage);
        }
    }

    impl BaitInventory for TestHost {
        fn is_menu_open(&self) -> Option<bool> {
            self.menu_open
        }
        fn selected_item_id(&self) -> Option<ItemId> {
            self.held_item
        }
        fn item_name(&self, item_id: ItemId) -> Option<String> {
            self.names.get(&item_id).cloned()
        }
        fn decrement_selected_stack(&mut self) -> Option<u32> {
            if !self.stack_available {
                return None;
            }
            self.debits += 1;
            self.stack -= 1;
            if self.stack == 0 {
                self.held_item = Some(0);
            }
            Some(self.stack)
        }
        fn on_hands_emptied(&mut self) {
            self.hands_emptied += 1;
        }
    }

    impl StageReplicator for TestHost {
        fn broadcast_stage_change(&mut self, stage: i32, x: i32, z: i32) {
            self.broadcasts.push((stage, x, z));
        }
    }

    impl Notifier for TestHost {
        fn notify(&mut self, feedback: &Feedback) {
            self.messages.push(feedback.clone());
        }
    }

    fn machine(pairs: &[(ItemId, u32)]) -> PotFillStateMachine {
        let mapping = BaitMapping::new(pairs.iter().map(|&(item_id, portions)| MappingEntry { item_id, portions }).collect());
        PotFillStateMachine::new(mapping, PotSettings { pot_object_id: POT, verbose: true })
    }

    #[test]
    fn cooked_meat_fills_eight_pots() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);

        let result = pot.attempt_fill(&mut host);
        assert_eq!(result, FillAttemptResult::Consumed { item_id: 19, portions: 8, remaining: 7 });
        assert_eq!(host.stack, 4);
        assert_eq!(pot.portions_remaining(), 7);
        assert_eq!(pot.state(), FillState::Reserved);
        assert_eq!(host.stage(), FILLED_GROWTH_STAGE);
        assert_eq!(host.broadcasts, vec![(FILLED_GROWTH_STAGE, 4, 9)]);
        assert_eq!(host.texts(), vec!["Cooked Meat makes 8 bait!", "7 bait left"]);

        for expected in (1..=6).rev() {
            host.empty_pot();
            host.messages.clear();
            let result = pot.attempt_fill(&mut host);
            assert_eq!(result, FillAttemptResult::Advanced { remaining: expected });
            assert_eq!(host.texts(), vec![format!("{} bait left", expected)]);
        }
        assert_eq!(host.stack, 4);
        assert_eq!(host.debits, 1);

        host.empty_pot();
        host.messages.clear();
        let result = pot.attempt_fill(&mut host);
        assert_eq!(result, FillAttemptResult::Advanced { remaining: 0 });
        assert_eq!(host.texts(), vec!["You use the last of your bait"]);
        assert_eq!(pot.state(), FillState::Idle);
        assert_eq!(host.broadcasts.len(), 8);
    }

    #[test]
    fn reserve_is_spent_without_checking_hands() {
        let mut pot = machine(&[(19, 8)]).with_reserve(3);
        let mut host = TestHost::aiming_at_empty_pot();

        let result = pot.attempt_fill(&mut host);
        assert_eq!(result, FillAttemptResult::Advanced { remaining: 2 });
        assert_eq!(host.debits, 0);
        assert_eq!(host.texts(), vec!["2 bait left"]);
    }

    #[test]
    fn each_item_pays_for_exactly_its_yield() {
        let mut pot = machine(&[(21, 4)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(21, 3);
        host.names.insert(21, "Raw Meat".to_string());

        let mut fills = 0;
        for _ in 0..12 {
            host.empty_pot();
            if pot.attempt_fill(&mut host).filled_pot() {
                fills += 1;
            }
        }
        assert_eq!(fills, 12);
        assert_eq!(host.debits, 3);
        assert_eq!(host.stack, 0);
        assert_eq!(pot.portions_remaining(), 0);
    }

    #[test]
    fn unknown_item_is_refused_by_name() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(2, 10);

        let result = pot.attempt_fill(&mut host);
        assert_eq!(result, FillAttemptResult::NoValidItem(NoBaitReason::NotBait { item_id: 2 }));
        assert_eq!(host.stack, 10);
        assert_eq!(host.stage(), EMPTY_GROWTH_STAGE);
        assert!(host.broadcasts.is_empty());
        assert_eq!(pot.portions_remaining(), 0);
        assert_eq!(host.texts(), vec!["Stone isn't good bait"]);
        assert_eq!(host.messages[0].tier, FeedbackTier::Warning);
    }

    #[test]
    fn unnamed_item_falls_back_to_its_id() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(4242, 1);

        pot.attempt_fill(&mut host);
        assert_eq!(host.texts(), vec!["Item #4242 isn't good bait"]);
    }

    #[test]
    fn empty_hands_are_refused() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot();

        let result = pot.attempt_fill(&mut host);
        assert_eq!(result, FillAttemptResult::NoValidItem(NoBaitReason::EmptyHands));
        assert_eq!(host.stage(), EMPTY_GROWTH_STAGE);
        assert_eq!(host.debits, 0);
        assert_eq!(host.texts(), vec!["Empty hands won't fill crabpots!"]);
    }

    #[test]
    fn single_portion_items_fill_silently() {
        let mut pot = machine(&[(300, 1)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(300, 2);

        for _ in 0..2 {
            host.empty_pot();
            let result = pot.attempt_fill(&mut host);
            assert_eq!(result, FillAttemptResult::Consumed { item_id: 300, portions: 1, remaining: 0 });
        }
        assert!(host.messages.is_empty());
        assert_eq!(host.debits, 2);
        assert_eq!(host.hands_emptied, 1);
    }

    #[test]
    fn last_item_in_stack_empties_hands() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(19, 1);

        pot.attempt_fill(&mut host);
        assert_eq!(host.hands_emptied, 1);
        assert_eq!(host.stack, 0);
    }

    #[test]
    fn full_pot_is_never_touched() {
        for reserve in [0, 1, 5] {
            let mut pot = machine(&[(19, 8)]).with_reserve(reserve);
            let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
            let tile = host.target.unwrap();
            host.stages.insert((tile.x, tile.z), FILLED_GROWTH_STAGE);

            let result = pot.attempt_fill(&mut host);
            assert_eq!(result, FillAttemptResult::Rejected(RejectReason::AlreadyFull));
            assert_eq!(pot.portions_remaining(), reserve);
            assert_eq!(host.stack, 5);
            assert_eq!(host.stage(), FILLED_GROWTH_STAGE);
            assert!(host.broadcasts.is_empty());
            assert!(host.messages.is_empty());
        }
    }

    #[test]
    fn open_menu_blocks_filling() {
        let mut pot = machine(&[(19, 8)]).with_reserve(2);
        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.menu_open = Some(true);

        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::MenuOpen));
        assert_eq!(pot.portions_remaining(), 2);
        assert_eq!(host.stage(), EMPTY_GROWTH_STAGE);
    }

    #[test]
    fn other_tile_objects_are_ignored() {
        let mut pot = machine(&[(19, 8)]);
        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        let tile = host.target.unwrap();
        host.tile_objects.insert((tile.x, tile.y, tile.z), 42);

        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::NotAPot));
        assert_eq!(host.stack, 5);
        assert!(host.messages.is_empty());
    }

    #[test]
    fn missing_collaborators_turn_into_no_ops() {
        let mut pot = machine(&[(19, 8)]);

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.target = None;
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.menu_open = None;
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.held_item = None;
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.tile_objects.clear();
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.stages.clear();
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));
        assert_eq!(host.stack, 5);
        assert!(host.broadcasts.is_empty());

        let mut host = TestHost::aiming_at_empty_pot().holding(19, 5);
        host.stack_available = false;
        assert_eq!(pot.attempt_fill(&mut host), FillAttemptResult::Rejected(RejectReason::Unavailable));
        assert_eq!(host.stage(), EMPTY_GROWTH_STAGE);
        assert!(host.messages.is_empty());

        assert_eq!(pot.portions_remaining(), 0);
    }

    #[test]
    fn quiet_mode_suppresses_every_message() {
        let mapping = BaitMapping::new(vec![MappingEntry { item_id: 19, portions: 8 }]);
        let mut pot = PotFillStateMachine::new(mapping, PotSettings { pot_object_id: POT, verbose: false });

        let mut host = TestHost::aiming_at_empty_pot();
        pot.attempt_fill(&mut host);
        let mut host = host.holding(2, 1);
        pot.attempt_fill(&mut host);
        let mut host = host.holding(19, 1);
        let result = pot.attempt_fill(&mut host);

        assert!(result.filled_pot());
        assert!(host.messages.is_empty());
    }

    #[test]
    fn one_players_quiet_setting_leaves_others_informed() {
        let mapping = BaitMapping::new(vec![MappingEntry { item_id: 19, portions: 8 }]);
        let mut quiet_pot = PotFillStateMachine::new(mapping.clone(), PotSettings { pot_object_id: POT, verbose: false });
        let mut chatty_pot = PotFillStateMachine::new(mapping, PotSettings { pot_object_id: POT, verbose: true });

        let mut quiet_host = TestHost::aiming_at_empty_pot().holding(19, 5);
        let mut chatty_host = TestHost::aiming_at_empty_pot().holding(19, 5);

        assert!(quiet_pot.attempt_fill(&mut quiet_host).filled_pot());
        assert!(chatty_pot.attempt_fill(&mut chatty_host).filled_pot());

        assert!(quiet_host.messages.is_empty());
        assert_eq!(chatty_host.texts(), vec!["Cooked Meat makes 8 bait!", "7 bait left"]);
        assert_eq!(quiet_pot.portions_remaining(), chatty_pot.portions_remaining());
    }
}
