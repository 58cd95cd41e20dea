//! Chooses what, if anything, the player is told after a fill attempt.
//! Everything here is pure; delivery and the verbose gate live in `pot_fill`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackTier {
    Silent,
    Informational,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub tier: FeedbackTier,
    pub text: String,
}

impl Feedback {
    pub fn silent() -> Self {
        Self { tier: FeedbackTier::Silent, text: String::new() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { tier: FeedbackTier::Informational, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { tier: FeedbackTier::Warning, text: text.into() }
    }

    pub fn is_silent(&self) -> bool {
        self.tier == FeedbackTier::Silent
    }
}

/// Message after a pot was filled.
///
/// `yield_consumed` is `Some` only when an item was turned into bait on this
/// call. Single-portion items stay quiet so spam-clicking apples does not
/// flood the chat.
pub fn fill_feedback(yield_consumed: Option<u32>, remaining_after: u32) -> Feedback {
    match (yield_consumed, remaining_after) {
        (Some(1), _) => Feedback::silent(),
        (_, 0) => Feedback::info("You use the last of your bait"),
        (_, remaining) => Feedback::info(format!("{} bait left", remaining)),
    }
}

/// One-off message when an item that yields several portions is turned into bait.
pub fn bait_made_feedback(item_name: &str, portions: u32) -> Feedback {
    if portions > 1 {
        Feedback::info(format!("{} makes {} bait!", item_name, portions))
    } else {
        Feedback::silent()
    }
}

pub fn empty_hands_feedback() -> Feedback {
    Feedback::warning("Empty hands won't fill crabpots!")
}

pub fn not_bait_feedback(item_name: &str) -> Feedback {
    Feedback::warning(format!("{} isn't good bait", item_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_portion_items_are_silent() {
        assert!(fill_feedback(Some(1), 0).is_silent());
        assert!(bait_made_feedback("Apple", 1).is_silent());
    }

    #[test]
    fn last_portion_is_announced() {
        assert_eq!(fill_feedback(None, 0), Feedback::info("You use the last of your bait"));
        assert_eq!(fill_feedback(Some(8), 0).text, "You use the last of your bait");
    }

    #[test]
    fn remaining_count_is_reported() {
        assert_eq!(fill_feedback(Some(8), 7), Feedback::info("7 bait left"));
        assert_eq!(fill_feedback(None, 3).text, "3 bait left");
    }

    #[test]
    fn multi_portion_conversion_names_the_item() {
        let feedback = bait_made_feedback("Cooked Meat", 8);
        assert_eq!(feedback.tier, FeedbackTier::Informational);
        assert_eq!(feedback.text, "Cooked Meat makes 8 bait!");
    }

    #[test]
    fn rejections_are_warnings() {
        assert_eq!(empty_hands_feedback().tier, FeedbackTier::Warning);
        let feedback = not_bait_feedback("Stone");
        assert_eq!(feedback.tier, FeedbackTier::Warning);
        assert_eq!(feedback.text, "Stone isn't good bait");
    }
}
