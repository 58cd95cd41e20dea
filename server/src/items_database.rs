//! Static item catalogue seeded into `item_definition`.
//!
//! The food entries keep the numeric IDs used by the default bait mapping in
//! `bait_config`, so the defaults resolve out of the box.

use crate::items::{ItemCategory, ItemDefinition};

pub const STONE_ITEM_ID: u64 = 2;

const FOOD_STACK_SIZE: u32 = 20;

// (id, name, icon)
const FOOD_ITEMS: &[(u64, &str, &str)] = &[
    (17, "Bush Lime", "bush_lime.png"),
    (19, "Cooked Meat", "cooked_meat.png"),
    (21, "Raw Meat", "raw_meat.png"),
    (297, "Banana", "banana.png"),
    (300, "Apple", "apple.png"),
    (308, "Raw Turkey Drumstick", "raw_turkey_drumstick.png"),
    (310, "Cooked Drumstick", "cooked_drumstick.png"),
    (344, "Animal Food", "animal_food.png"),
    (584, "Raw Giant Drumstick", "raw_giant_drumstick.png"),
    (646, "Cooked Giant Drumstick", "cooked_giant_drumstick.png"),
    (647, "Cooked Croco Meat", "cooked_croco_meat.png"),
    (648, "Raw Croco Meat", "raw_croco_meat.png"),
    (685, "Meat Pie", "meat_pie.png"),
    (691, "Meat On A Stick", "meat_on_a_stick.png"),
    (770, "Quandong", "quandong.png"),
    (1168, "Raw Grub Meat", "raw_grub_meat.png"),
    (1169, "Cooked Grub Meat", "cooked_grub_meat.png"),
];

pub fn get_initial_item_definitions() -> Vec<ItemDefinition> {
    let mut defs: Vec<ItemDefinition> = FOOD_ITEMS
        .iter()
        .map(|(id, name, icon)| ItemDefinition {
            id: *id,
            name: name.to_string(),
            description: "Edible. Crabs seem to like it too.".to_string(),
            category: ItemCategory::Consumable,
            icon_asset_name: icon.to_string(),
            is_stackable: true,
            stack_size: FOOD_STACK_SIZE,
        })
        .collect();

    defs.push(ItemDefinition {
        id: STONE_ITEM_ID,
        name: "Stone".to_string(),
        description: "A common building material.".to_string(),
        category: ItemCategory::Material,
        icon_asset_name: "stone.png".to_string(),
        is_stackable: true,
        stack_size: 1000,
    });

    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalogue_ids_are_unique() {
        let defs = get_initial_item_definitions();
        let ids: HashSet<u64> = defs.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), defs.len());
    }

    #[test]
    fn every_default_bait_input_has_a_definition() {
        let defs = get_initial_item_definitions();
        let parsed = crate::bait_mapping::parse_mapping(
            crate::bait_config::DEFAULT_VALID_INPUTS,
            crate::bait_config::DEFAULT_BAIT_PER_ITEM,
        );
        for entry in parsed.mapping.entries() {
            assert!(
                defs.iter().any(|d| d.id as i64 == entry.item_id),
                "no item definition for bait input {}",
                entry.item_id
            );
        }
    }
}
