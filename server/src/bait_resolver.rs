use crate::bait_mapping::{BaitMapping, ItemId};

/// Looks up how many bait portions a held item yields.
///
/// First match in mapping order wins. Empty hands (`item_id <= 0`) and items
/// that are not configured both resolve to `None`.
pub fn resolve(item_id: ItemId, mapping: &BaitMapping) -> Option<u32> {
    if item_id <= 0 {
        return None;
    }
    mapping
        .entries()
        .iter()
        .find(|entry| entry.item_id == item_id)
        .map(|entry| entry.portions)
}

impl BaitMapping {
    pub fn resolve(&self, item_id: ItemId) -> Option<u32> {
        resolve(item_id, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bait_mapping::MappingEntry;

    fn mapping(pairs: &[(ItemId, u32)]) -> BaitMapping {
        BaitMapping::new(pairs.iter().map(|&(item_id, portions)| MappingEntry { item_id, portions }).collect())
    }

    #[test]
    fn resolves_configured_items() {
        let m = mapping(&[(19, 8), (21, 4), (300, 1)]);
        assert_eq!(resolve(19, &m), Some(8));
        assert_eq!(resolve(21, &m), Some(4));
        assert_eq!(m.resolve(300), Some(1));
    }

    #[test]
    fn unknown_and_empty_hands_are_not_found() {
        let m = mapping(&[(19, 8)]);
        assert_eq!(resolve(20, &m), None);
        assert_eq!(resolve(0, &m), None);
        assert_eq!(resolve(-1, &m), None);
        assert_eq!(resolve(19, &BaitMapping::default()), None);
    }

    #[test]
    fn non_positive_ids_never_match_even_if_configured() {
        let m = mapping(&[(0, 3), (-5, 2)]);
        assert_eq!(resolve(0, &m), None);
        assert_eq!(resolve(-5, &m), None);
    }

    #[test]
    fn first_duplicate_wins() {
        let m = mapping(&[(19, 8), (19, 2)]);
        assert_eq!(resolve(19, &m), Some(8));
    }
}
