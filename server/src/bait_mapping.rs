/******************************************************************************
 *                                                                            *
 * Parses the two comma separated configuration lists (item IDs and bait      *
 * yields) into an ordered item -> portions mapping. Malformed tokens are     *
 * skipped and reported, never substituted, and parsing never fails.          *
 *                                                                            *
 ******************************************************************************/

use log;
use std::fmt;

/// Item identifiers as used by the bait mapping. Values <= 0 mean "nothing held".
pub type ItemId = i64;

/// One configured pairing of an item to the number of bait portions it yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    pub item_id: ItemId,
    pub portions: u32,
}

/// Ordered, immutable item -> yield mapping. Duplicates are allowed; lookups
/// use the first entry for an item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaitMapping {
    entries: Vec<MappingEntry>,
}

impl BaitMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which configuration list a diagnostic refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingList {
    ItemIds,
    Yields,
}

impl fmt::Display for MappingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingList::ItemIds => write!(f, "validInputs"),
            MappingList::Yields => write!(f, "baitPerItem"),
        }
    }
}

/// Problems found while loading the mapping. None of them are fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingDiagnostic {
    MalformedToken { list: MappingList, position: usize, token: String },
    NonPositiveYield { position: usize, value: i64 },
    YieldOutOfRange { position: usize, value: i64 },
    LengthMismatch { ids: usize, yields: usize },
}

impl fmt::Display for MappingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingDiagnostic::MalformedToken { list, position, token } => {
                write!(f, "{} token #{} ({:?}) is malformed and was skipped", list, position, token)
            }
            MappingDiagnostic::NonPositiveYield { position, value } => {
                write!(f, "baitPerItem token #{} ({}) must be greater than zero and was skipped", position, value)
            }
            MappingDiagnostic::YieldOutOfRange { position, value } => {
                write!(f, "baitPerItem token #{} ({}) exceeds the maximum of {} and was skipped", position, value, u32::MAX)
            }
            MappingDiagnostic::LengthMismatch { ids, yields } => {
                write!(f, "validInputs has {} usable entries but baitPerItem has {}; only the first {} pairs are used",
                    ids, yields, ids.min(yields))
            }
        }
    }
}

/// Result of loading a mapping: the usable pairs plus everything that was wrong.
#[derive(Clone, Debug, Default)]
pub struct ParsedMapping {
    pub mapping: BaitMapping,
    pub diagnostics: Vec<MappingDiagnostic>,
}

/// Builds the bait mapping from the raw `validInputs` and `baitPerItem` strings.
///
/// Each list is parsed on its own (bad tokens dropped), then the two are
/// paired by position. A length mismatch stops pairing at the shorter list
/// and is reported once.
pub fn parse_mapping(ids_csv: &str, yields_csv: &str) -> ParsedMapping {
    let mut diagnostics = Vec::new();

    let ids = parse_int_list(ids_csv, MappingList::ItemIds, &mut diagnostics);
    let yields: Vec<u32> = parse_int_list(yields_csv, MappingList::Yields, &mut diagnostics)
        .into_iter()
        .filter_map(|(position, value)| {
            if value <= 0 {
                diagnostics.push(MappingDiagnostic::NonPositiveYield { position, value });
                return None;
            }
            match u32::try_from(value) {
                Ok(portions) => Some(portions),
                Err(_) => {
                    diagnostics.push(MappingDiagnostic::YieldOutOfRange { position, value });
                    None
                }
            }
        })
        .collect();

    if ids.len() != yields.len() {
        diagnostics.push(MappingDiagnostic::LengthMismatch { ids: ids.len(), yields: yields.len() });
    }

    let entries = ids
        .into_iter()
        .zip(yields)
        .map(|((_, item_id), portions)| MappingEntry { item_id, portions })
        .collect();

    for diagnostic in &diagnostics {
        log::warn!("[BaitMapping] {}", diagnostic);
    }

    ParsedMapping { mapping: BaitMapping::new(entries), diagnostics }
}

// Returns (1-based token position, value) for every token that parses.
fn parse_int_list(csv: &str, list: MappingList, diagnostics: &mut Vec<MappingDiagnostic>) -> Vec<(usize, i64)> {
    if csv.trim().is_empty() {
        return Vec::new();
    }

    csv.split(',')
        .enumerate()
        .filter_map(|(index, raw)| {
            let token = raw.trim();
            match token.parse::<i64>() {
                Ok(value) => Some((index + 1, value)),
                Err(_) => {
                    diagnostics.push(MappingDiagnostic::MalformedToken {
                        list,
                        position: index + 1,
                        token: token.to_string(),
                    });
                    None
                }
            }
        })
        .collect()
}
