use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type HeldNotes = BTreeSet<u8>;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PatternVerdict {
    Empty,
    InProgress,
    Complete,
    Mistake,
}

/// Whether the held notes fit `pattern` for some held note taken as the root.
///
/// The pattern is treated as a set of semitone offsets, so order and repeated
/// offsets do not matter. With `strict`, the held notes must also cover every
/// distinct offset.
pub fn matches(held: &HeldNotes, pattern: &[i32], strict: bool) -> bool {
    if held.is_empty() {
        return false;
    }
    let pattern: BTreeSet<i32> = pattern.iter().copied().collect();
    held.iter().any(|&root| {
        let intervals: BTreeSet<i32> = held
            .iter()
            .map(|&midi| i32::from(midi) - i32::from(root))
            .collect();
        intervals.is_subset(&pattern) && (!strict || intervals.len() == pattern.len())
    })
}

pub fn classify(held: &HeldNotes, pattern: &[i32]) -> PatternVerdict {
    if held.is_empty() {
        PatternVerdict::Empty
    } else if matches(held, pattern, true) {
        PatternVerdict::Complete
    } else if matches(held, pattern, false) {
        PatternVerdict::InProgress
    } else {
        PatternVerdict::Mistake
    }
}
