//! Sparse positional patches for ordered sequences
//!
//! An [`IndexPatch`] describes how to turn one ordered sequence into another
//! with two sparse sets:
//!
//! - `removed`: positions in the **pre-patch** sequence that disappear
//! - `added`: items keyed by their position in the **post-patch** sequence
//!
//! [`apply_index_patch`] merges the two in a single forward pass. Two cursors
//! walk the old sequence and the output; at every output position an added item
//! wins, otherwise the next retained old item is copied across. Removed old
//! items are skipped without occupying an output position, so the relative
//! order of retained items never changes.
//!
//! ```text
//! old:     [A, B, C]     removed {1}     added {1: D}
//!
//! new[0]  no add at 0     copy old[0] = A
//! new[1]  add at 1        emit D
//!          old[1] = B is removed, skip it
//! new[2]  no add at 2     copy old[2] = C
//!
//! new:     [A, D, C]
//! ```
//!
//! Patches are validated before anything is copied. A removed position past the
//! end of the old sequence, or an added key that cannot exist in the output,
//! yields a [`PatchError`] instead of a silently misplaced sequence.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Sparse insertions and removals for one ordered sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct IndexPatch<T> {
    /// Items keyed by their target position in the new sequence
    #[serde(default = "BTreeMap::new", deserialize_with = "crate::results::null_as_default")]
    pub added: BTreeMap<usize, T>,
    /// Positions in the old sequence to drop
    #[serde(default, with = "positions")]
    pub removed: BTreeSet<usize>,
}

impl<T> Default for IndexPatch<T> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeSet::new(),
        }
    }
}

impl<T> IndexPatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item` so that it ends up at `position` in the new sequence
    pub fn add(mut self, position: usize, item: T) -> Self {
        self.added.insert(position, item);
        self
    }

    /// Drop the item currently at `position`
    pub fn remove(mut self, position: usize) -> Self {
        self.removed.insert(position);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Length of the sequence produced from an input of `old_len` items
    ///
    /// Only meaningful for a patch that passes [`IndexPatch::validate`].
    pub fn output_len(&self, old_len: usize) -> usize {
        old_len.saturating_sub(self.removed.len()) + self.added.len()
    }

    /// Check that this patch can be applied to a sequence of `old_len` items
    pub fn validate(&self, old_len: usize) -> Result<(), PatchError> {
        if let Some(&position) = self.removed.iter().next_back() {
            if position >= old_len {
                return Err(PatchError::RemovedOutOfRange { position, len: old_len });
            }
        }
        let new_len = self.output_len(old_len);
        if let Some(&position) = self.added.keys().next_back() {
            if position >= new_len {
                return Err(PatchError::AddedOutOfRange { position, len: new_len });
            }
        }
        Ok(())
    }
}

/// Structural problem with an [`IndexPatch`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A removed position does not exist in the old sequence
    #[error("removed position {position} is outside a sequence of {len}")]
    RemovedOutOfRange { position: usize, len: usize },

    /// An added key lies beyond the end of the new sequence
    #[error("added position {position} is outside the patched sequence of {len}")]
    AddedOutOfRange { position: usize, len: usize },

    /// A nested patch targets a course that does not exist after the courses patch
    #[error("competitor patch targets course {index} but only {len} courses exist")]
    CourseOutOfRange { index: usize, len: usize },
}

/// Apply `patch` to `old`, producing a new sequence
///
/// The input is left untouched; retained items are cloned into the output.
///
/// # Errors
///
/// Returns [`PatchError`] when the patch does not fit `old` (see
/// [`IndexPatch::validate`]).
pub fn apply_index_patch<T: Clone>(old: &[T], patch: &IndexPatch<T>) -> Result<Vec<T>, PatchError> {
    patch.validate(old.len())?;

    let mut output = Vec::with_capacity(patch.output_len(old.len()));
    let mut cursor_old = 0;
    let mut cursor_new = 0;
    let mut remaining_adds = patch.added.len();

    while remaining_adds > 0 || cursor_old < old.len() {
        if remaining_adds > 0 {
            if let Some(item) = patch.added.get(&cursor_new) {
                output.push(item.clone());
                remaining_adds -= 1;
                cursor_new += 1;
                continue;
            }
        }

        if cursor_old < old.len() {
            if !patch.removed.contains(&cursor_old) {
                output.push(old[cursor_old].clone());
                cursor_new += 1;
            }
            cursor_old += 1;
        } else {
            // Validation guarantees every remaining output slot holds an add.
            return Err(PatchError::AddedOutOfRange {
                position: cursor_new,
                len: patch.output_len(old.len()),
            });
        }
    }

    Ok(output)
}

/// Serde adapter for removed positions
///
/// Accepts a JSON object keyed by position (values ignored) or a plain array of
/// positions; always writes the object form.
mod positions {
    use super::*;

    pub fn serialize<S: Serializer>(set: &BTreeSet<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(set.len()))?;
        for position in set {
            map.serialize_entry(&position.to_string(), &0)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<usize>, D::Error> {
        deserializer.deserialize_any(PositionsVisitor)
    }

    struct PositionsVisitor;

    impl<'de> Visitor<'de> for PositionsVisitor {
        type Value = BTreeSet<usize>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map keyed by position or an array of positions")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeSet::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut set = BTreeSet::new();
            while let Some(position) = seq.next_element::<usize>()? {
                set.insert(position);
            }
            Ok(set)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut set = BTreeSet::new();
            while let Some((key, _)) = map.next_entry::<String, de::IgnoredAny>()? {
                let position = key
                    .parse::<usize>()
                    .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&key), &"a position"))?;
                set.insert(position);
            }
            Ok(set)
        }
    }
}
