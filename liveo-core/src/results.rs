//! Result data model
//!
//! A [`ResultSnapshot`] is the complete, immutable view of a result set at one
//! point in time, identified by an opaque [`ResultHash`]. Snapshots are never
//! mutated after they are published: a full-results push replaces the snapshot
//! wholesale and an accepted delta produces a reconciled copy.
//!
//! # Wire Format
//!
//! Field names are PascalCase on the wire. A full-results payload looks like:
//!
//! ```json
//! {"Hash": 42, "Results": {"Title": "Day 1", "Courses": [
//!     {"Title": "Brown", "Info": "7.2km", "Competitors": [
//!         {"Name": "A. Runner", "Club": "SYO", "Time": 2730000000000, "Valid": true}
//!     ]}
//! ]}}
//! ```
//!
//! Competitor fields other than `Name` and `Time` are passed through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a snapshot, used as the hash chain between deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultHash(pub u64);

impl fmt::Display for ResultHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResultHash {
    fn from(value: u64) -> Self {
        ResultHash(value)
    }
}

/// A single competitor within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Competitor {
    /// Display name
    pub name: String,
    /// Elapsed time in nanoseconds
    pub time: i64,
    /// Any other fields (club, age class, validity...) kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Competitor {
    /// Create a competitor with no extra fields
    pub fn new(name: impl Into<String>, time: i64) -> Self {
        Self {
            name: name.into(),
            time,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an extra pass-through field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The competitor's time formatted as `m:ss`
    pub fn display_time(&self) -> String {
        crate::display::format_race_time(self.time)
    }
}

/// A course and its ordered competitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    pub title: String,
    /// Free-form course description (length, climb)
    #[serde(default)]
    pub info: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competitors: Vec<Competitor>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            info: String::new(),
            competitors: Vec::new(),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_competitors(mut self, competitors: Vec<Competitor>) -> Self {
        self.competitors = competitors;
        self
    }

    /// Two courses with the same identity are treated as the same course
    /// when diffing, even if their competitors differ.
    pub(crate) fn same_identity(&self, other: &Course) -> bool {
        self.title == other.title && self.info == other.info
    }
}

/// Complete, immutable result set identified by a hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireDataSet", into = "WireDataSet")]
pub struct ResultSnapshot {
    pub hash: ResultHash,
    pub title: String,
    pub courses: Vec<Course>,
}

impl ResultSnapshot {
    /// Title shown before the first full result set arrives
    pub const PLACEHOLDER_TITLE: &'static str = "NOT LOADED";

    pub fn new(hash: impl Into<ResultHash>, title: impl Into<String>, courses: Vec<Course>) -> Self {
        Self {
            hash: hash.into(),
            title: title.into(),
            courses,
        }
    }

    /// Empty snapshot used until real results are loaded
    pub fn placeholder() -> Self {
        Self::new(ResultHash::default(), Self::PLACEHOLDER_TITLE, Vec::new())
    }

    /// Total number of competitors across all courses
    pub fn competitor_count(&self) -> usize {
        self.courses.iter().map(|c| c.competitors.len()).sum()
    }
}

/// Read `null` as the empty value
///
/// The result server writes empty lists and maps as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{Hash, Results: {Title, Courses}}` as published by the result server
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDataSet {
    hash: ResultHash,
    results: WireResults,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResults {
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    courses: Vec<Course>,
}

impl From<WireDataSet> for ResultSnapshot {
    fn from(wire: WireDataSet) -> Self {
        Self {
            hash: wire.hash,
            title: wire.results.title,
            courses: wire.results.courses,
        }
    }
}

impl From<ResultSnapshot> for WireDataSet {
    fn from(snapshot: ResultSnapshot) -> Self {
        Self {
            hash: snapshot.hash,
            results: WireResults {
                title: snapshot.title,
                courses: snapshot.courses,
            },
        }
    }
}
