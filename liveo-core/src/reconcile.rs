//! Snapshot reconciliation
//!
//! [`reconcile`] applies a [`Delta`] to a [`ResultSnapshot`] and returns a new
//! snapshot, or tells the caller that its base is wrong and a full result set
//! must be requested.
//!
//! # Patch Order
//!
//! 1. Hash check: `delta.old` must equal the current snapshot hash
//! 2. Title
//! 3. Courses, patched against the current course list
//! 4. Competitors, keyed by the course index in the **already patched** list
//!
//! Every check happens before the new snapshot is handed out. The input
//! snapshot is only ever read, so a rejected delta leaves the caller's state
//! exactly as it was.

use crate::patch::{apply_index_patch, IndexPatch, PatchError};
use crate::results::{Competitor, Course, ResultHash, ResultSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Compact change between two snapshot hashes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Delta {
    /// Hash of the snapshot this delta applies to
    pub old: ResultHash,
    /// Hash of the snapshot this delta produces
    pub new: ResultHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<IndexPatch<Course>>,
    /// Competitor patches keyed by course index in the new course list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitors: Option<BTreeMap<usize, IndexPatch<Competitor>>>,
}

impl Delta {
    /// A delta that only moves the hash forward
    pub fn new(old: impl Into<ResultHash>, new: impl Into<ResultHash>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
            title: None,
            courses: None,
            competitors: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_courses(mut self, patch: IndexPatch<Course>) -> Self {
        self.courses = Some(patch);
        self
    }

    /// Add a competitor patch for the course at `course_index` after the courses patch
    pub fn with_competitors(mut self, course_index: usize, patch: IndexPatch<Competitor>) -> Self {
        self.competitors
            .get_or_insert_with(BTreeMap::new)
            .insert(course_index, patch);
        self
    }

    /// True when applying this delta changes nothing but the hash
    pub fn is_hash_only(&self) -> bool {
        self.title.is_none()
            && self.courses.as_ref().map_or(true, IndexPatch::is_empty)
            && self.competitors.as_ref().map_or(true, BTreeMap::is_empty)
    }
}

/// Outcome of [`reconcile`]
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The delta applied; this is the new snapshot
    Applied(ResultSnapshot),
    /// The delta does not fit the current snapshot; fetch a full result set
    RebaseRequired(RebaseReason),
}

impl Reconciliation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciliation::Applied(_))
    }

    /// The new snapshot, if the delta applied
    pub fn into_snapshot(self) -> Option<ResultSnapshot> {
        match self {
            Reconciliation::Applied(snapshot) => Some(snapshot),
            Reconciliation::RebaseRequired(_) => None,
        }
    }
}

/// Why a delta could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseReason {
    /// `delta.old` differs from the hash of the current snapshot
    HashMismatch {
        expected: ResultHash,
        actual: ResultHash,
    },
    /// The delta's positions do not fit the current snapshot
    MalformedPatch(PatchError),
}

impl fmt::Display for RebaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebaseReason::HashMismatch { expected, actual } => {
                write!(f, "delta expects base {} but current is {}", expected, actual)
            }
            RebaseReason::MalformedPatch(err) => write!(f, "malformed patch: {}", err),
        }
    }
}

impl From<PatchError> for RebaseReason {
    fn from(err: PatchError) -> Self {
        RebaseReason::MalformedPatch(err)
    }
}

/// Apply `delta` to `current`
///
/// Pure: `current` is never modified. Returns
/// [`Reconciliation::RebaseRequired`] when `delta.old` does not match
/// `current.hash` or when any patch does not fit.
pub fn reconcile(current: &ResultSnapshot, delta: &Delta) -> Reconciliation {
    if delta.old != current.hash {
        return Reconciliation::RebaseRequired(RebaseReason::HashMismatch {
            expected: delta.old,
            actual: current.hash,
        });
    }

    match apply_delta(current, delta) {
        Ok(snapshot) => Reconciliation::Applied(snapshot),
        Err(err) => Reconciliation::RebaseRequired(err.into()),
    }
}

fn apply_delta(current: &ResultSnapshot, delta: &Delta) -> Result<ResultSnapshot, PatchError> {
    let title = delta.title.clone().unwrap_or_else(|| current.title.clone());

    let mut courses = match &delta.courses {
        Some(patch) => apply_index_patch(&current.courses, patch)?,
        None => current.courses.clone(),
    };

    if let Some(patches) = &delta.competitors {
        let len = courses.len();
        for (&index, patch) in patches {
            let course = courses
                .get_mut(index)
                .ok_or(PatchError::CourseOutOfRange { index, len })?;
            course.competitors = apply_index_patch(&course.competitors, patch)?;
        }
    }

    Ok(ResultSnapshot {
        hash: delta.new,
        title,
        courses,
    })
}
