//! Delta generation
//!
//! [`ResultSnapshot::delta_to`] computes the [`Delta`] that turns one snapshot
//! into another. Courses are matched by identity (title and info) and
//! competitors by full equality, both through a longest common subsequence so
//! that unchanged runs never appear in the patch.
//!
//! The produced delta always satisfies
//! `reconcile(a, &a.delta_to(b)) == Reconciliation::Applied(b.clone())`.

use crate::patch::IndexPatch;
use crate::reconcile::Delta;
use crate::results::ResultSnapshot;

impl ResultSnapshot {
    /// Describe the change from `self` to `target`
    pub fn delta_to(&self, target: &ResultSnapshot) -> Delta {
        let mut delta = Delta::new(self.hash, target.hash);

        if self.title != target.title {
            delta.title = Some(target.title.clone());
        }

        let course_matches = common_subsequence(&self.courses, &target.courses, |a, b| a.same_identity(b));
        let courses = index_patch(&self.courses, &target.courses, &course_matches);
        if !courses.is_empty() {
            delta.courses = Some(courses);
        }

        for &(old_index, new_index) in &course_matches {
            let old = &self.courses[old_index].competitors;
            let new = &target.courses[new_index].competitors;
            let matches = common_subsequence(old, new, |a, b| a == b);
            let patch = index_patch(old, new, &matches);
            if !patch.is_empty() {
                delta = delta.with_competitors(new_index, patch);
            }
        }

        delta
    }
}

/// Build the patch that keeps `matches` and replaces everything else
fn index_patch<T: Clone>(old: &[T], new: &[T], matches: &[(usize, usize)]) -> IndexPatch<T> {
    let mut patch = IndexPatch::new();
    let mut kept_old = matches.iter().map(|&(o, _)| o).peekable();
    for index in 0..old.len() {
        if kept_old.peek() == Some(&index) {
            kept_old.next();
        } else {
            patch.removed.insert(index);
        }
    }
    let mut kept_new = matches.iter().map(|&(_, n)| n).peekable();
    for (index, item) in new.iter().enumerate() {
        if kept_new.peek() == Some(&index) {
            kept_new.next();
        } else {
            patch.added.insert(index, item.clone());
        }
    }
    patch
}

/// Longest common subsequence of `a` and `b` as ascending index pairs
///
/// Equal prefixes and suffixes are matched directly; only the differing middle
/// goes through the quadratic table.
pub fn common_subsequence<T, F>(a: &[T], b: &[T], eq: F) -> Vec<(usize, usize)>
where
    F: Fn(&T, &T) -> bool,
{
    let mut prefix = 0;
    while prefix < a.len() && prefix < b.len() && eq(&a[prefix], &b[prefix]) {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < a.len() - prefix
        && suffix < b.len() - prefix
        && eq(&a[a.len() - 1 - suffix], &b[b.len() - 1 - suffix])
    {
        suffix += 1;
    }

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    // lengths[i][j] = LCS length of mid_a[i..] and mid_b[j..]
    let width = mid_b.len() + 1;
    let mut lengths = vec![0usize; (mid_a.len() + 1) * width];
    for i in (0..mid_a.len()).rev() {
        for j in (0..mid_b.len()).rev() {
            lengths[i * width + j] = if eq(&mid_a[i], &mid_b[j]) {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let mut pairs: Vec<(usize, usize)> = (0..prefix).map(|i| (i, i)).collect();
    let (mut i, mut j) = (0, 0);
    while i < mid_a.len() && j < mid_b.len() {
        if eq(&mid_a[i], &mid_b[j]) {
            pairs.push((prefix + i, prefix + j));
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    for k in 0..suffix {
        pairs.push((a.len() - suffix + k, b.len() - suffix + k));
    }
    pairs
}
