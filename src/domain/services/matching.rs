//! Interest-Overlap Matching Engine
//!
//! Pure ranking of candidates (users or communities) by the fraction of the
//! reference user's interests they share, normalized to a 0-100 integer
//! percentage. Stateless: every call computes from the facts it is handed.
//!
//! Ordering is deterministic: score descending, candidate id ascending on
//! ties.

use std::collections::HashSet;

/// Cap on the people-match result set. The candidate pool is trimmed to the
/// top `MAX_PEOPLE_MATCHES` by raw overlap count before normalization, so
/// the endpoint never returns more than this many matches.
pub const MAX_PEOPLE_MATCHES: usize = 10;

/// A candidate identity with its interest set.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: i64,
    pub interest_ids: HashSet<i64>,
}

impl Candidate {
    pub fn new(id: i64, interest_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            id,
            interest_ids: interest_ids.into_iter().collect(),
        }
    }
}

/// A scored candidate produced by [`rank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    pub id: i64,
    /// Number of interests shared with the reference user.
    pub overlap: usize,
    /// Normalized match percentage in [0, 100].
    pub score: u8,
}

/// Normalize an overlap count against the reference set size.
///
/// `round(100 * overlap / reference_len)` with half-up rounding, so one
/// shared interest out of 200 still scores 1%, while 1/250 rounds down to 0.
/// Returns 0 for an empty reference set (callers are expected to handle that
/// case before scoring).
pub fn overlap_score(overlap: usize, reference_len: usize) -> u8 {
    if reference_len == 0 {
        return 0;
    }
    let overlap = overlap as u64;
    let len = reference_len as u64;
    ((overlap * 200 + len) / (2 * len)) as u8
}

/// Rank candidates by shared-interest overlap with the reference set.
///
/// An empty reference set yields an empty result: there is nothing
/// meaningful to normalize against, and the caller should tell the user to
/// add interests instead of showing 0% everywhere. Zero-overlap candidates
/// are kept (scored 0); pre-filtering the pool is the caller's concern.
pub fn rank(reference: &HashSet<i64>, candidates: &[Candidate]) -> Vec<RankedCandidate> {
    if reference.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|candidate| {
            let overlap = candidate.interest_ids.intersection(reference).count();
            RankedCandidate {
                id: candidate.id,
                overlap,
                score: overlap_score(overlap, reference.len()),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    ranked
}

/// People-match variant of [`rank`].
///
/// The pool is capped to the top [`MAX_PEOPLE_MATCHES`] candidates by raw
/// overlap count (id ascending on ties) before normalization. Zero-overlap
/// candidates are dropped; the store query only surfaces users sharing at
/// least one interest, and this keeps that contract even for a wider pool.
pub fn rank_people(reference: &HashSet<i64>, candidates: &[Candidate]) -> Vec<RankedCandidate> {
    if reference.is_empty() {
        return Vec::new();
    }

    let mut by_overlap: Vec<(i64, usize)> = candidates
        .iter()
        .map(|c| (c.id, c.interest_ids.intersection(reference).count()))
        .filter(|(_, overlap)| *overlap > 0)
        .collect();

    by_overlap.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    by_overlap.truncate(MAX_PEOPLE_MATCHES);

    let mut ranked: Vec<RankedCandidate> = by_overlap
        .into_iter()
        .map(|(id, overlap)| RankedCandidate {
            id,
            overlap,
            score: overlap_score(overlap, reference.len()),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    ranked
}
