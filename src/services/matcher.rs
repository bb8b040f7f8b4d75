//! Disjoint matcher
//!
//! Resolves the complete `values × candidates` graph into one-to-one pairs.
//! Edges are scored with the first metric and handled in buckets of equal
//! score, best first. An edge that is the only one in its bucket for both
//! its value and its candidate is accepted; the rest of the bucket is
//! refined with the next metric. When the metrics run out, leftover edges
//! are either paired greedily in a fixed string order or, in strict mode,
//! left unmatched.

use std::collections::HashMap;
use std::fmt;
use std::ptr;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::metrics::{BoxedMetric, SimilarityMetric, sanitize};
use crate::error::{MatchError, Result};

// =========================================================================
// Match
// =========================================================================

/// An accepted (value, candidate) pair.
///
/// Equality is slot identity: two matches are equal only when they borrow
/// the very same value and candidate, however equal their contents are.
pub struct Match<'a, V, C> {
    value: &'a V,
    candidate: &'a C,
}

impl<'a, V, C> Match<'a, V, C> {
    pub fn new(value: &'a V, candidate: &'a C) -> Self {
        Self { value, candidate }
    }

    pub fn value(&self) -> &'a V {
        self.value
    }

    pub fn candidate(&self) -> &'a C {
        self.candidate
    }
}

impl<V, C> Clone for Match<'_, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V, C> Copy for Match<'_, V, C> {}

impl<V, C> PartialEq for Match<'_, V, C> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.value, other.value) && ptr::eq(self.candidate, other.candidate)
    }
}

impl<V, C> Eq for Match<'_, V, C> {}

impl<V: fmt::Display, C: fmt::Display> fmt::Display for Match<'_, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.value, self.candidate)
    }
}

impl<V: fmt::Debug, C: fmt::Debug> fmt::Debug for Match<'_, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("value", self.value)
            .field("candidate", self.candidate)
            .finish()
    }
}

// =========================================================================
// MatchSet
// =========================================================================

/// Edge of the bipartite graph, by slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Edge {
    value: usize,
    candidate: usize,
}

/// Accepted matches of one run; a value or candidate is never used twice
pub struct MatchSet<'a, V, C> {
    values: &'a [V],
    candidates: &'a [C],
    accepted: Vec<Edge>,
    value_taken: Vec<bool>,
    candidate_taken: Vec<bool>,
}

impl<'a, V, C> MatchSet<'a, V, C> {
    fn new(values: &'a [V], candidates: &'a [C]) -> Self {
        Self {
            values,
            candidates,
            accepted: Vec::new(),
            value_taken: vec![false; values.len()],
            candidate_taken: vec![false; candidates.len()],
        }
    }

    fn is_free(&self, edge: Edge) -> bool {
        !self.value_taken[edge.value] && !self.candidate_taken[edge.candidate]
    }

    /// Accept `edge` unless either end is already taken
    fn add(&mut self, edge: Edge) -> bool {
        if !self.is_free(edge) {
            return false;
        }
        self.value_taken[edge.value] = true;
        self.candidate_taken[edge.candidate] = true;
        self.accepted.push(edge);
        true
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Matches in acceptance order
    pub fn iter(&self) -> impl Iterator<Item = Match<'a, V, C>> + '_ {
        self.accepted
            .iter()
            .map(|e| Match::new(&self.values[e.value], &self.candidates[e.candidate]))
    }

    fn remaining(&self) -> Remaining {
        Remaining {
            values: untaken(&self.value_taken),
            candidates: untaken(&self.candidate_taken),
        }
    }
}

fn untaken(taken: &[bool]) -> Vec<usize> {
    taken
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(i, _)| i)
        .collect()
}

/// Slots left unmatched by the last run
#[derive(Debug, Clone, Default)]
struct Remaining {
    values: Vec<usize>,
    candidates: Vec<usize>,
}

impl Remaining {
    fn all(values: usize, candidates: usize) -> Self {
        Self {
            values: (0..values).collect(),
            candidates: (0..candidates).collect(),
        }
    }
}

// =========================================================================
// Matcher
// =========================================================================

/// Pairs values with candidates through an ordered list of metrics
pub struct Matcher<'a, V, C> {
    values: &'a [V],
    candidates: &'a [C],
    strict: bool,
    metrics: &'a [BoxedMetric<V, C>],
    /// Held for a whole run, which also serializes runs
    last_run: Mutex<Remaining>,
}

impl<'a, V: fmt::Display, C: fmt::Display> Matcher<'a, V, C> {
    /// # Arguments
    /// * `strict` - leave edges that no metric could resolve unmatched
    ///   instead of pairing them in string order
    /// * `metrics` - applied in order, one per refinement level
    pub fn new(
        values: &'a [V],
        candidates: &'a [C],
        strict: bool,
        metrics: &'a [BoxedMetric<V, C>],
    ) -> Self {
        Self {
            values,
            candidates,
            strict,
            metrics,
            last_run: Mutex::new(Remaining::all(values.len(), candidates.len())),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Run the matcher.
    ///
    /// `cancel` is checked before every metric evaluation; a cancelled run
    /// returns [`MatchError::Cancelled`] and keeps nothing of its progress.
    pub fn match_all(&self, cancel: &CancellationToken) -> Result<Vec<Match<'a, V, C>>> {
        let mut last_run = self.last_run.lock();
        let mut set = MatchSet::new(self.values, self.candidates);

        let edges: Vec<Edge> = (0..self.values.len())
            .flat_map(|value| (0..self.candidates.len()).map(move |candidate| Edge { value, candidate }))
            .collect();

        info!(
            values = self.values.len(),
            candidates = self.candidates.len(),
            edges = edges.len(),
            metrics = self.metrics.len(),
            strict = self.strict,
            "Starting disjoint match"
        );

        if let Err(e) = self.deep_match(edges, 0, &mut set, cancel) {
            warn!(error = %e, "Disjoint match aborted");
            *last_run = Remaining::all(self.values.len(), self.candidates.len());
            return Err(e);
        }

        *last_run = set.remaining();
        info!(
            matched = set.len(),
            unmatched_values = last_run.values.len(),
            unmatched_candidates = last_run.candidates.len(),
            "Finished disjoint match"
        );

        Ok(set.iter().collect())
    }

    /// Values the last run left unmatched (all of them before any run)
    pub fn remaining_values(&self) -> Vec<&'a V> {
        let values = self.values;
        self.last_run.lock().values.iter().map(|&i| &values[i]).collect()
    }

    /// Candidates the last run left unmatched (all of them before any run)
    pub fn remaining_candidates(&self) -> Vec<&'a C> {
        let candidates = self.candidates;
        self.last_run.lock().candidates.iter().map(|&i| &candidates[i]).collect()
    }

    /// Drop memoized derivations of all metrics
    pub fn clear_caches(&self) {
        self.metrics.iter().for_each(|m| m.clear_cache());
    }

    fn deep_match(
        &self,
        edges: Vec<Edge>,
        level: usize,
        set: &mut MatchSet<'a, V, C>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }

        let Some(metric) = self.metrics.get(level) else {
            if self.strict {
                debug!(level, unresolved = edges.len(), "Leaving ambiguous edges unmatched");
            } else {
                self.accept_in_order(edges, set);
            }
            return Ok(());
        };

        // buckets keyed by the exact score
        let mut buckets: Vec<(f32, Vec<Edge>)> = Vec::new();
        let mut slots: HashMap<u32, usize> = HashMap::new();
        for edge in edges {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
            let score = sanitize(metric.similarity(&self.values[edge.value], &self.candidates[edge.candidate]));
            let slot = *slots.entry(score.to_bits()).or_insert_with(|| {
                buckets.push((score, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(edge);
        }
        buckets.sort_by(|a, b| b.0.total_cmp(&a.0));
        trace!(level, buckets = buckets.len(), "Scored edges");

        for (score, bucket) in buckets {
            // uniqueness is judged on the whole bucket, claimed edges included,
            // so an edge sharing an end with a claimed one stays ambiguous
            let (unique, ambiguous) = partition_disjoint(bucket);
            let ambiguous: Vec<Edge> = ambiguous.into_iter().filter(|e| set.is_free(*e)).collect();

            let accepted = unique.into_iter().filter(|e| set.add(*e)).count();
            if accepted > 0 || !ambiguous.is_empty() {
                debug!(level, score, accepted, ambiguous = ambiguous.len(), "Processed bucket");
            }

            self.deep_match(ambiguous, level + 1, set, cancel)?;
        }

        Ok(())
    }

    /// Greedy pairing in string order, for reproducible tie breaking
    fn accept_in_order(&self, edges: Vec<Edge>, set: &mut MatchSet<'a, V, C>) {
        let mut ordered: Vec<(String, Edge)> = edges
            .into_iter()
            .map(|e| {
                let rendered = Match::new(&self.values[e.value], &self.candidates[e.candidate]).to_string();
                (rendered, e)
            })
            .collect();
        ordered.sort();

        for (rendered, edge) in ordered {
            if set.add(edge) {
                trace!(edge = %rendered, "Accepted by order");
            }
        }
    }
}

/// Split a bucket into edges whose value and candidate occur nowhere else in
/// it, and the rest.
fn partition_disjoint(bucket: Vec<Edge>) -> (Vec<Edge>, Vec<Edge>) {
    let mut value_count: HashMap<usize, usize> = HashMap::new();
    let mut candidate_count: HashMap<usize, usize> = HashMap::new();
    for edge in &bucket {
        *value_count.entry(edge.value).or_default() += 1;
        *candidate_count.entry(edge.candidate).or_default() += 1;
    }

    bucket
        .into_iter()
        .partition(|e| value_count[&e.value] == 1 && candidate_count[&e.candidate] == 1)
}
