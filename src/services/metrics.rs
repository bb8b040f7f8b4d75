//! Similarity metric algebra
//!
//! A metric scores a (value, candidate) pair in roughly `[-1, 1]`:
//! `1` is a certain match, `0` is no evidence either way and negative
//! scores are evidence *against* a match. Combinators compose metrics
//! without knowing what they measure.

use std::sync::Arc;

use strsim::normalized_levenshtein;
use tracing::{trace, warn};

use super::media::{Matchable, PropertyValue};
use super::text_utils::normalize_name;
use crate::error::{MatchError, MetricError, Result};

/// Scores how well a candidate fits a value
pub trait SimilarityMetric<V: ?Sized, C: ?Sized = V>: Send + Sync {
    fn similarity(&self, value: &V, candidate: &C) -> f32;

    /// Fallible form, for metrics that may be unable to derive their input
    fn try_similarity(&self, value: &V, candidate: &C) -> std::result::Result<f32, MetricError> {
        Ok(self.similarity(value, candidate))
    }

    /// Drop memoized derivations
    fn clear_cache(&self) {}
}

pub type BoxedMetric<V, C = V> = Box<dyn SimilarityMetric<V, C>>;

impl<V: ?Sized, C: ?Sized, M: SimilarityMetric<V, C> + ?Sized> SimilarityMetric<V, C> for Box<M> {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        (**self).similarity(value, candidate)
    }

    fn try_similarity(&self, value: &V, candidate: &C) -> std::result::Result<f32, MetricError> {
        (**self).try_similarity(value, candidate)
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}

impl<V: ?Sized, C: ?Sized, M: SimilarityMetric<V, C> + ?Sized> SimilarityMetric<V, C> for Arc<M> {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        (**self).similarity(value, candidate)
    }

    fn try_similarity(&self, value: &V, candidate: &C) -> std::result::Result<f32, MetricError> {
        (**self).try_similarity(value, candidate)
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}

/// Make a raw score usable as an exact bucket key: NaN becomes 0 and
/// negative zero becomes positive zero.
pub fn sanitize(score: f32) -> f32 {
    if score.is_nan() {
        warn!("Metric produced NaN, treating as no evidence");
        0.0
    } else if score == 0.0 {
        0.0
    } else {
        score
    }
}

fn require_members<T>(name: &str, metrics: &[T]) -> Result<()> {
    if metrics.is_empty() {
        return Err(MatchError::invalid(format!("{name} needs at least one metric")));
    }
    Ok(())
}

// =========================================================================
// Cascade
// =========================================================================

/// First decisive metric wins.
///
/// Metrics run in order; a score of `1` or more returns at once. Otherwise
/// the score with the largest magnitude is kept, so a strong negative from
/// an early metric survives weaker positives later on.
pub struct Cascade<V: ?Sized, C: ?Sized = V> {
    metrics: Vec<BoxedMetric<V, C>>,
}

impl<V: ?Sized, C: ?Sized> Cascade<V, C> {
    pub fn new(metrics: Vec<BoxedMetric<V, C>>) -> Result<Self> {
        require_members("cascade", &metrics)?;
        Ok(Self { metrics })
    }
}

impl<V: ?Sized, C: ?Sized> SimilarityMetric<V, C> for Cascade<V, C> {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        let mut best = 0.0_f32;
        for metric in &self.metrics {
            let score = sanitize(metric.similarity(value, candidate));
            if score >= 1.0 {
                return score;
            }
            if score.abs() >= best.abs() {
                best = score;
            }
        }
        best
    }

    fn clear_cache(&self) {
        self.metrics.iter().for_each(|m| m.clear_cache());
    }
}

// =========================================================================
// Average
// =========================================================================

/// Arithmetic mean of all members
pub struct Average<V: ?Sized, C: ?Sized = V> {
    metrics: Vec<BoxedMetric<V, C>>,
}

impl<V: ?Sized, C: ?Sized> Average<V, C> {
    pub fn new(metrics: Vec<BoxedMetric<V, C>>) -> Result<Self> {
        require_members("average", &metrics)?;
        Ok(Self { metrics })
    }
}

impl<V: ?Sized, C: ?Sized> SimilarityMetric<V, C> for Average<V, C> {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        let total: f32 = self
            .metrics
            .iter()
            .map(|m| sanitize(m.similarity(value, candidate)))
            .sum();
        total / self.metrics.len() as f32
    }

    fn clear_cache(&self) {
        self.metrics.iter().for_each(|m| m.clear_cache());
    }
}

// =========================================================================
// Floor
// =========================================================================

/// Lower bound on another metric's score
pub struct Floor<M> {
    metric: M,
    floor: f32,
}

impl<M> Floor<M> {
    pub fn new(metric: M, floor: f32) -> Result<Self> {
        if !floor.is_finite() {
            return Err(MatchError::invalid(format!("floor must be finite, got {floor}")));
        }
        Ok(Self { metric, floor })
    }
}

impl<V: ?Sized, C: ?Sized, M: SimilarityMetric<V, C>> SimilarityMetric<V, C> for Floor<M> {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        sanitize(self.metric.similarity(value, candidate)).max(self.floor)
    }

    fn clear_cache(&self) {
        self.metric.clear_cache();
    }
}

// =========================================================================
// Cross-property
// =========================================================================

/// Average of a property metric over the keys both sides expose.
///
/// Keys whose comparison fails are skipped; no common keys scores 0.
pub struct CrossProperty<M> {
    metric: M,
}

impl<M> CrossProperty<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }
}

impl Default for CrossProperty<PropertySimilarity> {
    fn default() -> Self {
        Self::new(PropertySimilarity)
    }
}

impl<V, C, M> SimilarityMetric<V, C> for CrossProperty<M>
where
    V: Matchable + ?Sized,
    C: Matchable + ?Sized,
    M: SimilarityMetric<PropertyValue>,
{
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        let left = value.properties();
        let right = candidate.properties();
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let mut total = 0.0_f32;
        let mut counted = 0_u32;
        for key in left.keys() {
            let (Some(a), Some(b)) = (left.get(key), right.get(key)) else {
                continue;
            };
            match self.metric.try_similarity(a, b) {
                Ok(score) => {
                    total += sanitize(score);
                    counted += 1;
                }
                Err(e) => trace!(key, error = %e, "Skipping property"),
            }
        }

        if counted == 0 { 0.0 } else { total / counted as f32 }
    }

    fn clear_cache(&self) {
        self.metric.clear_cache();
    }
}

/// Default comparison of two property values of the same kind.
///
/// Text scores by edit distance of the normalized strings; numbers and
/// dates score 1 when equal. Distinct known dates are evidence against.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertySimilarity;

impl SimilarityMetric<PropertyValue> for PropertySimilarity {
    fn similarity(&self, value: &PropertyValue, candidate: &PropertyValue) -> f32 {
        self.try_similarity(value, candidate).unwrap_or(0.0)
    }

    fn try_similarity(
        &self,
        value: &PropertyValue,
        candidate: &PropertyValue,
    ) -> std::result::Result<f32, MetricError> {
        match (value, candidate) {
            (PropertyValue::Unavailable(reason), _) | (_, PropertyValue::Unavailable(reason)) => {
                Err(MetricError::Unavailable(reason.clone()))
            }
            (PropertyValue::Text(a), PropertyValue::Text(b)) => {
                Ok(normalized_levenshtein(&normalize_name(a), &normalize_name(b)) as f32)
            }
            (PropertyValue::Number(a), PropertyValue::Number(b)) => Ok(if a == b { 1.0 } else { 0.0 }),
            (PropertyValue::Date(a), PropertyValue::Date(b)) => Ok(if a == b { 1.0 } else { -1.0 }),
            _ => Err(MetricError::Incomparable {
                left: value.kind(),
                right: candidate.kind(),
            }),
        }
    }
}

// =========================================================================
// Closures
// =========================================================================

/// Wraps an arbitrary scoring function
pub struct FnMetric<F> {
    name: &'static str,
    f: F,
}

impl<F> FnMetric<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V: ?Sized, C: ?Sized, F> SimilarityMetric<V, C> for FnMetric<F>
where
    F: Fn(&V, &C) -> f32 + Send + Sync,
{
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        (self.f)(value, candidate)
    }
}
