//! Common word sequence matching
//!
//! Finds the longest run of words shared by a set of names, e.g. the series
//! title shared by all files of a season:
//!
//! ```text
//! "The Show S01E01"  ┐
//! "The Show S01E02"  ┴─> "the show"
//! ```
//!
//! Words are compared through [`Collator`] keys, so `Amélie` and `amelie`
//! are the same word at primary strength.

use std::sync::Arc;

use tracing::trace;

use super::collation::{CollationKey, CollationStrength, Collator};
use super::text_utils::normalize_punctuation;

/// Default window of leading words in which a common sequence may start
pub const DEFAULT_MAX_START_INDEX: usize = 3;

#[derive(Debug)]
pub struct CommonSequenceMatcher {
    collator: Collator,
    max_start_index: usize,
    return_first_match: bool,
}

impl CommonSequenceMatcher {
    /// # Arguments
    /// * `max_start_index` - a sequence must start within the first
    ///   `max_start_index + 1` words of every input
    /// * `return_first_match` - stop at the first shared run instead of
    ///   searching for the longest one
    pub fn new(strength: CollationStrength, max_start_index: usize, return_first_match: bool) -> Self {
        Self {
            collator: Collator::new(strength),
            max_start_index,
            return_first_match,
        }
    }

    pub fn collator(&self) -> &Collator {
        &self.collator
    }

    pub fn max_start_index(&self) -> usize {
        self.max_start_index
    }

    pub fn returns_first_match(&self) -> bool {
        self.return_first_match
    }

    /// Longest common word run of all `names`, rendered as lower-case words
    /// joined by a single space. `None` if any pair shares nothing.
    pub fn match_first_common_sequence<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        let common = self.match_first_common_keys(names)?;
        let words: Vec<&str> = common.iter().map(|k| k.source()).collect();
        Some(words.join(" "))
    }

    /// Same as [`Self::match_first_common_sequence`] but returns the keys.
    pub fn match_first_common_keys<S: AsRef<str>>(&self, names: &[S]) -> Option<Vec<Arc<CollationKey>>> {
        let mut common: Option<Vec<Arc<CollationKey>>> = None;

        for name in names {
            let words = self.split(name.as_ref());
            let next = match common {
                None => words,
                Some(seq) => first_common_sequence(&seq, &words, self.max_start_index, self.return_first_match)?,
            };
            if next.is_empty() {
                return None;
            }
            common = Some(next);
        }

        trace!(
            inputs = names.len(),
            words = common.as_ref().map(|c| c.len()).unwrap_or(0),
            "Matched common sequence"
        );
        common
    }

    /// Keep punctuation-normalized words, lower-cased, so years and numbers
    /// survive for movie matching.
    fn split(&self, name: &str) -> Vec<Arc<CollationKey>> {
        let normalized = normalize_punctuation(name).to_lowercase();
        self.collator.collation_keys(normalized.split_whitespace())
    }
}

impl Default for CommonSequenceMatcher {
    fn default() -> Self {
        Self::new(CollationStrength::Primary, DEFAULT_MAX_START_INDEX, false)
    }
}

/// Find the longest run of equal elements that starts within
/// `max_start_index` in both sequences.
///
/// Ties keep the earliest run. With `return_first_match` the first run found
/// (scanning `seq1` then `seq2` start positions) is returned right away.
pub fn first_common_sequence<E: Ord + Clone>(
    seq1: &[E],
    seq2: &[E],
    max_start_index: usize,
    return_first_match: bool,
) -> Option<Vec<E>> {
    let mut best: Option<(usize, usize)> = None;

    for i in 0..seq1.len().min(max_start_index.saturating_add(1)) {
        for j in 0..seq2.len().min(max_start_index.saturating_add(1)) {
            let len = seq1[i..]
                .iter()
                .zip(&seq2[j..])
                .take_while(|(a, b)| a.cmp(b).is_eq())
                .count();

            if len > best.map(|(_, l)| l).unwrap_or(0) {
                best = Some((i, len));
                if return_first_match {
                    return Some(seq1[i..i + len].to_vec());
                }
            }
        }
    }

    best.map(|(start, len)| seq1[start..start + len].to_vec())
}
