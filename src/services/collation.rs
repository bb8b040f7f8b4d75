//! Collation keys for locale-lenient word comparison
//!
//! Keys are computed once per distinct word and cached, since the same
//! handful of words is compared over and over while searching for a common
//! sequence.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::text_utils::{lower_trim, transliterate};

/// How much of a word's spelling takes part in comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollationStrength {
    /// Base letters only: case and accents are ignored
    #[default]
    Primary,
    /// Accents matter, case does not
    Secondary,
    /// Exact spelling
    Tertiary,
}

/// A word together with its comparison key.
///
/// Ordering and equality consider only the key; the source word is kept so
/// matched sequences can be rendered back.
#[derive(Debug, Clone)]
pub struct CollationKey {
    source: String,
    key: String,
}

impl CollationKey {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for CollationKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CollationKey {}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Produces cached collation keys at a fixed strength
#[derive(Debug)]
pub struct Collator {
    strength: CollationStrength,
    cache: Mutex<HashMap<String, Arc<CollationKey>>>,
}

impl Collator {
    pub fn new(strength: CollationStrength) -> Self {
        Self {
            strength,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn strength(&self) -> CollationStrength {
        self.strength
    }

    pub fn collation_key(&self, word: &str) -> Arc<CollationKey> {
        if let Some(key) = self.cache.lock().get(word) {
            return key.clone();
        }

        let key = Arc::new(CollationKey {
            source: word.to_string(),
            key: self.fold(word),
        });
        self.cache.lock().insert(word.to_string(), key.clone());
        key
    }

    pub fn collation_keys<'a, I>(&self, words: I) -> Vec<Arc<CollationKey>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        words.into_iter().map(|w| self.collation_key(w)).collect()
    }

    /// Compare two words under this collator's strength
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collation_key(a).cmp(&self.collation_key(b))
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn fold(&self, word: &str) -> String {
        match self.strength {
            CollationStrength::Primary => transliterate(word).to_lowercase(),
            CollationStrength::Secondary => lower_trim(word),
            CollationStrength::Tertiary => word.to_string(),
        }
    }
}

impl Default for Collator {
    fn default() -> Self {
        Self::new(CollationStrength::Primary)
    }
}
