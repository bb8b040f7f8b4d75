//! Series name discovery
//!
//! Finds the title shared by a set of episode file names by cutting each
//! name at its numbering and looking for the common word run of the heads.

use tracing::debug;

use super::common_sequence::CommonSequenceMatcher;
use super::season_episode::SeasonEpisodeMatcher;
use super::text_utils::{normalize_brackets, remove_embedded_checksum, strip_extension};

#[derive(Debug, Default)]
pub struct SeriesNameMatcher {
    season_episode: SeasonEpisodeMatcher,
    common: CommonSequenceMatcher,
}

impl SeriesNameMatcher {
    pub fn new(season_episode: SeasonEpisodeMatcher, common: CommonSequenceMatcher) -> Self {
        Self {
            season_episode,
            common,
        }
    }

    /// Common series name of `names`, lower-cased, or `None` when the names
    /// share nothing.
    pub fn common_series_name<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        let heads: Vec<String> = names.iter().map(|n| self.head(n.as_ref())).collect();
        let common = self.common.match_first_common_sequence(&heads);
        debug!(names = names.len(), common = ?common, "Common series name");
        common
    }

    /// Text before the numbering; the whole cleaned name if there is none
    fn head(&self, name: &str) -> String {
        let clean = normalize_brackets(&remove_embedded_checksum(strip_extension(name)));
        match self.season_episode.head(&clean) {
            Some(head) => head.to_string(),
            None => clean.trim().to_string(),
        }
    }
}
