//! Application configuration management

use std::env;

use anyhow::{Context, Result, bail};

use crate::services::common_sequence::CommonSequenceMatcher;
use crate::services::collation::CollationStrength;
use crate::services::logging::{DEFAULT_FILTER, LogFormat, LogSettings};
use crate::services::season_episode::{SanityFilter, SeasonEpisodeMatcher};

/// Matcher configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Leave ambiguous pairs unmatched and skip speculative number patterns
    pub strict: bool,

    /// Sanity bounds for parsed season/episode numbers
    pub max_season: i32,
    pub max_season_episode: i32,
    pub max_absolute_episode: i32,

    /// Seasons named after a year must fall in this window
    pub season_year_begin: i32,
    pub season_year_end: i32,

    /// How far into each name a common series name may start
    pub common_sequence_max_start: usize,
    /// Take the first shared word run instead of the longest
    pub common_sequence_first_match: bool,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        let sanity = SanityFilter::default();
        let common = CommonSequenceMatcher::default();
        Self {
            strict: false,
            max_season: sanity.max_season,
            max_season_episode: sanity.max_season_episode,
            max_absolute_episode: sanity.max_absolute_episode,
            season_year_begin: sanity.season_year_begin,
            season_year_end: sanity.season_year_end,
            common_sequence_max_start: common.max_start_index(),
            common_sequence_first_match: common.returns_first_match(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        Ok(Self {
            strict: flag(lookup("MATCHER_STRICT"), defaults.strict).context("Invalid MATCHER_STRICT")?,

            max_season: var("MATCHER_MAX_SEASON", defaults.max_season.to_string())
                .parse()
                .context("Invalid MATCHER_MAX_SEASON")?,

            max_season_episode: var("MATCHER_MAX_SEASON_EPISODE", defaults.max_season_episode.to_string())
                .parse()
                .context("Invalid MATCHER_MAX_SEASON_EPISODE")?,

            max_absolute_episode: var("MATCHER_MAX_ABSOLUTE_EPISODE", defaults.max_absolute_episode.to_string())
                .parse()
                .context("Invalid MATCHER_MAX_ABSOLUTE_EPISODE")?,

            season_year_begin: var("MATCHER_SEASON_YEAR_BEGIN", defaults.season_year_begin.to_string())
                .parse()
                .context("Invalid MATCHER_SEASON_YEAR_BEGIN")?,

            season_year_end: var("MATCHER_SEASON_YEAR_END", defaults.season_year_end.to_string())
                .parse()
                .context("Invalid MATCHER_SEASON_YEAR_END")?,

            common_sequence_max_start: var(
                "MATCHER_COMMON_SEQUENCE_MAX_START",
                defaults.common_sequence_max_start.to_string(),
            )
            .parse()
            .context("Invalid MATCHER_COMMON_SEQUENCE_MAX_START")?,

            common_sequence_first_match: flag(
                lookup("MATCHER_COMMON_SEQUENCE_FIRST_MATCH"),
                defaults.common_sequence_first_match,
            )
            .context("Invalid MATCHER_COMMON_SEQUENCE_FIRST_MATCH")?,

            log_format: var("LOG_FORMAT", "pretty".to_string())
                .parse()
                .context("Invalid LOG_FORMAT")?,
        })
    }

    /// Validated sanity bounds
    pub fn sanity_filter(&self) -> crate::error::Result<SanityFilter> {
        SanityFilter::new(
            self.max_season,
            self.max_season_episode,
            self.max_absolute_episode,
            self.season_year_begin,
            self.season_year_end,
        )
    }

    pub fn season_episode_matcher(&self) -> crate::error::Result<SeasonEpisodeMatcher> {
        Ok(SeasonEpisodeMatcher::new(self.sanity_filter()?, self.strict))
    }

    pub fn common_sequence_matcher(&self) -> CommonSequenceMatcher {
        CommonSequenceMatcher::new(
            CollationStrength::Primary,
            self.common_sequence_max_start,
            self.common_sequence_first_match,
        )
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            format: self.log_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Boolean environment value; unset falls back to `default`
fn flag(value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got {other:?}"),
    }
}
