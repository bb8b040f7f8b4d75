//! Season/episode pattern engine
//!
//! Parses loosely formatted episode numbering out of file names:
//! - "Show.Name.S01E02.mkv"        → 1x02
//! - "Show Name 1x01-1x02"         → 1x01, 1x02
//! - "Show Name Season 2 Episode 5"→ 2x05
//! - "Show Name - Part 1 of 3"     → 01 (absolute)
//! - "Show.Name.101.mkv"           → 1x01 and absolute 101
//!
//! Patterns are tried from most to least specific and the first one that
//! yields a plausible token wins; speculative digit runs are only reached
//! when nothing more explicit matched.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::recognizer::{Leading, Recognizer, align, group_number};
use crate::error::{MatchError, Result};

/// Largest span accepted for an episode range that carries no season
pub const MAX_RANGE_SPAN: i32 = 10;

// =========================================================================
// SxE
// =========================================================================

/// A parsed (season, episode) token.
///
/// Either field may be [`SxE::UNDEFINED`]; a token with an undefined season
/// is an absolute episode number. Ordered by season, then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SxE {
    pub season: i32,
    pub episode: i32,
}

impl SxE {
    pub const UNDEFINED: i32 = -1;

    pub fn new(season: Option<i32>, episode: Option<i32>) -> Self {
        Self {
            season: season.unwrap_or(Self::UNDEFINED),
            episode: episode.unwrap_or(Self::UNDEFINED),
        }
    }

    pub fn absolute(episode: i32) -> Self {
        Self::new(None, Some(episode))
    }

    pub fn has_season(&self) -> bool {
        self.season >= 0
    }

    pub fn has_episode(&self) -> bool {
        self.episode >= 0
    }
}

impl fmt::Display for SxE {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_season() {
            write!(f, "{}x{:02}", self.season, self.episode)
        } else {
            write!(f, "{:02}", self.episode)
        }
    }
}

// =========================================================================
// Sanity filter
// =========================================================================

/// Plausibility bounds for numbers parsed out of speculative patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanityFilter {
    /// Seasons must be below this (unless they look like a year)
    pub max_season: i32,
    /// Episodes within a season must be below this
    pub max_season_episode: i32,
    /// Absolute episodes must be below this
    pub max_absolute_episode: i32,
    /// Seasons named after a year must fall in this window
    pub season_year_begin: i32,
    pub season_year_end: i32,
}

impl SanityFilter {
    pub fn new(
        max_season: i32,
        max_season_episode: i32,
        max_absolute_episode: i32,
        season_year_begin: i32,
        season_year_end: i32,
    ) -> Result<Self> {
        if max_season <= 0 || max_season_episode <= 0 || max_absolute_episode <= 0 {
            return Err(MatchError::invalid(format!(
                "sanity limits must be positive (season {max_season}, episode {max_season_episode}, absolute {max_absolute_episode})"
            )));
        }
        if season_year_begin > season_year_end {
            return Err(MatchError::invalid(format!(
                "season year window is inverted ({season_year_begin} > {season_year_end})"
            )));
        }

        Ok(Self {
            max_season,
            max_season_episode,
            max_absolute_episode,
            season_year_begin,
            season_year_end,
        })
    }

    pub fn is_year(&self, value: i32) -> bool {
        (self.season_year_begin..=self.season_year_end).contains(&value)
    }

    /// True if the token is plausible
    pub fn accept(&self, sxe: &SxE) -> bool {
        if !sxe.has_episode() {
            return false;
        }
        if !sxe.has_season() {
            return sxe.episode < self.max_absolute_episode;
        }
        if self.is_year(sxe.season) {
            return sxe.episode < self.max_absolute_episode;
        }
        sxe.season < self.max_season && sxe.episode < self.max_season_episode
    }
}

impl Default for SanityFilter {
    fn default() -> Self {
        Self {
            max_season: 50,
            max_season_episode: 50,
            max_absolute_episode: 1000,
            season_year_begin: 1970,
            season_year_end: 2100,
        }
    }
}

// =========================================================================
// Patterns
// =========================================================================

const SEASON_WORDS: &str = "season|series|saison|temporada|stagione|staffel|sezon|сезон";
const EPISODE_WORDS: &str = "episode|episodio|épisode|folge|odcinek|серия|ep";

/// S01E01-E05
static RANGE_SXE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s(\d{1,2}|\d{4})e(\d{2,3})-e(\d{2,3})(?:[^\p{L}\p{N}]|$)").expect("valid regex")
});

/// S01E02, s01.e02, [s01]_[e02], S01E01E02, S01E01-02, s2010e01
static SXE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s(\d{1,2}|\d{4})[^\p{L}\p{N}]{0,3}(?:ep|e)(\d{1,3}(?:(?:-e|-|e)\d{1,3})*)")
        .expect("valid regex")
});

/// 1x01, 01x02, 1x01x02
static NXN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})x(\d{2,3})((?:x\d{2,3})*)(?:[^\p{L}\p{N}]|$)").expect("valid regex")
});

/// Season 1 Episode 2
static VERBOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:{SEASON_WORDS})[^\p{{L}}\p{{N}}]{{0,3}}(\d{{1,4}})[^\p{{L}}\p{{N}}]{{0,3}}(?:{EPISODE_WORDS})[^\p{{L}}\p{{N}}]{{0,3}}(\d{{1,3}})(?:\D|$)"
    ))
    .expect("valid regex")
});

/// Episode 01-05 (absolute range)
static EPISODE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:{EPISODE_WORDS}|e)[^\p{{L}}\p{{N}}]{{0,2}}(\d{{1,4}})\s?-\s?(\d{{1,4}})(?:[^\p{{L}}\p{{N}}]|$)"
    ))
    .expect("valid regex")
});

/// Part 2 of 3, 1of2
static PART_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(?:part|pt|episode|ep)[^\p{L}\p{N}]{0,2})?(\d{1,2})[^\p{L}\p{N}]{0,2}of[^\p{L}\p{N}]{0,2}(\d{1,2})(?:[^\p{L}\p{N}]|$)")
        .expect("valid regex")
});

/// Episode 5, Ep.05, E05
static EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:{EPISODE_WORDS}|e)[^\p{{L}}\p{{N}}]{{0,2}}(\d{{1,4}})(?:[^\p{{L}}\p{{N}}]|$)"
    ))
    .expect("valid regex")
});

/// 1.02
static DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\.(\d{2})(?:[^\p{L}\p{N}]|$)").expect("valid regex"));

/// 01, 101, 1003, 10102
static DIGITS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-2]?\d?)(\d{2})(\d{2})?(?:[^\p{L}\p{N}]|$)").expect("valid regex")
});

/// Season folder: "Season 2", "Staffel 2", "2. Season"
static SEASON_FOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:(?:{SEASON_WORDS})[^\p{{L}}\p{{N}}]?(\d{{1,2}})|(\d{{1,2}})[^\p{{L}}\p{{N}}]{{0,2}}season)(?:[^\p{{L}}\p{{N}}]|$)"
    ))
    .expect("valid regex")
});

type Build = fn(&Captures<'_>, &SanityFilter) -> Vec<SxE>;

/// One textual convention: a recognizer plus the token construction for it
#[derive(Clone, Copy)]
struct SeasonEpisodePattern {
    name: &'static str,
    recognizer: Recognizer,
    /// Speculative patterns run their tokens through the sanity filter
    sanity: bool,
    build: Build,
    /// Extra guard on the text before the match (e.g. dates)
    guard: Option<fn(&str, &Captures<'_>) -> bool>,
}

impl SeasonEpisodePattern {
    fn tokens(&self, text: &str, from: usize, sanity: &SanityFilter) -> Vec<(usize, Vec<SxE>)> {
        self.recognizer
            .captures_from(text, from)
            .iter()
            .filter(|caps| self.guard.is_none_or(|guard| guard(text, caps)))
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let tokens: Vec<SxE> = (self.build)(caps, sanity)
                    .into_iter()
                    .filter(|sxe| !self.sanity || sanity.accept(sxe))
                    .collect();
                (!tokens.is_empty()).then_some((start, tokens))
            })
            .collect()
    }

    fn match_all(&self, text: &str, sanity: &SanityFilter) -> Vec<SxE> {
        let mut matches = Vec::with_capacity(2);
        for (_, tokens) in self.tokens(text, 0, sanity) {
            for sxe in tokens {
                if !matches.contains(&sxe) {
                    matches.push(sxe);
                }
            }
        }
        matches
    }

    fn find(&self, text: &str, from: usize, sanity: &SanityFilter) -> Option<usize> {
        self.tokens(text, from, sanity).first().map(|(start, _)| *start)
    }
}

impl fmt::Debug for SeasonEpisodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeasonEpisodePattern")
            .field("name", &self.name)
            .field("sanity", &self.sanity)
            .finish()
    }
}

/// A priority level: either one pattern, or several whose results merge
#[derive(Debug, Clone)]
enum PatternTier {
    Single(SeasonEpisodePattern),
    Union(Vec<SeasonEpisodePattern>),
}

impl PatternTier {
    fn patterns(&self) -> &[SeasonEpisodePattern] {
        match self {
            PatternTier::Single(pattern) => std::slice::from_ref(pattern),
            PatternTier::Union(patterns) => patterns,
        }
    }

    fn match_all(&self, text: &str, sanity: &SanityFilter) -> Vec<SxE> {
        let mut merged = Vec::new();
        for pattern in self.patterns() {
            for sxe in pattern.match_all(text, sanity) {
                if !merged.contains(&sxe) {
                    merged.push(sxe);
                }
            }
        }
        merged
    }

    fn find(&self, text: &str, from: usize, sanity: &SanityFilter) -> Option<usize> {
        self.patterns().iter().filter_map(|p| p.find(text, from, sanity)).min()
    }
}

fn episode_list(season: Option<i32>, list: &str) -> Vec<SxE> {
    let mut tokens: Vec<SxE> = Vec::with_capacity(2);
    for number in list.split(|c: char| !c.is_ascii_digit()).filter(|s| !s.is_empty()) {
        let Ok(episode) = number.parse::<i32>() else {
            continue;
        };
        // continuation episodes must ascend closely after the previous one
        if let Some(previous) = tokens.last() {
            if episode <= previous.episode || episode > previous.episode + MAX_RANGE_SPAN {
                break;
            }
        }
        tokens.push(SxE::new(season, Some(episode)));
    }
    tokens
}

fn build_range(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    let season = group_number(caps, 1);
    match (group_number(caps, 2), group_number(caps, 3)) {
        (Some(first), Some(last)) if first <= last => {
            (first..=last).map(|e| SxE::new(season, Some(e))).collect()
        }
        _ => Vec::new(),
    }
}

fn build_sxe(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    let list = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    episode_list(group_number(caps, 1), list)
}

fn build_nxn(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    let first = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let more = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    // 1x01x02 continues like S01E01E02
    episode_list(group_number(caps, 1), &format!("{first}{more}"))
}

fn build_verbose(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    vec![SxE::new(group_number(caps, 1), group_number(caps, 2))]
}

fn build_episode_range(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    match (group_number(caps, 1), group_number(caps, 2)) {
        (Some(first), Some(last)) if first < last && last - first <= MAX_RANGE_SPAN => {
            (first..=last).map(SxE::absolute).collect()
        }
        _ => Vec::new(),
    }
}

fn build_part_of(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    match (group_number(caps, 1), group_number(caps, 2)) {
        (Some(part), Some(total)) if part >= 1 && part <= total => vec![SxE::absolute(part)],
        _ => Vec::new(),
    }
}

fn build_episode(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    group_number(caps, 1).map(SxE::absolute).into_iter().collect()
}

fn build_dotted(caps: &Captures<'_>, _: &SanityFilter) -> Vec<SxE> {
    vec![SxE::new(group_number(caps, 1), group_number(caps, 2))]
}

/// Digit runs are either season+episode or an absolute number; both
/// interpretations are returned and left for the metrics to decide.
fn build_digits(caps: &Captures<'_>, sanity: &SanityFilter) -> Vec<SxE> {
    let season_digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let episode_digits = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let season = season_digits.parse::<i32>().ok();

    if let Some(second) = caps.get(3) {
        // 10102 => 1x01, 1x02
        return vec![
            SxE::new(season, episode_digits.parse().ok()),
            SxE::new(season, second.as_str().parse().ok()),
        ];
    }

    let run = format!("{season_digits}{episode_digits}");
    let Ok(absolute) = run.parse::<i32>() else {
        return Vec::new();
    };
    if run.len() == 4 && sanity.is_year(absolute) {
        // a bare year is not an episode number
        return Vec::new();
    }

    let mut tokens = Vec::with_capacity(2);
    if season.is_some() {
        tokens.push(SxE::new(season, episode_digits.parse().ok()));
    }
    tokens.push(SxE::absolute(absolute));
    tokens
}

/// Date context around a numeric token: "2010.01.02", "01.02.2010"
static DATE_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[.\-/_ ](?:\d{1,2}[.\-/_ ])?$").expect("valid regex"));
static DATE_AFTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[.\-/_ ](?:\d{1,2}[.\-/_ ])?\d{4}(?:\D|$)").expect("valid regex"));

/// Reject numeric tokens that are part of a date
fn not_a_date(text: &str, caps: &Captures<'_>) -> bool {
    let Some(start) = caps.get(0).map(|m| m.start()) else {
        return false;
    };
    // end of the digits, excluding the consumed trailing delimiter
    let end = caps.iter().skip(1).flatten().map(|m| m.end()).max().unwrap_or(start);
    !DATE_BEFORE.is_match(&text[..start]) && !DATE_AFTER.is_match(&text[end..])
}

fn pattern(name: &'static str, regex: &'static Lazy<Regex>, leading: Leading, sanity: bool, build: Build) -> SeasonEpisodePattern {
    SeasonEpisodePattern {
        name,
        recognizer: Recognizer::new(regex, leading),
        sanity,
        build,
        guard: None,
    }
}

// =========================================================================
// Matcher
// =========================================================================

/// Season/episode extraction over a priority-ordered pattern list
#[derive(Debug, Clone)]
pub struct SeasonEpisodeMatcher {
    tiers: Vec<PatternTier>,
    sanity: SanityFilter,
    strict: bool,
}

impl SeasonEpisodeMatcher {
    /// # Arguments
    /// * `sanity` - bounds applied to speculative patterns
    /// * `strict` - only use patterns that carry an explicit season marker
    pub fn new(sanity: SanityFilter, strict: bool) -> Self {
        let mut tiers = vec![
            PatternTier::Single(pattern("range", &RANGE_SXE, Leading::NotAlnum, false, build_range)),
            PatternTier::Single(pattern("sxe", &SXE, Leading::NotDigit, false, build_sxe)),
            PatternTier::Single(pattern("nxn", &NXN, Leading::NotAlnum, true, build_nxn)),
            PatternTier::Single(pattern("verbose", &VERBOSE, Leading::NotAlnum, false, build_verbose)),
        ];

        if !strict {
            let dotted = SeasonEpisodePattern {
                guard: Some(not_a_date),
                ..pattern("dotted", &DOTTED, Leading::NotAlnum, true, build_dotted)
            };
            let digits = SeasonEpisodePattern {
                guard: Some(not_a_date),
                ..pattern("digits", &DIGITS, Leading::NotAlnum, true, build_digits)
            };
            tiers.extend([
                PatternTier::Single(pattern("episode-range", &EPISODE_RANGE, Leading::NotAlnum, true, build_episode_range)),
                PatternTier::Single(pattern("part-of", &PART_OF, Leading::NotAlnum, true, build_part_of)),
                PatternTier::Single(pattern("episode", &EPISODE, Leading::NotAlnum, true, build_episode)),
                PatternTier::Union(vec![dotted, digits]),
            ]);
        }

        Self { tiers, sanity, strict }
    }

    pub fn sanity(&self) -> &SanityFilter {
        &self.sanity
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Tokens of the first pattern that matches `text`; empty if none does.
    pub fn match_text(&self, text: &str) -> Vec<SxE> {
        for tier in &self.tiers {
            let matches = tier.match_all(text, &self.sanity);
            if !matches.is_empty() {
                trace!(text, ?tier, count = matches.len(), "Matched season/episode");
                return matches;
            }
        }
        Vec::new()
    }

    /// Like [`Self::match_text`] on the file name, then fill undefined seasons
    /// from a season folder in the parent path.
    pub fn match_path(&self, path: impl AsRef<Path>) -> Vec<SxE> {
        let path = path.as_ref();
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let mut matches = self.match_text(&name);
        if matches.iter().any(|sxe| !sxe.has_season()) {
            let parent = path.parent().map(|p| p.to_string_lossy());
            if let Some(season) = parent.as_deref().and_then(season_from_folder) {
                for sxe in matches.iter_mut().filter(|sxe| !sxe.has_season()) {
                    sxe.season = season;
                }
            }
        }
        matches
    }

    /// Byte index where the first matching pattern's first token begins,
    /// searching from `from`.
    pub fn find(&self, text: &str, from: usize) -> Option<usize> {
        let from = align(text, from);
        self.tiers
            .iter()
            .find_map(|tier| tier.find(text, from, &self.sanity))
    }

    /// Text in front of the numbering (usually the series name)
    pub fn head<'t>(&self, name: &'t str) -> Option<&'t str> {
        match self.find(name, 0) {
            Some(pos) if pos > 0 => Some(name[..pos].trim()),
            _ => None,
        }
    }
}

impl Default for SeasonEpisodeMatcher {
    fn default() -> Self {
        Self::new(SanityFilter::default(), false)
    }
}

/// Season number from a folder path segment like "Season 02"
pub fn season_from_folder(path: &str) -> Option<i32> {
    // nearest segment wins
    let recognizer = Recognizer::new(&SEASON_FOLDER, Leading::NotAlnum);
    recognizer
        .captures_from(path, 0)
        .last()
        .and_then(|caps| group_number(caps, 1).or_else(|| group_number(caps, 2)))
}
