//! Built-in metrics over [`Matchable`] values
//!
//! The closed set of atomic metrics used by the default metric sequences.
//! Parsing numbers and dates out of names is the expensive part, so those
//! variants memoize per identifier.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use super::date_matcher::{DateMatcher, SimpleDate};
use super::media::Matchable;
use super::metrics::SimilarityMetric;
use super::season_episode::{SeasonEpisodeMatcher, SxE, season_from_folder};
use super::text_utils::normalize_name;

/// Name similarity is floored to this many ranks (quarters)
pub const NAME_SIMILARITY_RANKS: f32 = 4.0;

/// Decay of the vote count confidence in [`Metric::VoteRate`]
pub const VOTE_RATE_LAMBDA: f32 = 0.1;

/// Timestamps further apart than this score 0
pub const TIMESTAMP_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

static NUMBERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Memoized parse results keyed by the parsed text
#[derive(Debug, Default)]
pub struct ParseCache<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T: Clone> ParseCache<T> {
    pub fn get_or_parse(&self, key: &str, parse: impl FnOnce(&str) -> T) -> T {
        if let Some(hit) = self.entries.lock().get(key) {
            return hit.clone();
        }
        let parsed = parse(key);
        self.entries.lock().insert(key.to_string(), parsed.clone());
        parsed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Season/episode numbers, structured or parsed
#[derive(Debug, Default)]
pub struct SeasonEpisodeNumbers {
    matcher: SeasonEpisodeMatcher,
    cache: ParseCache<Vec<SxE>>,
}

impl SeasonEpisodeNumbers {
    pub fn new(matcher: SeasonEpisodeMatcher) -> Self {
        Self {
            matcher,
            cache: ParseCache::default(),
        }
    }

    pub fn numbers<T: Matchable + ?Sized>(&self, item: &T) -> Vec<SxE> {
        if let Some(numbers) = item.season_episode() {
            return numbers;
        }
        let mut numbers = self
            .cache
            .get_or_parse(&item.identifier(), |text| self.matcher.match_path(text));

        // identifiers that are bare names carry no parent path of their own
        if numbers.iter().any(|sxe| !sxe.has_season()) {
            if let Some(season) = item.folder().as_deref().and_then(season_from_folder) {
                for sxe in numbers.iter_mut().filter(|sxe| !sxe.has_season()) {
                    sxe.season = season;
                }
            }
        }
        numbers
    }
}

/// Air dates, structured or parsed
#[derive(Debug, Default)]
pub struct AirDates {
    matcher: DateMatcher,
    cache: ParseCache<Option<SimpleDate>>,
}

impl AirDates {
    pub fn new(matcher: DateMatcher) -> Self {
        Self {
            matcher,
            cache: ParseCache::default(),
        }
    }

    pub fn date<T: Matchable + ?Sized>(&self, item: &T) -> Option<SimpleDate> {
        item.air_date().or_else(|| {
            self.cache
                .get_or_parse(&item.name(), |text| self.matcher.match_date(text))
        })
    }
}

/// The built-in atomic metrics
#[derive(Debug)]
pub enum Metric {
    /// 1 when any normalized names are equal
    StringEquality,
    /// 1 when a normalized candidate name occurs in a value name or vice versa
    Substring,
    /// Share of the shorter side's numbers found on the other side
    Numeric,
    /// 1 equal, -1 both known and different
    FileSize,
    /// Linear proximity within [`TIMESTAMP_WINDOW`]
    TimeStamp,
    /// 1 exact, 0.5 partial, -1 both numbered but disjoint
    SeasonEpisode(SeasonEpisodeNumbers),
    /// 1 equal, -1 both known and different
    AirDate(AirDates),
    /// Token multiset overlap floored to [`NAME_SIMILARITY_RANKS`]
    NameBlockDistance,
    /// Candidate rating weighted by vote confidence
    VoteRate,
}

impl Metric {
    pub fn season_episode(matcher: SeasonEpisodeMatcher) -> Self {
        Metric::SeasonEpisode(SeasonEpisodeNumbers::new(matcher))
    }

    pub fn air_date(matcher: DateMatcher) -> Self {
        Metric::AirDate(AirDates::new(matcher))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::StringEquality => "string-equality",
            Metric::Substring => "substring",
            Metric::Numeric => "numeric",
            Metric::FileSize => "file-size",
            Metric::TimeStamp => "timestamp",
            Metric::SeasonEpisode(_) => "season-episode",
            Metric::AirDate(_) => "air-date",
            Metric::NameBlockDistance => "name-block-distance",
            Metric::VoteRate => "vote-rate",
        }
    }
}

impl<V: Matchable + ?Sized, C: Matchable + ?Sized> SimilarityMetric<V, C> for Metric {
    fn similarity(&self, value: &V, candidate: &C) -> f32 {
        match self {
            Metric::StringEquality => string_equality(value, candidate),
            Metric::Substring => substring(value, candidate),
            Metric::Numeric => numeric(value, candidate),
            Metric::FileSize => match (value.file_size(), candidate.file_size()) {
                (Some(a), Some(b)) => decisive(a == b),
                _ => 0.0,
            },
            Metric::TimeStamp => match (value.timestamp(), candidate.timestamp()) {
                (Some(a), Some(b)) => timestamp_proximity(a, b),
                _ => 0.0,
            },
            Metric::SeasonEpisode(numbers) => {
                season_episode_similarity(&numbers.numbers(value), &numbers.numbers(candidate))
            }
            Metric::AirDate(dates) => match (dates.date(value), dates.date(candidate)) {
                (Some(a), Some(b)) => decisive(a == b),
                _ => 0.0,
            },
            Metric::NameBlockDistance => name_block_distance(&value.name(), &candidate.name()),
            Metric::VoteRate => candidate.rating().map(vote_rate).unwrap_or(0.0),
        }
    }

    fn clear_cache(&self) {
        match self {
            Metric::SeasonEpisode(numbers) => numbers.cache.clear(),
            Metric::AirDate(dates) => dates.cache.clear(),
            _ => {}
        }
    }
}

fn decisive(equal: bool) -> f32 {
    if equal { 1.0 } else { -1.0 }
}

fn normalized_names<T: Matchable + ?Sized>(item: &T) -> Vec<String> {
    item.names()
        .iter()
        .map(|n| normalize_name(n))
        .filter(|n| !n.is_empty())
        .collect()
}

fn string_equality<V: Matchable + ?Sized, C: Matchable + ?Sized>(value: &V, candidate: &C) -> f32 {
    let left = normalized_names(value);
    let right = normalized_names(candidate);
    let equal = left.iter().any(|a| right.contains(a));
    if equal { 1.0 } else { 0.0 }
}

fn substring<V: Matchable + ?Sized, C: Matchable + ?Sized>(value: &V, candidate: &C) -> f32 {
    let left = normalized_names(value);
    let right = normalized_names(candidate);
    // whole words only: pad with spaces so "show" does not hit "showtime"
    let contains = |outer: &str, inner: &str| format!(" {outer} ").contains(&format!(" {inner} "));
    let found = left
        .iter()
        .any(|a| right.iter().any(|b| contains(a, b) || contains(b, a)));
    if found { 1.0 } else { 0.0 }
}

fn numbers_in(name: &str) -> Vec<u64> {
    let mut numbers: Vec<u64> = NUMBERS
        .find_iter(name)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

fn numeric<V: Matchable + ?Sized, C: Matchable + ?Sized>(value: &V, candidate: &C) -> f32 {
    let left = numbers_in(&normalize_name(&value.name()));
    let right = numbers_in(&normalize_name(&candidate.identifier()));
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let common = left.iter().filter(|n| right.binary_search(n).is_ok()).count();
    common as f32 / left.len().min(right.len()) as f32
}

fn timestamp_proximity(a: i64, b: i64) -> f32 {
    let window = TIMESTAMP_WINDOW.as_millis() as f64;
    let distance = a.abs_diff(b) as f64;
    (1.0 - distance / window).max(0.0) as f32
}

fn season_episode_similarity(left: &[SxE], right: &[SxE]) -> f32 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left.iter().any(|a| right.contains(a)) {
        return 1.0;
    }
    let partial = left.iter().any(|a| {
        right.iter().any(|b| {
            (a.has_season() && a.season == b.season) || (a.has_episode() && a.episode == b.episode)
        })
    });
    if partial { 0.5 } else { -1.0 }
}

fn name_block_distance(left: &str, right: &str) -> f32 {
    let left = normalize_name(left);
    let right = normalize_name(right);

    let mut counts: HashMap<&str, i32> = HashMap::new();
    let mut total = 0;
    for token in left.split_whitespace() {
        *counts.entry(token).or_default() += 1;
        total += 1;
    }
    for token in right.split_whitespace() {
        *counts.entry(token).or_default() -= 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let distance: i32 = counts.values().map(|c| c.abs()).sum();
    let similarity = 1.0 - distance as f32 / total as f32;
    (similarity * NAME_SIMILARITY_RANKS).floor() / NAME_SIMILARITY_RANKS
}

fn vote_rate((rating, votes): (f32, u32)) -> f32 {
    let confidence = 1.0 - (-VOTE_RATE_LAMBDA * votes as f32).exp();
    (rating / 10.0) * confidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::media::{Episode, MediaFile, Movie};
    use std::borrow::Cow;
    use pretty_assertions::assert_eq;

    fn file(path: &str) -> MediaFile {
        MediaFile::new(path)
    }

    #[test]
    fn test_season_episode_metric() {
        let metric = Metric::season_episode(SeasonEpisodeMatcher::default());
        let episode = Episode::new("Show", 1, 2);

        assert_eq!(metric.similarity(&file("/tv/Show.S01E02.mkv"), &episode), 1.0);
        assert_eq!(metric.similarity(&file("/tv/Show.S01E05.mkv"), &episode), 0.5);
        assert_eq!(metric.similarity(&file("/tv/Show.S03E04.mkv"), &episode), -1.0);
        assert_eq!(metric.similarity(&file("/tv/Show.mkv"), &episode), 0.0);
    }

    #[test]
    fn test_season_episode_metric_memoizes_by_identifier() {
        let metric = Metric::season_episode(SeasonEpisodeMatcher::default());
        let episode = Episode::new("Show", 1, 2);
        let value = file("/tv/Show.S01E02.mkv");

        metric.similarity(&value, &episode);
        metric.similarity(&value, &Episode::new("Show", 1, 3));
        let Metric::SeasonEpisode(numbers) = &metric else {
            panic!("wrong variant");
        };
        assert_eq!(numbers.cache.len(), 1);

        SimilarityMetric::<MediaFile, Episode>::clear_cache(&metric);
        assert!(numbers.cache.is_empty());
    }

    #[test]
    fn test_folder_fills_missing_season() {
        struct Clip {
            name: &'static str,
            folder: &'static str,
        }

        impl Matchable for Clip {
            fn name(&self) -> Cow<'_, str> {
                Cow::Borrowed(self.name)
            }

            fn folder(&self) -> Option<Cow<'_, str>> {
                Some(Cow::Borrowed(self.folder))
            }
        }

        let numbers = SeasonEpisodeNumbers::new(SeasonEpisodeMatcher::default());
        let clip = Clip {
            name: "Show - Episode 05.mkv",
            folder: "Season 2",
        };
        assert_eq!(numbers.numbers(&clip), vec![SxE::new(Some(2), Some(5))]);

        // the cached parse keeps the season undefined
        let other = Clip {
            name: "Show - Episode 05.mkv",
            folder: "Extras",
        };
        assert_eq!(numbers.numbers(&other), vec![SxE::absolute(5)]);
    }

    #[test]
    fn test_absolute_numbers_match_absolute_episodes() {
        let metric = Metric::season_episode(SeasonEpisodeMatcher::default());
        let episode = Episode::new("Show", 2, 3).with_absolute(15);
        assert_eq!(metric.similarity(&file("/anime/Show - Episode 15.mkv"), &episode), 1.0);
    }

    #[test]
    fn test_air_date_metric() {
        let metric = Metric::air_date(DateMatcher::default());
        let date = SimpleDate::new(2010, 1, 2).unwrap();
        let episode = Episode::new("Show", 1, 1).with_airdate(date);

        assert_eq!(metric.similarity(&file("/tv/Show.2010.01.02.mkv"), &episode), 1.0);
        assert_eq!(metric.similarity(&file("/tv/Show.2010.01.03.mkv"), &episode), -1.0);
        assert_eq!(metric.similarity(&file("/tv/Show.S01E01.mkv"), &episode), 0.0);
        assert_eq!(metric.similarity("Show 2 January 2010", &date), 1.0);
    }

    #[test]
    fn test_file_size_and_timestamp() {
        let a = file("a.mkv").with_size(100).with_timestamp(0);
        let b = file("b.mkv").with_size(100).with_timestamp(12 * 60 * 60 * 1000);
        let c = file("c.mkv").with_size(200);

        assert_eq!(Metric::FileSize.similarity(&a, &b), 1.0);
        assert_eq!(Metric::FileSize.similarity(&a, &c), -1.0);
        assert_eq!(Metric::FileSize.similarity(&a, &file("d.mkv")), 0.0);

        assert_eq!(Metric::TimeStamp.similarity(&a, &b), 0.5);
        assert_eq!(Metric::TimeStamp.similarity(&a, &c), 0.0);
    }

    #[test]
    fn test_name_metrics() {
        let episode = Episode {
            series_name: "Grey's Anatomy".into(),
            aliases: vec!["Greys Anatomy".into()],
            ..Default::default()
        };
        assert_eq!(Metric::StringEquality.similarity("greys.anatomy", &episode), 1.0);
        assert_eq!(Metric::Substring.similarity(&file("/tv/Greys.Anatomy.S01E01.mkv"), &episode), 1.0);
        assert_eq!(Metric::Substring.similarity(&file("/tv/Anatomy.mkv"), &episode), 1.0);
        assert_eq!(Metric::Substring.similarity(&file("/tv/Grey.mkv"), &episode), 0.0);
    }

    #[test]
    fn test_name_block_distance_is_floored_to_quarters() {
        assert_eq!(Metric::NameBlockDistance.similarity("The Show", "the.show"), 1.0);
        // 4 shared of 6 tokens: distance 2 of 6
        assert_eq!(Metric::NameBlockDistance.similarity("the show s01e01", "the show 1x01"), 0.5);
        assert_eq!(Metric::NameBlockDistance.similarity("alpha", "beta"), 0.0);
        assert_eq!(Metric::NameBlockDistance.similarity("", ""), 0.0);
    }

    #[test]
    fn test_numeric() {
        let movie = Movie::new("Blade Runner", 2049);
        assert_eq!(Metric::Numeric.similarity("Blade.Runner.2049.1080p", &movie), 1.0);
        assert_eq!(Metric::Numeric.similarity("Blade.Runner.1982", &movie), 0.0);
        assert_eq!(Metric::Numeric.similarity("Blade.Runner", &movie), 0.0);
    }

    #[test]
    fn test_vote_rate() {
        let movie = Movie::new("Heat", 1995).with_rating(8.0, 1_000_000);
        assert!((Metric::VoteRate.similarity("heat", &movie) - 0.8).abs() < 1e-6);

        let obscure = Movie::new("Heat", 1986).with_rating(8.0, 1);
        let expected = 0.8 * (1.0 - (-0.1_f32).exp());
        assert!((Metric::VoteRate.similarity("heat", &obscure) - expected).abs() < 1e-6);

        assert_eq!(Metric::VoteRate.similarity("heat", &Movie::new("Heat", 1995)), 0.0);
    }
}
