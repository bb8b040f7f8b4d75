//! Default metric sequences
//!
//! Ordered metric lists handed to the [`Matcher`](super::matcher::Matcher),
//! one per use case. The order is the refinement order: ties left by one
//! level are broken by the next.

use super::date_matcher::DateMatcher;
use super::episode_metrics::Metric;
use super::media::Matchable;
use super::metrics::{Average, BoxedMetric, Cascade, CrossProperty, Floor, PropertySimilarity};
use super::season_episode::SeasonEpisodeMatcher;
use crate::error::Result;

/// Files against episodes:
/// 1. numbering or air date, whichever is decisive
/// 2. series name found in the file name
/// 3. name block distance and shared numbers
/// 4. file time close to the air date (never negative)
pub fn episode_sequence<V, C>(season_episode: SeasonEpisodeMatcher, dates: DateMatcher) -> Result<Vec<BoxedMetric<V, C>>>
where
    V: Matchable + ?Sized + 'static,
    C: Matchable + ?Sized + 'static,
{
    let numbering: Vec<BoxedMetric<V, C>> = vec![
        Box::new(Metric::season_episode(season_episode)),
        Box::new(Metric::air_date(dates)),
    ];
    let metrics: Vec<BoxedMetric<V, C>> = vec![
        Box::new(Cascade::new(numbering)?),
        Box::new(Metric::Substring),
        Box::new(name_and_numbers::<V, C>()?),
        Box::new(Floor::new(Metric::TimeStamp, 0.0)?),
    ];
    Ok(metrics)
}

/// Files or names against movies: title, year, then popularity
pub fn movie_sequence<V, C>() -> Result<Vec<BoxedMetric<V, C>>>
where
    V: Matchable + ?Sized + 'static,
    C: Matchable + ?Sized + 'static,
{
    let metrics: Vec<BoxedMetric<V, C>> = vec![
        Box::new(Metric::Substring),
        Box::new(name_and_numbers::<V, C>()?),
        Box::new(Metric::VoteRate),
    ];
    Ok(metrics)
}

/// Re-checks an already applied pairing: identical sizes or names, then
/// shared properties.
pub fn verification_sequence<V, C>() -> Result<Vec<BoxedMetric<V, C>>>
where
    V: Matchable + ?Sized + 'static,
    C: Matchable + ?Sized + 'static,
{
    let identity: Vec<BoxedMetric<V, C>> = vec![Box::new(Metric::FileSize), Box::new(Metric::StringEquality)];
    let metrics: Vec<BoxedMetric<V, C>> = vec![
        Box::new(Cascade::new(identity)?),
        Box::new(CrossProperty::new(PropertySimilarity)),
    ];
    Ok(metrics)
}

fn name_and_numbers<V, C>() -> Result<Average<V, C>>
where
    V: Matchable + ?Sized + 'static,
    C: Matchable + ?Sized + 'static,
{
    let members: Vec<BoxedMetric<V, C>> = vec![Box::new(Metric::NameBlockDistance), Box::new(Metric::Numeric)];
    Average::new(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::date_matcher::SimpleDate;
    use crate::services::matcher::Matcher;
    use crate::services::media::{Episode, MediaFile, Movie};
    use crate::services::metrics::SimilarityMetric;
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_episode_sequence_pairs_files() {
        let files = vec![
            MediaFile::new("/tv/Show/Show.S01E02.mkv"),
            MediaFile::new("/tv/Show/Show.S01E01.mkv"),
            MediaFile::new("/tv/Show/Show.2010.01.15.mkv"),
        ];
        let episodes = vec![
            Episode::new("Show", 1, 1).with_airdate(SimpleDate::new(2010, 1, 1).unwrap()),
            Episode::new("Show", 1, 2).with_airdate(SimpleDate::new(2010, 1, 8).unwrap()),
            Episode::new("Show", 1, 3).with_airdate(SimpleDate::new(2010, 1, 15).unwrap()),
        ];
        let metrics = episode_sequence(SeasonEpisodeMatcher::default(), DateMatcher::default()).unwrap();

        let matcher = Matcher::new(&files, &episodes, true, &metrics);
        let mut pairs: Vec<(String, String)> = matcher
            .match_all(&CancellationToken::new())
            .unwrap()
            .iter()
            .map(|m| (m.value().file_name().to_string(), m.candidate().to_string()))
            .collect();
        pairs.sort();

        assert_eq!(
            pairs,
            vec![
                ("Show.2010.01.15.mkv".to_string(), "Show - 1x03".to_string()),
                ("Show.S01E01.mkv".to_string(), "Show - 1x01".to_string()),
                ("Show.S01E02.mkv".to_string(), "Show - 1x02".to_string()),
            ]
        );
    }

    #[test]
    fn test_movie_sequence_prefers_year() {
        let files = vec![MediaFile::new("/movies/Heat.1995.1080p.mkv")];
        let movies = vec![
            Movie::new("Heat", 1986).with_rating(5.0, 3_000),
            Movie::new("Heat", 1995).with_rating(8.3, 700_000),
        ];
        let metrics = movie_sequence().unwrap();

        let matcher = Matcher::new(&files, &movies, true, &metrics);
        let matches = matcher.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate().year, Some(1995));
    }

    #[test]
    fn test_verification_sequence() {
        let metrics = verification_sequence::<MediaFile, MediaFile>().unwrap();
        let a = MediaFile::new("/a/Show.S01E01.mkv").with_size(10);
        let b = MediaFile::new("/b/Show.S01E01.mkv").with_size(10);
        let c = MediaFile::new("/b/Other.mkv").with_size(20);

        assert_eq!(metrics[0].similarity(&a, &b), 1.0);
        assert_eq!(metrics[0].similarity(&a, &c), -1.0);
        assert!(metrics[1].similarity(&a, &b) > metrics[1].similarity(&a, &c));
    }
}
