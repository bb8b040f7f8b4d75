//! Integration tests for the matching pipeline
//!
//! These tests run the public API end to end:
//! - Season/episode recognition in file names
//! - Common series names
//! - The disjoint matcher with custom and default metric sequences
//! - Scanning a directory and matching it against an episode list

use media_matcher::MatchError;
use media_matcher::services::{
    BoxedMetric, Cascade, CommonSequenceMatcher, DateMatcher, Episode, FnMetric, Matcher, MediaFile,
    SeasonEpisodeMatcher, SeriesNameMatcher, SimilarityMetric, SxE, collect_media_files, episode_sequence,
};
use tokio_util::sync::CancellationToken;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn table(scores: &'static [(&'static str, &'static str, f32)]) -> BoxedMetric<String> {
    Box::new(FnMetric::new("table", move |v: &String, c: &String| {
        scores
            .iter()
            .find(|(a, b, _)| *a == v.as_str() && *b == c.as_str())
            .map(|(_, _, s)| *s)
            .unwrap_or(0.0)
    }))
}

fn pairs<V: ToString, C: ToString>(matches: &[media_matcher::services::Match<'_, V, C>]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = matches
        .iter()
        .map(|m| (m.value().to_string(), m.candidate().to_string()))
        .collect();
    pairs.sort();
    pairs
}

// ============================================================================
// Season/Episode Recognition
// ============================================================================

mod season_episode {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sxxexx_file_name() {
        let matcher = SeasonEpisodeMatcher::default();
        assert_eq!(matcher.match_text("Show.Name.S01E02.mkv"), vec![SxE::new(Some(1), Some(2))]);
    }

    #[test]
    fn test_digit_run_has_both_readings() {
        let matcher = SeasonEpisodeMatcher::default();
        assert_eq!(
            matcher.match_text("Show.Name.101.mkv"),
            vec![SxE::new(Some(1), Some(1)), SxE::absolute(101)]
        );
    }

    #[test]
    fn test_sxe_ordering() {
        assert!(SxE::new(Some(1), Some(2)) < SxE::new(Some(1), Some(3)));
        assert!(SxE::new(Some(1), Some(3)) < SxE::new(Some(2), Some(1)));
        assert!(SxE::absolute(5) < SxE::absolute(6));
    }
}

// ============================================================================
// Common Sequences
// ============================================================================

mod common_sequence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_common_show_name() {
        let matcher = CommonSequenceMatcher::default();
        let common = matcher.match_first_common_sequence(&["The Show S01E01", "The Show S01E02"]);
        assert_eq!(common.as_deref(), Some("the show"));
    }

    #[test]
    fn test_series_name_of_release_files() {
        let matcher = SeriesNameMatcher::default();
        let names = ["Show.S01E01.mkv", "Show - 1x03 - Title.mkv", "[Group] Show 1x04 [0A1B2C3D].mkv"];
        assert_eq!(matcher.common_series_name(&names).as_deref(), Some("show"));
    }
}

// ============================================================================
// Disjoint Matcher
// ============================================================================

mod disjoint_matcher {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity_scores_pair_up() {
        let values = strings(&["f1", "f2"]);
        let candidates = strings(&["e1", "e2"]);
        let metrics = vec![table(&[
            ("f1", "e1", 1.0),
            ("f1", "e2", 0.0),
            ("f2", "e1", 0.0),
            ("f2", "e2", 1.0),
        ])];

        let matcher = Matcher::new(&values, &candidates, false, &metrics);
        let matches = matcher.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(
            pairs(&matches),
            vec![("f1".into(), "e1".into()), ("f2".into(), "e2".into())]
        );
    }

    #[test]
    fn test_perfect_tie_is_left_alone_in_strict_mode() {
        let values = strings(&["b", "a"]);
        let candidates = strings(&["x"]);
        let metrics = vec![table(&[("a", "x", 1.0), ("b", "x", 1.0)])];

        let strict = Matcher::new(&values, &candidates, true, &metrics);
        assert!(strict.match_all(&CancellationToken::new()).unwrap().is_empty());
        assert_eq!(strict.remaining_values().len(), 2);
        assert_eq!(strict.remaining_candidates().len(), 1);

        let lenient = Matcher::new(&values, &candidates, false, &metrics);
        let matches = lenient.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(pairs(&matches), vec![("a".into(), "x".into())]);
    }

    #[test]
    fn test_strict_mode_drops_buckets_shared_with_claimed_edges() {
        let values = strings(&["v1", "v2"]);
        let candidates = strings(&["c1", "c2"]);
        let metrics = vec![table(&[("v1", "c1", 1.0), ("v1", "c2", 0.5), ("v2", "c2", 0.5)])];

        let strict = Matcher::new(&values, &candidates, true, &metrics);
        let matches = strict.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(pairs(&matches), vec![("v1".into(), "c1".into())]);
    }

    #[test]
    fn test_cascade_short_circuits() {
        let cascade = Cascade::new(vec![
            table(&[("v", "c", 1.0)]),
            table(&[("v", "c", -1.0)]),
        ])
        .unwrap();
        assert_eq!(cascade.similarity(&"v".to_string(), &"c".to_string()), 1.0);
    }

    #[test]
    fn test_cancelled_run_reports_error() {
        let values = strings(&["a"]);
        let candidates = strings(&["x"]);
        let metrics = vec![table(&[("a", "x", 1.0)])];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let matcher = Matcher::new(&values, &candidates, false, &metrics);
        assert!(matches!(matcher.match_all(&cancel), Err(MatchError::Cancelled)));
    }
}

// ============================================================================
// Files Against Episodes
// ============================================================================

mod episode_matching {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn episodes() -> Vec<Episode> {
        (1..=3).map(|e| Episode::new("Show", 1, e)).collect()
    }

    fn file_names(files: &[&MediaFile]) -> Vec<String> {
        files.iter().map(|f| f.file_name().to_string()).collect()
    }

    #[test]
    fn test_scanned_directory_is_matched() {
        let dir = tempfile::tempdir().unwrap();
        let show = dir.path().join("Show");
        fs::create_dir_all(&show).unwrap();
        for name in ["Show.S01E01.mkv", "Show.S01E02.mkv", "Show - 1x03 - Title.mkv", "Unrelated.mkv", "Show.S01E01.srt"] {
            fs::write(show.join(name), b"").unwrap();
        }

        let files = collect_media_files(&[dir.path()]);
        assert_eq!(files.len(), 4);

        let episodes = episodes();
        let metrics = episode_sequence(SeasonEpisodeMatcher::default(), DateMatcher::default()).unwrap();
        let matcher = Matcher::new(&files, &episodes, true, &metrics);
        let matches = matcher.match_all(&CancellationToken::new()).unwrap();

        let mut matched: Vec<(String, String)> = matches
            .iter()
            .map(|m| (m.value().file_name().to_string(), m.candidate().to_string()))
            .collect();
        matched.sort();
        assert_eq!(
            matched,
            vec![
                ("Show - 1x03 - Title.mkv".to_string(), "Show - 1x03".to_string()),
                ("Show.S01E01.mkv".to_string(), "Show - 1x01".to_string()),
                ("Show.S01E02.mkv".to_string(), "Show - 1x02".to_string()),
            ]
        );
        assert_eq!(file_names(&matcher.remaining_values()), vec!["Unrelated.mkv"]);
        assert!(matcher.remaining_candidates().is_empty());
    }

    #[test]
    fn test_duplicate_files_need_lenient_mode() {
        let files = vec![
            MediaFile::new("/b/Show.S01E01.mkv"),
            MediaFile::new("/a/Show.S01E01.mkv"),
        ];
        let episodes = vec![Episode::new("Show", 1, 1)];
        let metrics = episode_sequence(SeasonEpisodeMatcher::default(), DateMatcher::default()).unwrap();

        let strict = Matcher::new(&files, &episodes, true, &metrics);
        assert!(strict.match_all(&CancellationToken::new()).unwrap().is_empty());

        let lenient = Matcher::new(&files, &episodes, false, &metrics);
        let matches = lenient.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value().path, files[1].path);
        assert_eq!(file_names(&lenient.remaining_values()), vec!["Show.S01E01.mkv"]);
    }

    #[test]
    fn test_episode_list_from_json() {
        let episodes: Vec<Episode> = serde_json::from_str(
            r#"[
                {"series_name": "Show", "season": 1, "episode": 1, "airdate": "2010-01-01"},
                {"series_name": "Show", "season": 1, "episode": 2, "airdate": "2010-01-08"}
            ]"#,
        )
        .unwrap();
        let files = vec![MediaFile::new("/tv/Show.2010.01.08.mkv")];
        let metrics = episode_sequence(SeasonEpisodeMatcher::default(), DateMatcher::default()).unwrap();

        let matcher = Matcher::new(&files, &episodes, true, &metrics);
        let matches = matcher.match_all(&CancellationToken::new()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate().episode, Some(2));
    }
}
