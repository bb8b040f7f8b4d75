//! Matching engine services

pub mod collation;
pub mod common_sequence;
pub mod date_matcher;
pub mod episode_metrics;
pub mod logging;
pub mod matcher;
pub mod media;
pub mod metrics;
mod recognizer;
pub mod scanner;
pub mod season_episode;
pub mod sequences;
pub mod series_name;
pub mod text_utils;

pub use collation::{CollationKey, CollationStrength, Collator};
pub use common_sequence::CommonSequenceMatcher;
pub use date_matcher::{DateFilter, DateMatcher, SimpleDate};
pub use episode_metrics::Metric;
pub use logging::{LogFormat, LogSettings, init_tracing};
pub use matcher::{Match, Matcher};
pub use media::{Episode, Matchable, MediaFile, Movie, PropertyMap, PropertyValue};
pub use metrics::{Average, BoxedMetric, Cascade, CrossProperty, Floor, FnMetric, PropertySimilarity, SimilarityMetric};
pub use scanner::collect_media_files;
pub use season_episode::{SanityFilter, SeasonEpisodeMatcher, SxE};
pub use sequences::{episode_sequence, movie_sequence, verification_sequence};
pub use series_name::SeriesNameMatcher;
