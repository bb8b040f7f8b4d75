//! Media model seen by the metrics
//!
//! Values (files, plain names) and candidates (episodes, movies, dates) are
//! opaque to the matcher. Metrics read them only through [`Matchable`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use super::date_matcher::SimpleDate;
use super::season_episode::SxE;

// =========================================================================
// Properties
// =========================================================================

/// A single named property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Date(SimpleDate),
    /// The property exists but could not be derived
    Unavailable(String),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "text",
            PropertyValue::Number(_) => "number",
            PropertyValue::Date(_) => "date",
            PropertyValue::Unavailable(_) => "unavailable",
        }
    }
}

/// Ordered key to value association with lower-cased keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: PropertyValue) {
        self.0.insert(key.to_lowercase(), value);
    }

    pub fn text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, PropertyValue::Text(value.into()));
        self
    }

    /// Add a numeric property when present
    pub fn number(mut self, key: &str, value: Option<f64>) -> Self {
        if let Some(value) = value {
            self.insert(key, PropertyValue::Number(value));
        }
        self
    }

    pub fn date(mut self, key: &str, value: Option<SimpleDate>) -> Self {
        if let Some(value) = value {
            self.insert(key, PropertyValue::Date(value));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(&key.to_lowercase())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =========================================================================
// Matchable
// =========================================================================

/// Accessors the metrics use to read a value or candidate.
///
/// Everything except [`Matchable::name`] is optional; a metric that finds
/// nothing to compare reports "no evidence" rather than failing.
pub trait Matchable {
    /// Primary display name
    fn name(&self) -> Cow<'_, str>;

    /// All names this item is known under (series aliases etc.)
    fn names(&self) -> Vec<Cow<'_, str>> {
        vec![self.name()]
    }

    /// Text that numbering and dates are parsed from when the item carries
    /// no structured numbers. Also the memoization key for those parses.
    fn identifier(&self) -> Cow<'_, str> {
        self.name()
    }

    /// Structured season/episode numbers; `None` means "parse the identifier"
    fn season_episode(&self) -> Option<Vec<SxE>> {
        None
    }

    /// Structured air date; `None` means "parse the identifier"
    fn air_date(&self) -> Option<SimpleDate> {
        None
    }

    fn file_size(&self) -> Option<u64> {
        None
    }

    /// Milliseconds since the epoch
    fn timestamp(&self) -> Option<i64> {
        None
    }

    /// Name of the containing folder, consulted for a season number when
    /// the identifier names none
    fn folder(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// Rating out of 10 and vote count
    fn rating(&self) -> Option<(f32, u32)> {
        None
    }

    fn properties(&self) -> PropertyMap {
        PropertyMap::new().text("name", self.name())
    }
}

impl Matchable for str {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Matchable for String {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl Matchable for SimpleDate {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn air_date(&self) -> Option<SimpleDate> {
        Some(*self)
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp_millis()
    }

    fn properties(&self) -> PropertyMap {
        PropertyMap::new().date("date", Some(*self))
    }
}

// =========================================================================
// MediaFile
// =========================================================================

/// A file on disk together with the cheap facts known about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size: Option<u64>,
    /// Last modification time in milliseconds since the epoch
    pub timestamp: Option<i64>,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
            timestamp: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Read size and modification time from the file system
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let timestamp = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_millis()).ok());

        Ok(Self {
            path: path.to_path_buf(),
            size: Some(metadata.len()),
            timestamp,
        })
    }

    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy())
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

impl fmt::Display for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl Matchable for MediaFile {
    fn name(&self) -> Cow<'_, str> {
        self.file_name()
    }

    fn identifier(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }

    fn file_size(&self) -> Option<u64> {
        self.size
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    fn folder(&self) -> Option<Cow<'_, str>> {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy())
    }

    fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new()
            .text("name", self.file_name())
            .number("size", self.size.map(|s| s as f64));
        if let Some(ext) = self.extension() {
            props.insert("extension", PropertyValue::Text(ext));
        }
        props
    }
}

// =========================================================================
// Episode
// =========================================================================

/// Episode metadata as supplied by a metadata provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
    pub series_name: String,
    pub aliases: Vec<String>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub absolute: Option<i32>,
    pub special: Option<i32>,
    pub title: Option<String>,
    pub airdate: Option<SimpleDate>,
}

impl Episode {
    pub fn new(series_name: impl Into<String>, season: i32, episode: i32) -> Self {
        Self {
            series_name: series_name.into(),
            season: Some(season),
            episode: Some(episode),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_absolute(mut self, absolute: i32) -> Self {
        self.absolute = Some(absolute);
        self
    }

    pub fn with_airdate(mut self, airdate: SimpleDate) -> Self {
        self.airdate = Some(airdate);
        self
    }

    /// Numbering tokens: regular, absolute and special (season 0)
    pub fn numbers(&self) -> Vec<SxE> {
        let mut numbers = Vec::with_capacity(2);
        if let (Some(season), Some(episode)) = (self.season, self.episode) {
            numbers.push(SxE::new(Some(season), Some(episode)));
        }
        if let Some(absolute) = self.absolute {
            numbers.push(SxE::absolute(absolute));
        }
        if let Some(special) = self.special {
            numbers.push(SxE::new(Some(0), Some(special)));
        }
        numbers
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.series_name)?;
        match (self.season, self.episode, self.special, self.absolute) {
            (Some(season), Some(episode), _, _) => write!(f, " - {}", SxE::new(Some(season), Some(episode)))?,
            (_, _, Some(special), _) => write!(f, " - Special {special}")?,
            (_, _, _, Some(absolute)) => write!(f, " - {}", SxE::absolute(absolute))?,
            _ => {}
        }
        if let Some(title) = &self.title {
            write!(f, " - {title}")?;
        }
        Ok(())
    }
}

impl Matchable for Episode {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.series_name)
    }

    fn names(&self) -> Vec<Cow<'_, str>> {
        std::iter::once(&self.series_name)
            .chain(&self.aliases)
            .map(|n| Cow::Borrowed(n.as_str()))
            .collect()
    }

    fn identifier(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn season_episode(&self) -> Option<Vec<SxE>> {
        Some(self.numbers())
    }

    fn air_date(&self) -> Option<SimpleDate> {
        self.airdate
    }

    fn timestamp(&self) -> Option<i64> {
        self.airdate.and_then(|d| d.timestamp_millis())
    }

    fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new()
            .text("name", self.series_name.as_str())
            .number("season", self.season.map(f64::from))
            .number("episode", self.episode.map(f64::from))
            .number("absolute", self.absolute.map(f64::from))
            .date("airdate", self.airdate);
        if let Some(title) = &self.title {
            props.insert("title", PropertyValue::Text(title.clone()));
        }
        props
    }
}

// =========================================================================
// Movie
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub name: String,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub votes: Option<u32>,
}

impl Movie {
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            name: name.into(),
            year: Some(year),
            ..Default::default()
        }
    }

    pub fn with_rating(mut self, rating: f32, votes: u32) -> Self {
        self.rating = Some(rating);
        self.votes = Some(votes);
        self
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({year})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Matchable for Movie {
    fn name(&self) -> Cow<'_, str> {
        match self.year {
            Some(year) => Cow::Owned(format!("{} {year}", self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    fn rating(&self) -> Option<(f32, u32)> {
        Some((self.rating?, self.votes.unwrap_or(0)))
    }

    fn properties(&self) -> PropertyMap {
        PropertyMap::new()
            .text("name", self.name.as_str())
            .number("year", self.year.map(f64::from))
    }
}
