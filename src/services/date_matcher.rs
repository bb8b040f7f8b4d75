//! Air date recognition
//!
//! Daily shows are numbered by date rather than season/episode:
//! - "Show.2010.01.02.mkv"          → 2010-01-02
//! - "Show 02-01-2010"              → 2010-01-02
//! - "Show - 2 January 2011"        → 2011-01-02
//! - "Show - March 5th, 2012"       → 2012-03-05

use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::recognizer::{Leading, Recognizer, align, group_number};
use crate::error::MatchError;

// =========================================================================
// SimpleDate
// =========================================================================

/// A calendar date without time or zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SimpleDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl SimpleDate {
    /// Returns `None` for dates that do not exist (2010-02-30).
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from)
    }

    /// Parse `YYYY-MM-DD`
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok().map(Self::from)
    }

    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Milliseconds since the epoch at midnight UTC
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.to_naive()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }
}

impl From<NaiveDate> for SimpleDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for SimpleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for SimpleDate {
    type Error = MatchError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text).ok_or_else(|| MatchError::invalid(format!("not a date: {text}")))
    }
}

impl From<SimpleDate> for String {
    fn from(date: SimpleDate) -> Self {
        date.to_string()
    }
}

// =========================================================================
// DateFilter
// =========================================================================

/// Inclusive window of plausible years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    pub min_year: i32,
    pub max_year: i32,
}

impl DateFilter {
    pub fn new(min_year: i32, max_year: i32) -> crate::error::Result<Self> {
        if min_year > max_year {
            return Err(MatchError::invalid(format!(
                "date year window is inverted ({min_year} > {max_year})"
            )));
        }
        Ok(Self { min_year, max_year })
    }

    pub fn accept(&self, date: &SimpleDate) -> bool {
        (self.min_year..=self.max_year).contains(&date.year)
    }
}

impl Default for DateFilter {
    fn default() -> Self {
        Self {
            min_year: 1930,
            max_year: Utc::now().year() + 1,
        }
    }
}

// =========================================================================
// Patterns
// =========================================================================

const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

/// 2010-01-02, 2010.01.02, 2010 01 02
static YMD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[\-./_ ](\d{1,2})[\-./_ ](\d{1,2})(?:\D|$)").expect("valid regex")
});

/// 02-01-2010, 02.01.2010
static DMY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[\-./_ ](\d{1,2})[\-./_ ](\d{4})(?:\D|$)").expect("valid regex")
});

/// 2 January 2011, 2nd Jan. 2011
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(\d{{1,2}})(?:st|nd|rd|th)?[^\p{{L}}\p{{N}}]{{0,2}}({MONTHS})\p{{L}}*\.?[^\p{{L}}\p{{N}}]{{0,2}}(\d{{4}})(?:\D|$)"
    ))
    .expect("valid regex")
});

/// March 5th, 2012
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)({MONTHS})\p{{L}}*\.?[^\p{{L}}\p{{N}}]{{0,2}}(\d{{1,2}})(?:st|nd|rd|th)?,?[^\p{{L}}\p{{N}}]{{0,2}}(\d{{4}})(?:\D|$)"
    ))
    .expect("valid regex")
});

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    MONTHS
        .split('|')
        .position(|m| m == prefix)
        .map(|i| i as u32 + 1)
}

fn build_ymd(caps: &Captures<'_>) -> Option<SimpleDate> {
    SimpleDate::new(
        group_number(caps, 1)?,
        group_number(caps, 2)? as u32,
        group_number(caps, 3)? as u32,
    )
}

/// Day first, falling back to month first when that is not a valid date
fn build_dmy(caps: &Captures<'_>) -> Option<SimpleDate> {
    let first = group_number(caps, 1)? as u32;
    let second = group_number(caps, 2)? as u32;
    let year = group_number(caps, 3)?;
    SimpleDate::new(year, second, first).or_else(|| SimpleDate::new(year, first, second))
}

fn build_day_month_year(caps: &Captures<'_>) -> Option<SimpleDate> {
    let month = month_number(caps.get(2)?.as_str())?;
    SimpleDate::new(group_number(caps, 3)?, month, group_number(caps, 1)? as u32)
}

fn build_month_day_year(caps: &Captures<'_>) -> Option<SimpleDate> {
    let month = month_number(caps.get(1)?.as_str())?;
    SimpleDate::new(group_number(caps, 3)?, month, group_number(caps, 2)? as u32)
}

struct DatePattern {
    recognizer: Recognizer,
    build: fn(&Captures<'_>) -> Option<SimpleDate>,
}

static PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern {
            recognizer: Recognizer::new(&YMD, Leading::NotDigit),
            build: build_ymd,
        },
        DatePattern {
            recognizer: Recognizer::new(&DMY, Leading::NotDigit),
            build: build_dmy,
        },
        DatePattern {
            recognizer: Recognizer::new(&DAY_MONTH_YEAR, Leading::NotAlnum),
            build: build_day_month_year,
        },
        DatePattern {
            recognizer: Recognizer::new(&MONTH_DAY_YEAR, Leading::NotAlnum),
            build: build_month_day_year,
        },
    ]
});

// =========================================================================
// Matcher
// =========================================================================

/// Finds the first plausible date in a text
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMatcher {
    filter: DateFilter,
}

impl DateMatcher {
    pub fn new(filter: DateFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &DateFilter {
        &self.filter
    }

    pub fn match_date(&self, text: &str) -> Option<SimpleDate> {
        self.first(text, 0).map(|(_, date)| date)
    }

    /// Byte index where the first plausible date starts, searching from `from`
    pub fn find(&self, text: &str, from: usize) -> Option<usize> {
        self.first(text, align(text, from)).map(|(start, _)| start)
    }

    fn first(&self, text: &str, from: usize) -> Option<(usize, SimpleDate)> {
        for pattern in PATTERNS.iter() {
            for caps in pattern.recognizer.captures_from(text, from) {
                let Some(date) = (pattern.build)(&caps) else {
                    continue;
                };
                if self.filter.accept(&date) {
                    let start = caps.get(0).map(|m| m.start()).unwrap_or(from);
                    trace!(text, %date, start, "Matched date");
                    return Some((start, date));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> Option<SimpleDate> {
        SimpleDate::new(year, month, day)
    }

    #[test]
    fn test_simple_date() {
        assert_eq!(date(2010, 2, 30), None);
        let d = date(2010, 1, 2).unwrap();
        assert_eq!(d.to_string(), "2010-01-02");
        assert_eq!(SimpleDate::parse("2010-01-02"), Some(d));
        assert!(date(2010, 1, 2) < date(2010, 1, 3));
        assert_eq!(d.timestamp_millis(), Some(1_262_390_400_000));
    }

    #[test]
    fn test_simple_date_serde() {
        let d = date(2011, 11, 5).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2011-11-05\"");
        let parsed: SimpleDate = serde_json::from_str("\"2011-11-05\"").unwrap();
        assert_eq!(parsed, d);
        assert!(serde_json::from_str::<SimpleDate>("\"yesterday\"").is_err());
    }

    #[test]
    fn test_numeric_dates() {
        let matcher = DateMatcher::default();
        assert_eq!(matcher.match_date("Show.2010.01.02.mkv"), date(2010, 1, 2));
        assert_eq!(matcher.match_date("The Daily Show 02-01-2010"), date(2010, 1, 2));
        assert_eq!(matcher.match_date("Show 12.25.2010"), date(2010, 12, 25));
        assert_eq!(matcher.match_date("Show 2010-02-30"), None);
    }

    #[test]
    fn test_month_name_dates() {
        let matcher = DateMatcher::default();
        assert_eq!(matcher.match_date("Show - 2 January 2011"), date(2011, 1, 2));
        assert_eq!(matcher.match_date("Show - March 5th, 2012"), date(2012, 3, 5));
        assert_eq!(matcher.match_date("Show - 21st Sep. 2009"), date(2009, 9, 21));
    }

    #[test]
    fn test_year_window() {
        let matcher = DateMatcher::default();
        assert_eq!(matcher.match_date("Show 1850-01-01"), None);

        let wide = DateMatcher::new(DateFilter::new(1800, 1900).unwrap());
        assert_eq!(wide.match_date("Show 1850-01-01"), date(1850, 1, 1));
        assert!(DateFilter::new(2000, 1990).is_err());
    }

    #[test]
    fn test_find() {
        let matcher = DateMatcher::default();
        assert_eq!(matcher.find("Show.2010.01.02.mkv", 0), Some(5));
        assert_eq!(matcher.find("Show.2010.01.02.mkv", 6), None);
        assert_eq!(matcher.find("No date here", 0), None);
    }
}
