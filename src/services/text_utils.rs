//! Shared text normalization utilities
//!
//! Pure functions used by the pattern engines, the metrics and the common
//! sequence matcher. Nothing in here keeps state.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"['`´‘’ʻ]+").expect("valid regex"));

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{P}\p{S}\s]+").expect("valid regex"));

static SPACE_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_.]+").expect("valid regex"));

static BRACKETS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^()]*\)|\[[^\[\]]*\]|\{[^{}]*\}").expect("valid regex")
});

/// 8 hex digits in round or square brackets, e.g. `[1A2B3C4D]`
static CHECKSUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]([[:xdigit:]]{8})[\]\)]").expect("valid regex"));

/// Remove apostrophes and collapse punctuation and whitespace runs into a
/// single space.
///
/// # Example
/// ```
/// use media_matcher::services::text_utils::normalize_punctuation;
/// assert_eq!(normalize_punctuation("Grey's.Anatomy - 1x01"), "Greys Anatomy 1x01");
/// ```
pub fn normalize_punctuation(name: &str) -> String {
    let name = APOSTROPHE.replace_all(name, "");
    PUNCTUATION.replace_all(&name, " ").trim().to_string()
}

/// Replace bracketed groups `(..)`, `[..]` and `{..}` by a space.
pub fn normalize_brackets(name: &str) -> String {
    BRACKETS.replace_all(name, " ").to_string()
}

/// Replace dots, underscores and whitespace runs by `replacement`.
pub fn normalize_space(name: &str, replacement: &str) -> String {
    SPACE_LIKE.replace_all(name, replacement).trim().to_string()
}

/// Strip CRC32 tags such as `[ABCD1234]`.
pub fn remove_embedded_checksum(name: &str) -> String {
    CHECKSUM.replace_all(name, "").to_string()
}

/// Return the last embedded CRC32 tag, upper-cased.
pub fn get_embedded_checksum(name: &str) -> Option<String> {
    CHECKSUM
        .captures_iter(name)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

pub fn lower_trim(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fold text into a common alphabet.
///
/// Compatibility forms are decomposed and combining marks dropped first
/// (`é` → `e`, full-width → ASCII), then remaining non-Latin script is
/// transliterated.
pub fn transliterate(text: &str) -> String {
    let folded: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    if folded.is_ascii() {
        folded
    } else {
        deunicode(&folded)
    }
}

/// Video file extensions (lowercase, without the dot)
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "ts", "m2ts",
];

/// Subtitle and sidecar extensions that travel with a video
pub const SIDECAR_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "idx", "vtt", "nfo"];

/// Check if a file name has a video extension
///
/// # Example
/// ```
/// use media_matcher::services::text_utils::is_video_file;
/// assert!(is_video_file("/tv/Show/Show.S01E01.MKV"));
/// assert!(!is_video_file("Show.S01E01.srt"));
/// ```
pub fn is_video_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(pos) if pos > 0 => Some(&name[pos + 1..]),
        _ => None,
    }
}

/// Remove a known media extension (`.mkv`, `.srt`, `.mp4`).
///
/// Unknown suffixes are kept, so `Breaking.Bad` and `Show.101` are left alone.
pub fn strip_extension(name: &str) -> &str {
    match extension(name) {
        Some(ext) => {
            let ext_lower = ext.to_lowercase();
            let known = VIDEO_EXTENSIONS.contains(&ext_lower.as_str())
                || SIDECAR_EXTENSIONS.contains(&ext_lower.as_str());
            if known { &name[..name.len() - ext.len() - 1] } else { name }
        }
        None => name,
    }
}

/// Canonical form used by name based metrics.
///
/// Extension, checksum and bracketed groups removed, punctuation
/// normalized, lower-cased.
pub fn normalize_name(name: &str) -> String {
    let name = strip_extension(name);
    let name = remove_embedded_checksum(name);
    let name = normalize_brackets(&name);
    normalize_punctuation(&name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_punctuation("Breaking.Bad"), "Breaking Bad");
        assert_eq!(normalize_punctuation("Grey's Anatomy"), "Greys Anatomy");
        assert_eq!(normalize_punctuation("  Spider-Man: No Way Home  "), "Spider Man No Way Home");
        assert_eq!(normalize_punctuation("Game_of_Thrones"), "Game of Thrones");
    }

    #[test]
    fn test_normalize_brackets() {
        assert_eq!(
            normalize_punctuation(&normalize_brackets("[Group] Show (2010) {x264}")),
            "Show"
        );
    }

    #[test]
    fn test_checksum() {
        let name = "[SubGroup] Show - 01 [1A2B3C4D].mkv";
        assert_eq!(get_embedded_checksum(name).as_deref(), Some("1A2B3C4D"));
        assert_eq!(remove_embedded_checksum(name), "[SubGroup] Show - 01 .mkv");
        assert_eq!(get_embedded_checksum("Show - 01.mkv"), None);
    }

    #[test]
    fn test_normalize_space() {
        assert_eq!(normalize_space("The.Daily_Show  2026", " "), "The Daily Show 2026");
    }

    #[test]
    fn test_transliterate() {
        assert_eq!(transliterate("Amélie"), "Amelie");
        assert_eq!(transliterate("ＦＵＬＬ"), "FULL");
        assert_eq!(transliterate("Pokémon"), "Pokemon");
        assert!(transliterate("東京").is_ascii());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("Show.Name.S01E02.mkv"), "Show.Name.S01E02");
        assert_eq!(strip_extension("Show.Name.S01E02"), "Show.Name.S01E02");
        assert_eq!(strip_extension("Show.Name.101"), "Show.Name.101");
        assert_eq!(strip_extension("episode.mp4"), "episode");
        assert_eq!(strip_extension("Breaking.Bad"), "Breaking.Bad");
        assert_eq!(strip_extension("Show.S01E01.EN.SRT"), "Show.S01E01.EN");
        assert_eq!(strip_extension(".mkv"), ".mkv");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            normalize_name("[Group] The.Show.S01E02 [ABCDEF12].mkv"),
            "the show s01e02"
        );
        assert_eq!(normalize_name("Breaking.Bad"), "breaking bad");
    }
}
