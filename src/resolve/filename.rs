//! Track numbers recovered from audio filenames.
//!
//! Patterns are tried from most to least specific:
//! `d<disc>t<track>`, `t<track>` / `track<track>`, a trailing `-<track>`,
//! then the first standalone 2-digit group. Calendar dates and 4-digit
//! year groups are never read as track numbers.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use super::text::collapse_whitespace;

static DISC_TRACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:disc|cd|d)[\s_\-]*(\d{1,2})[\s_\-]*(?:track|t)[\s_\-]*(\d{1,3})")
        .expect("valid regex")
});
static TRACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:track|t)[\s_\-]*(\d{1,3})").expect("valid regex"));
static TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\-_ ](\d{1,3})$").expect("valid regex"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[\-_./]\d{1,2}[\-_./]\d{1,2}|\d{1,2}[\-_./]\d{1,2}[\-_./]\d{2,4}")
        .expect("valid regex")
});
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static LEADING_NUMBER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:track|t)?[\s_\-]*\d{1,3}[\s_.\-]+(.+)$").expect("valid regex")
});

/// Disc and track read from a filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNumber {
    pub disc: Option<u32>,
    pub track: u32,
}

/// Extracts the track number (and disc, when encoded) from a filename.
///
/// Only the final path component is inspected, without its extension.
pub fn extract(filename: &str) -> Option<FileNumber> {
    let stem = stem(filename);

    if let Some((disc, track)) = find_disc_track(&stem) {
        return Some(FileNumber {
            disc: Some(disc),
            track,
        });
    }

    let track = find_track_marker(&stem)
        .or_else(|| find_trailing(&stem))
        .or_else(|| find_standalone_pair(&stem))?;
    Some(FileNumber { disc: None, track })
}

/// Recovers a human title from names like `03 - Sugaree.flac`.
pub fn recover_name(filename: &str) -> Option<String> {
    let stem = stem(filename);
    let caps = LEADING_NUMBER_NAME.captures(&stem)?;
    let name = collapse_whitespace(&caps[1].replace('_', " "));
    name.chars().any(char::is_alphabetic).then_some(name)
}

fn stem(filename: &str) -> String {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
        .to_string()
}

fn find_disc_track(stem: &str) -> Option<(u32, u32)> {
    DISC_TRACK.captures_iter(stem).find_map(|caps| {
        let whole = caps.get(0)?;
        let track = caps.get(2)?;
        if !starts_word(stem, whole.start()) || followed_by_digit(stem, track.end()) {
            return None;
        }
        let disc = caps[1].parse().ok()?;
        let track = track.as_str().parse().ok()?;
        (disc > 0 && track > 0).then_some((disc, track))
    })
}

fn find_track_marker(stem: &str) -> Option<u32> {
    TRACK.captures_iter(stem).find_map(|caps| {
        let whole = caps.get(0)?;
        let digits = caps.get(1)?;
        if !starts_word(stem, whole.start()) || followed_by_digit(stem, digits.end()) {
            return None;
        }
        digits.as_str().parse().ok().filter(|n| *n > 0)
    })
}

fn find_trailing(stem: &str) -> Option<u32> {
    let caps = TRAILING.captures(stem)?;
    let digits = caps.get(1)?;
    if ends_with_date(&stem[..digits.end()]) {
        return None;
    }
    digits.as_str().parse().ok().filter(|n| *n > 0)
}

fn find_standalone_pair(stem: &str) -> Option<u32> {
    let without_dates = DATE.replace_all(stem, " ");
    DIGITS
        .find_iter(&without_dates)
        .find(|m| m.as_str().len() == 2)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// a letter right before `idx` means the match sits inside a word
fn starts_word(s: &str, idx: usize) -> bool {
    s[..idx]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphabetic())
}

fn followed_by_digit(s: &str, idx: usize) -> bool {
    s[idx..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn ends_with_date(s: &str) -> bool {
    DATE.find_iter(s).any(|m| m.end() == s.len())
}
