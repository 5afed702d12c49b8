//! Titles and descriptions for published items and playlists

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::{
    domain::{CollectionMetadata, Track},
    resolve::text::{collapse_whitespace, strip_markup},
};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
const SOURCE_PREFIX: &str = "Original source: ";

static TRACK_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Track (\d+) of (\d+)\s*$").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n(\s*\n)+").expect("valid regex"));

/// `2007-11-21` -> `11/21/2007`; anything unparseable is kept as written
pub fn display_date(date: &str) -> String {
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|d| d.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// `<name> - by <performer> - (MM/DD/YYYY)`, cleaned for the platform
pub fn video_title(meta: &CollectionMetadata, track: &Track, total: u32) -> String {
    let mut name = sanitize_title(&track.name);
    if name.is_empty() {
        name = crate::resolve::placeholder_name(track.number, total);
    }
    let mut parts = vec![name];
    if let Some(performer) = &meta.performer {
        parts.push(format!("by {performer}"));
    }
    if let Some(date) = &meta.date {
        parts.push(format!("({})", display_date(date)));
    }
    let title = sanitize_title(&parts.join(" - "));
    if title.is_empty() {
        crate::resolve::placeholder_name(track.number, total)
    } else {
        title
    }
}

/// Description of one track video.
///
/// The last two lines tie the item back to its collection and track:
/// `Track N of T` and `Original source: <url>`. They survive truncation.
pub fn track_description(meta: &CollectionMetadata, track: &Track, total: u32) -> String {
    let mut lines = vec![track.name.clone()];
    if let Some(performer) = &meta.performer {
        lines.push(format!("performed by {performer}"));
    }
    if let Some(recorded) = &meta.recording_credit {
        lines.push(format!("Recorded by {recorded}"));
    }
    let place: Vec<&str> = [meta.venue.as_deref(), meta.location.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        lines.push(place.join(", "));
    }
    if let Some(date) = &meta.date {
        lines.push(display_date(date));
    }
    let credits: Vec<String> = [
        meta.taper.as_ref().map(|t| format!("Taped by {t}")),
        meta.transfer_credit.as_ref().map(|t| format!("Transferred by {t}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !credits.is_empty() {
        lines.push(credits.join(", "));
    }
    if let Some(lineage) = &meta.lineage {
        lines.push(format!("Lineage: {lineage}"));
    }

    let footer = format!(
        "Track {} of {total}\n{}",
        track.number,
        source_line(&meta.source_url)
    );
    with_footer(&sanitize_description(&lines.join("\n")), &footer)
}

/// Title of the collection's playlist
pub fn playlist_title(meta: &CollectionMetadata) -> String {
    let mut parts = vec![];
    if let Some(title) = &meta.title {
        parts.push(title.clone());
    }
    if let Some(performer) = &meta.performer {
        if !meta.title.as_deref().is_some_and(|t| t.contains(performer.as_str())) {
            parts.push(format!("by {performer}"));
        }
    }
    if let Some(date) = &meta.date {
        parts.push(format!("({})", display_date(date)));
    }
    if parts.is_empty() {
        parts.push(meta.identifier.clone());
    }
    sanitize_title(&parts.join(" - "))
}

pub fn playlist_description(meta: &CollectionMetadata, tracks: &[Track]) -> String {
    let mut lines = vec![];
    let mut push = |label: &str, value: &Option<String>| {
        if let Some(value) = value {
            lines.push(format!("{label}: {value}"));
        }
    };
    push("Title", &meta.title);
    push("Artist/Band", &meta.performer);
    push("Venue", &meta.venue);
    push("Location", &meta.location);
    push("Date", &meta.date);
    let year = meta
        .year
        .clone()
        .filter(|y| !meta.date.as_deref().is_some_and(|d| d.contains(y.as_str())));
    push("Year", &year);
    push("Taped by", &meta.taper);
    push("Transferred by", &meta.transfer_credit);
    push("Lineage", &meta.lineage);
    push("Collection", &meta.collection);
    if !meta.topics.is_empty() {
        lines.push(format!("Topics: {}", meta.topics.join(", ")));
    }

    if !tracks.is_empty() {
        lines.push(String::new());
        lines.push("Track List:".to_string());
        for track in tracks {
            lines.push(format!("{}. {}", track.number, track.name));
        }
    }
    if let Some(description) = &meta.description {
        lines.push(String::new());
        lines.push("Full Description:".to_string());
        lines.push(description.clone());
    }

    with_footer(
        &sanitize_description(&lines.join("\n")),
        &source_line(&meta.source_url),
    )
}

pub fn source_line(source_url: &str) -> String {
    format!("{SOURCE_PREFIX}{source_url}")
}

/// Whether a description carries exactly this collection's source marker.
///
/// `.../details/romp` must not match an item of `.../details/romp2`.
pub fn mentions_source(description: &str, source_url: &str) -> bool {
    description.match_indices(source_url).any(|(idx, _)| {
        description[idx + source_url.len()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || "/?#)\"'<".contains(c))
    })
}

/// `(track, total)` from a `Track N of T` line
pub fn track_position(description: &str) -> Option<(u32, u32)> {
    let caps = TRACK_POSITION.captures(description)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn sanitize_title(text: &str) -> String {
    let text = strip_markup(text);
    let cleaned: String = text
        .chars()
        .filter_map(|c| match c {
            '<' | '>' | '*' | '?' | '"' => None,
            '|' | ':' => Some('-'),
            '\\' => Some('/'),
            c => Some(c),
        })
        .collect();
    truncate(&collapse_whitespace(&cleaned), MAX_TITLE_CHARS)
}

fn sanitize_description(text: &str) -> String {
    let text = strip_markup(text)
        .lines()
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

fn with_footer(body: &str, footer: &str) -> String {
    let room = MAX_DESCRIPTION_CHARS.saturating_sub(footer.chars().count() + 2);
    let body = truncate(body, room);
    if body.is_empty() {
        footer.to_string()
    } else {
        format!("{body}\n\n{footer}")
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackSource;

    fn meta() -> CollectionMetadata {
        CollectionMetadata {
            title: Some("Romp Live at Fox Hollow".to_string()),
            performer: Some("Romp".to_string()),
            venue: Some("Fox Hollow Restaurant".to_string()),
            location: Some("Ithaca, NY".to_string()),
            date: Some("2007-11-21".to_string()),
            recording_credit: Some("Jim".to_string()),
            taper: Some("Jim".to_string()),
            transfer_credit: Some("Bob".to_string()),
            lineage: Some("Schoeps > DAT > FLAC".to_string()),
            ..CollectionMetadata::new("romp2007-11-21")
        }
    }

    fn track(number: u32, name: &str) -> Track {
        Track {
            number,
            disc: 1,
            name: name.to_string(),
            derived_from: TrackSource::Description,
        }
    }

    #[test]
    fn test_track_description_layout() {
        let description = track_description(&meta(), &track(1, "Bertha"), 12);
        assert_eq!(
            description,
            "Bertha\n\
             performed by Romp\n\
             Recorded by Jim\n\
             Fox Hollow Restaurant, Ithaca, NY\n\
             11/21/2007\n\
             Taped by Jim, Transferred by Bob\n\
             Lineage: Schoeps > DAT > FLAC\n\
             \n\
             Track 1 of 12\n\
             Original source: https://archive.org/details/romp2007-11-21"
        );
        assert_eq!(track_position(&description), Some((1, 12)));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let meta = CollectionMetadata::new("bare");
        let description = track_description(&meta, &track(2, "Loser"), 2);
        assert_eq!(
            description,
            "Loser\n\nTrack 2 of 2\nOriginal source: https://archive.org/details/bare"
        );
        assert!(!description.contains("unknown"));
    }

    #[test]
    fn test_long_description_keeps_marker() {
        let mut meta = meta();
        meta.lineage = Some("x".repeat(6000));
        let description = track_description(&meta, &track(3, "Deal"), 3);
        assert!(description.chars().count() <= MAX_DESCRIPTION_CHARS);
        assert!(description.ends_with("Original source: https://archive.org/details/romp2007-11-21"));
        assert_eq!(track_position(&description), Some((3, 3)));
    }

    #[test]
    fn test_video_title() {
        let title = video_title(&meta(), &track(1, "East Tennessee Blues > 48 Dogs"), 2);
        assert_eq!(title, "East Tennessee Blues 48 Dogs - by Romp - (11/21/2007)");

        let title = video_title(&CollectionMetadata::new("x"), &track(4, "<b></b>"), 12);
        assert_eq!(title, "Track 04");
    }

    #[test]
    fn test_title_is_capped() {
        let title = video_title(&meta(), &track(1, &"a".repeat(150)), 1);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_display_date_fallback() {
        assert_eq!(display_date("1977-05-08"), "05/08/1977");
        assert_eq!(display_date("1977-05-08T00:00:00Z"), "05/08/1977");
        assert_eq!(display_date("Spring 1977"), "Spring 1977");
    }

    #[test]
    fn test_playlist_text() {
        let meta = meta();
        assert_eq!(playlist_title(&meta), "Romp Live at Fox Hollow - (11/21/2007)");

        let description = playlist_description(&meta, &[track(1, "Bertha"), track(2, "Loser")]);
        assert!(description.starts_with("Title: Romp Live at Fox Hollow\nArtist/Band: Romp"));
        assert!(description.contains("Track List:\n1. Bertha\n2. Loser"));
        assert!(mentions_source(&description, &meta.source_url));
    }

    #[test]
    fn test_source_marker_is_exact() {
        let url = "https://archive.org/details/romp";
        assert!(mentions_source("Original source: https://archive.org/details/romp", url));
        assert!(mentions_source("see https://archive.org/details/romp/t01.flac", url));
        assert!(!mentions_source("Original source: https://archive.org/details/romp2", url));
        assert!(!mentions_source("nothing here", url));
    }
}
