//! Collection-level fields pulled out of the raw metadata map

use std::sync::LazyLock;

use regex::Regex;

use super::{record::RawRecord, text::strip_markup};
use crate::domain::CollectionMetadata;

static BAND_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([^\]]+)\]\s*").expect("valid regex"));
static LIVE_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+live\s+at\b").expect("valid regex"));
static BY_BAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bby\s+(.+?)(?:\s+live\b|\s+publication\b|\s*$)").expect("valid regex")
});
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,3}\s*[.)\-]").expect("valid regex"));

const MAX_PERFORMER_LINE: usize = 100;

/// Builds the canonical metadata of one collection.
pub fn collection_metadata(identifier: &str, record: &RawRecord) -> CollectionMetadata {
    let description = record.field("description").map(|d| strip_markup(&d));
    let taper = record.first_field(&["taper", "tapedby", "taped_by"]);

    CollectionMetadata {
        title: record.field("title"),
        performer: performer(record, description.as_deref()),
        venue: record.field("venue").and_then(|v| clean_venue(&v)),
        location: record.first_field(&["coverage", "location"]),
        date: record.field("date"),
        year: record.field("year"),
        recording_credit: record.field("creator").or_else(|| taper.clone()),
        taper,
        transfer_credit: record.first_field(&["transferer", "transferredby", "transferred_by"]),
        lineage: record.field("lineage"),
        topics: topics(record),
        collection: record.field("collection"),
        description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        ..CollectionMetadata::new(identifier)
    }
}

/// Who performed, as opposed to `creator`, which is usually the recordist.
fn performer(record: &RawRecord, description: Option<&str>) -> Option<String> {
    if let Some(band) = record.field("band") {
        return Some(band);
    }

    let first_line = description
        .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
        .filter(|l| l.len() < MAX_PERFORMER_LINE && !LEADING_NUMBER.is_match(l));
    if let Some(line) = first_line {
        return Some(line.to_string());
    }

    let from_venue = record
        .field("venue")
        .and_then(|v| BAND_PREFIX.captures(&v).map(|c| c[1].trim().to_string()));
    if from_venue.is_some() {
        return from_venue;
    }

    if let Some(artist) = record.field("artist") {
        return Some(artist);
    }

    let title = record.field("title")?;
    LIVE_AT
        .captures(&title)
        .or_else(|| BY_BAND.captures(&title))
        .map(|c| c[1].trim().to_string())
        .filter(|p| !p.is_empty())
}

/// `[Romp] Fox Hollow` -> `Fox Hollow`
fn clean_venue(venue: &str) -> Option<String> {
    let cleaned = BAND_PREFIX.replace(venue, "").trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn topics(record: &RawRecord) -> Vec<String> {
    let mut topics: Vec<String> = vec![];
    for raw in record
        .field_list("subject")
        .into_iter()
        .chain(record.field_list("topics"))
    {
        for topic in raw.split([';', ',']).map(str::trim) {
            if !topic.is_empty() && !topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
                topics.push(topic.to_string());
            }
        }
    }
    topics
}
