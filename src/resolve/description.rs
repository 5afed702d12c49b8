//! Track list extraction from the free-text description

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::text::collapse_whitespace;

/// `<num><sep> <name>` with separators `.`, `)` or `-`
static TRACK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,3})\s*[.)\-]\s*(\S.*?)\s*$").expect("valid regex")
});

/// a 2-digit `NN.` / `NN)` marker in the middle of a line
static INLINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(\d{2})[.)]\s").expect("valid regex"));

const MIN_RUN: usize = 2;
const MAX_NAME_LEN: usize = 200;

/// A track line found in the description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedTrack {
    pub number: u32,
    pub name: String,
}

/// Finds numbered track lines in plain text.
///
/// Only runs of at least two adjacent numbered lines count; blank lines do
/// not break a run, any other line does. Inside a run, all-caps lines are
/// dropped when the rest of the run is mixed case, and a number seen
/// before is never captured twice.
pub fn parse_tracks(text: &str) -> Vec<DescribedTrack> {
    let lines = split_inline_lists(text);

    let mut runs: Vec<Vec<DescribedTrack>> = vec![];
    let mut current: Vec<DescribedTrack> = vec![];
    for line in &lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(track) => current.push(track),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let mut tracks: Vec<DescribedTrack> = vec![];
    for run in runs.into_iter().filter(|run| run.len() >= MIN_RUN) {
        let mixed_case_run = run.iter().filter(|t| has_lowercase(&t.name)).count() * 2 > run.len();
        for track in run {
            if mixed_case_run && is_shouting(&track.name) {
                debug!("skipping all-caps line {}. {}", track.number, track.name);
                continue;
            }
            if tracks.iter().any(|t| t.number == track.number) {
                debug!("skipping repeated track number {}", track.number);
                continue;
            }
            tracks.push(track);
        }
    }
    tracks
}

fn parse_line(line: &str) -> Option<DescribedTrack> {
    let caps = TRACK_LINE.captures(line)?;
    let number: u32 = caps[1].parse().ok()?;
    let name = collapse_whitespace(&caps[2]);
    if number == 0 || name.len() > MAX_NAME_LEN || !name.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(DescribedTrack { number, name })
}

/// Breaks `01. a 02. b 03. c` written on one line into separate lines.
/// Lines with fewer than two markers are left alone.
fn split_inline_lists(text: &str) -> Vec<String> {
    let mut out = vec![];
    for line in text.lines() {
        let markers: Vec<usize> = INLINE_MARKER
            .captures_iter(line)
            .filter_map(|caps| caps.get(1).map(|digits| digits.start()))
            .collect();
        if markers.len() < 2 {
            out.push(line.to_string());
            continue;
        }
        let mut start = 0;
        for idx in markers {
            out.push(line[start..idx].to_string());
            start = idx;
        }
        out.push(line[start..].to_string());
    }
    out
}

fn has_lowercase(s: &str) -> bool {
    s.chars().any(char::is_lowercase)
}

fn is_shouting(s: &str) -> bool {
    s.chars().filter(|c| c.is_alphabetic()).count() >= 2 && !has_lowercase(s)
}
