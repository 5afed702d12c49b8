//! Turns a raw archive record into canonical metadata and an ordered track list

pub mod description;
pub mod error;
pub mod fields;
pub mod filename;
pub mod image;
pub mod record;
pub mod text;

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use crate::{
    domain::{AudioAsset, AudioFormat, CollectionMetadata, ImageAsset, Track, TrackSource},
    links,
};
use error::ResolveError;
use record::RawRecord;

/// Everything known about a collection before any file is fetched
#[derive(Debug, Clone)]
pub struct ResolvedCollection {
    pub metadata: CollectionMetadata,
    /// global numbers 1..=len, in order
    pub tracks: Vec<Track>,
    pub assets: Vec<AudioAsset>,
    pub image: Option<ImageAsset>,
}

/// Resolves a collection.
///
/// Description track lines name tracks by their global number. Audio
/// filenames decide the disc layout; when none carry a number the
/// description alone decides the track count. Any track still unnamed
/// gets a name recovered from its file, or a `Track NN` placeholder.
pub fn resolve(
    identifier: &str,
    record: &RawRecord,
    base_url: &str,
) -> Result<ResolvedCollection, ResolveError> {
    let metadata = fields::collection_metadata(identifier, record);
    let described = metadata
        .description
        .as_deref()
        .map(description::parse_tracks)
        .unwrap_or_default();
    debug!("{identifier}: {} track lines in description", described.len());

    let assets = audio_assets(identifier, record, base_url);
    let tracks = build_tracks(&described, &assets);
    if tracks.is_empty() {
        return Err(ResolveError::NoTrackData {
            identifier: identifier.to_string(),
        });
    }

    let image = image::select_background(&record.files).map(|f| ImageAsset {
        filename: f.name.clone(),
        download_url: links::download_url(base_url, identifier, &f.name),
    });

    info!(
        "{identifier}: resolved {} tracks from {} audio files",
        tracks.len(),
        assets.len()
    );
    Ok(ResolvedCollection {
        metadata,
        tracks,
        assets,
        image,
    })
}

fn audio_assets(identifier: &str, record: &RawRecord, base_url: &str) -> Vec<AudioAsset> {
    record
        .files
        .iter()
        .filter_map(|file| {
            let format = AudioFormat::from_filename(&file.name)?;
            let number = filename::extract(&file.name);
            Some(AudioAsset {
                filename: file.name.clone(),
                download_url: links::download_url(base_url, identifier, &file.name),
                format,
                extracted_number: number.map(|n| n.track),
                extracted_disc: number.and_then(|n| n.disc),
            })
        })
        .collect()
}

fn build_tracks(described: &[description::DescribedTrack], assets: &[AudioAsset]) -> Vec<Track> {
    let described_max = described.iter().map(|t| t.number).max().unwrap_or(0);
    let discs = disc_layout(assets, described_max);
    let total: u32 = discs.iter().map(|(_, size)| size).sum();

    let names: HashMap<u32, &str> = described
        .iter()
        .map(|t| (t.number, t.name.as_str()))
        .collect();

    let mut tracks = vec![];
    let mut number = 0;
    for (disc, size) in discs {
        for local in 1..=size {
            number += 1;
            let (name, derived_from) = match names.get(&number) {
                Some(name) => (name.to_string(), TrackSource::Description),
                None => (
                    recovered_name(assets, disc, local)
                        .unwrap_or_else(|| placeholder_name(number, total)),
                    TrackSource::FilenameInference,
                ),
            };
            tracks.push(Track {
                number,
                disc,
                name,
                derived_from,
            });
        }
    }
    tracks
}

/// Ordered `(disc, track count)` pairs.
///
/// A single disc grows to cover the description. On multi-disc releases a
/// description shorter than the whole file set names the first disc only,
/// so the first disc is at least that long even when its last files are
/// missing; a longer description grows the last disc.
fn disc_layout(assets: &[AudioAsset], described_max: u32) -> Vec<(u32, u32)> {
    let mut discs: BTreeMap<u32, u32> = BTreeMap::new();
    for asset in assets {
        if let Some(number) = asset.extracted_number {
            let size = discs.entry(asset.extracted_disc.unwrap_or(1)).or_default();
            *size = (*size).max(number);
        }
    }

    let mut discs: Vec<(u32, u32)> = discs.into_iter().collect();
    let total: u32 = discs.iter().map(|(_, size)| size).sum();
    if discs.len() > 1 && described_max < total {
        if let Some((disc, size)) = discs.first_mut() {
            if described_max > *size {
                debug!("disc {disc} lacks files past {size}, description names {described_max}");
                *size = described_max;
            }
        }
    } else if described_max > total {
        match discs.last_mut() {
            Some((_, size)) => *size += described_max - total,
            None => discs.push((1, described_max)),
        }
    }
    discs
}

fn recovered_name(assets: &[AudioAsset], disc: u32, local: u32) -> Option<String> {
    let mut candidates: Vec<&AudioAsset> = assets
        .iter()
        .filter(|a| a.extracted_disc.unwrap_or(1) == disc && a.extracted_number == Some(local))
        .collect();
    candidates.sort_by_key(|a| a.format);
    candidates
        .into_iter()
        .find_map(|a| filename::recover_name(&a.filename))
}

/// `Track 07`, zero-padded to the width of the collection's largest number
pub fn placeholder_name(number: u32, total: u32) -> String {
    let width = total.to_string().len().max(2);
    format!("Track {number:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(description: &str, files: &[&str]) -> RawRecord {
        let files: Vec<serde_json::Value> = files
            .iter()
            .map(|name| serde_json::json!({"name": name, "source": "original"}))
            .collect();
        serde_json::from_value(serde_json::json!({
            "metadata": {"description": description},
            "files": files,
        }))
        .unwrap()
    }

    fn names(resolved: &ResolvedCollection) -> Vec<&str> {
        resolved.tracks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_two_tracks() -> anyhow::Result<()> {
        let rec = record(
            "01. East Tennessee Blues > 48 Dogs\n02. Deep Elem Blues",
            &["track01.flac", "track02.flac"],
        );
        let resolved = resolve("romp2007-11-21", &rec, "https://archive.org")?;

        assert_eq!(
            names(&resolved),
            vec!["East Tennessee Blues > 48 Dogs", "Deep Elem Blues"]
        );
        assert!(
            resolved
                .tracks
                .iter()
                .all(|t| t.derived_from == TrackSource::Description && t.disc == 1)
        );
        assert_eq!(
            resolved.assets[0].download_url,
            "https://archive.org/download/romp2007-11-21/track01.flac"
        );
        Ok(())
    }

    #[test]
    fn test_multi_disc_continues_numbering() -> anyhow::Result<()> {
        let description = (1..=8)
            .map(|n| format!("{n:02}. Song {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut files: Vec<String> = (1..=8).map(|n| format!("gd77d1t{n:02}.flac")).collect();
        files.extend((1..=10).map(|n| format!("gd77d2t{n:02}.flac")));
        let files: Vec<&str> = files.iter().map(String::as_str).collect();

        let resolved = resolve("gd77", &record(&description, &files), "https://archive.org")?;

        assert_eq!(resolved.tracks.len(), 18);
        let numbers: Vec<u32> = resolved.tracks.iter().map(|t| t.number).collect();
        assert_eq!(numbers, (1..=18).collect::<Vec<_>>());
        assert_eq!(resolved.tracks[7].name, "Song 8");
        assert_eq!(resolved.tracks[7].disc, 1);
        for (i, track) in resolved.tracks[8..].iter().enumerate() {
            assert_eq!(track.name, format!("Track {:02}", i + 9));
            assert_eq!(track.disc, 2);
            assert_eq!(track.derived_from, TrackSource::FilenameInference);
        }
        Ok(())
    }

    #[test]
    fn test_missing_last_file_of_first_disc() -> anyhow::Result<()> {
        let description = (1..=8)
            .map(|n| format!("{n:02}. Song {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut files: Vec<String> = (1..=7).map(|n| format!("gd77d1t{n:02}.flac")).collect();
        files.extend((1..=10).map(|n| format!("gd77d2t{n:02}.flac")));
        let files: Vec<&str> = files.iter().map(String::as_str).collect();

        let resolved = resolve("gd77", &record(&description, &files), "https://archive.org")?;

        assert_eq!(resolved.tracks.len(), 18);
        assert_eq!(resolved.tracks[7].name, "Song 8");
        assert_eq!(resolved.tracks[7].disc, 1);
        assert_eq!(resolved.tracks[8].disc, 2);

        let matched = crate::matcher::match_tracks(&resolved.tracks, &resolved.assets);
        let unmatched: Vec<u32> = matched.unmatched.iter().map(|t| t.number).collect();
        assert_eq!(unmatched, vec![8]);
        let nine = matched
            .bindings
            .iter()
            .find(|b| b.track.number == 9)
            .map(|b| b.asset.filename.as_str());
        assert_eq!(nine, Some("gd77d2t01.flac"));
        Ok(())
    }

    #[test]
    fn test_no_track_data_is_an_error() {
        let rec = record("A fine evening of music.", &["show.flac", "info.txt"]);
        let err = resolve("x", &rec, "https://archive.org").unwrap_err();
        assert!(matches!(err, ResolveError::NoTrackData { identifier } if identifier == "x"));
    }

    #[test]
    fn test_description_without_numbered_files() -> anyhow::Result<()> {
        let rec = record("1. Bertha\n3. Deal", &["show.flac"]);
        let resolved = resolve("x", &rec, "https://archive.org")?;
        // the gap at 2 is kept so numbering stays contiguous
        assert_eq!(names(&resolved), vec!["Bertha", "Track 02", "Deal"]);
        Ok(())
    }

    #[test]
    fn test_names_recovered_from_files() -> anyhow::Result<()> {
        let rec = record(
            "",
            &["01 - Jack Straw.mp3", "01 - Jack Straw.flac", "02.flac"],
        );
        let resolved = resolve("x", &rec, "https://archive.org")?;
        assert_eq!(names(&resolved), vec!["Jack Straw", "Track 02"]);
        assert_eq!(resolved.assets.len(), 3);
        Ok(())
    }

    #[test]
    fn test_files_extend_past_description() -> anyhow::Result<()> {
        let rec = record(
            "01. Bertha\n02. Loser",
            &["t01.flac", "t02.flac", "t03.flac"],
        );
        let resolved = resolve("x", &rec, "https://archive.org")?;
        assert_eq!(names(&resolved), vec!["Bertha", "Loser", "Track 03"]);
        Ok(())
    }

    #[test]
    fn test_placeholder_width_follows_total() {
        assert_eq!(placeholder_name(7, 18), "Track 07");
        assert_eq!(placeholder_name(7, 120), "Track 007");
    }
}
