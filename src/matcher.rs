//! Binds each track to exactly one audio file

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    domain::{AudioAsset, Track, TrackBinding},
    resolve::filename,
};

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub bindings: Vec<TrackBinding>,
    /// tracks with no disc-consistent, verified file
    pub unmatched: Vec<Track>,
}

/// Matches tracks to assets by their `(disc, local number)` pair.
///
/// Candidates are tried best format first. A candidate is accepted only if
/// the number read again from its filename equals the track's local
/// number; an asset never serves two tracks.
pub fn match_tracks(tracks: &[Track], assets: &[AudioAsset]) -> MatchOutcome {
    let offsets = disc_offsets(tracks);
    let mut pool: Vec<&AudioAsset> = assets.iter().collect();
    let mut outcome = MatchOutcome::default();

    for track in tracks {
        let offset = offsets.get(&track.disc).copied().unwrap_or(0);
        let local = track.number - offset;

        let mut candidates: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                a.extracted_disc.unwrap_or(1) == track.disc && a.extracted_number == Some(local)
            })
            .map(|(i, _)| i)
            .collect();
        candidates.sort_by(|&a, &b| {
            pool[a]
                .format
                .cmp(&pool[b].format)
                .then_with(|| pool[a].filename.cmp(&pool[b].filename))
        });

        let verified = candidates
            .into_iter()
            .find(|&i| verify(pool[i], track.disc, local));
        match verified {
            Some(i) => {
                let asset = pool.remove(i);
                debug!("track {} -> {}", track.number, asset.filename);
                outcome.bindings.push(TrackBinding {
                    track: track.clone(),
                    asset: asset.clone(),
                });
            }
            None => {
                warn!(
                    "track {} ({}) has no matching audio file",
                    track.number, track.name
                );
                outcome.unmatched.push(track.clone());
            }
        }
    }
    outcome
}

/// global number of the last track before each disc
fn disc_offsets(tracks: &[Track]) -> HashMap<u32, u32> {
    let mut offsets = HashMap::new();
    for track in tracks {
        offsets
            .entry(track.disc)
            .or_insert(track.number.saturating_sub(1));
    }
    offsets
}

/// Re-reads the number from the filename, ignoring the cached extraction.
fn verify(asset: &AudioAsset, disc: u32, local: u32) -> bool {
    let ok = filename::extract(&asset.filename)
        .is_some_and(|n| n.track == local && n.disc.unwrap_or(1) == disc);
    if !ok {
        warn!(
            "{} was listed as disc {disc} track {local} but its name disagrees",
            asset.filename
        );
    }
    ok
}
