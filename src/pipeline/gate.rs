//! Decides whether a stage still has work to do

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use log::{debug, warn};

use crate::{
    domain::{RemoteItem, TrackBinding},
    format,
    pipeline::Stage,
    storage::{Artifact, ArtifactNamer, fs},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// output already exists and is valid
    Skip,
    Run,
    /// a zero-length leftover must be deleted first
    RunStale,
}

/// Items already published for one collection, keyed by track number
#[derive(Debug, Default, Clone)]
pub struct RemoteIndex {
    items: BTreeMap<u32, RemoteItem>,
}

impl RemoteIndex {
    /// Indexes the items that carry `source_url` as their marker.
    ///
    /// A `Track N of T` line decides the track; items without one are
    /// matched by their exact expected title, when only one track has it.
    pub fn build(
        items: Vec<RemoteItem>,
        source_url: &str,
        expected_titles: &HashMap<u32, String>,
    ) -> Self {
        let mut index = BTreeMap::new();
        for item in items {
            if !format::mentions_source(&item.description, source_url) {
                continue;
            }
            let track = format::track_position(&item.description)
                .map(|(track, _)| track)
                .or_else(|| track_by_title(expected_titles, &item.title));
            match track {
                Some(track) if index.contains_key(&track) => {
                    warn!("track {track} is published more than once, keeping the first");
                }
                Some(track) => {
                    index.insert(track, item);
                }
                None => debug!("published item {} does not map to a track", item.id),
            }
        }
        Self { items: index }
    }

    pub fn get(&self, track: u32) -> Option<&RemoteItem> {
        self.items.get(&track)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn track_by_title(expected_titles: &HashMap<u32, String>, title: &str) -> Option<u32> {
    let mut tracks = expected_titles
        .iter()
        .filter(|(_, expected)| *expected == title)
        .map(|(track, _)| *track);
    let first = tracks.next()?;
    if tracks.next().is_some() {
        debug!("title \"{title}\" fits several tracks, not guessing");
        return None;
    }
    Some(first)
}

/// Probes local artifacts and the remote index, never a saved state file.
pub struct StageGate<'a> {
    namer: &'a ArtifactNamer,
    remote: &'a RemoteIndex,
}

impl<'a> StageGate<'a> {
    pub fn new(namer: &'a ArtifactNamer, remote: &'a RemoteIndex) -> Self {
        Self { namer, remote }
    }

    pub fn should_run(&self, stage: Stage, binding: &TrackBinding) -> GateDecision {
        let track = binding.track.number;
        match stage {
            Stage::Match => GateDecision::Run,
            Stage::Download => {
                // a finished video makes the raw audio unnecessary
                if fs::is_valid_artifact(&self.namer.path(Artifact::Video { track })) {
                    return GateDecision::Skip;
                }
                local_decision(&self.namer.path(Artifact::RawAudio {
                    track,
                    format: binding.asset.format,
                }))
            }
            Stage::Render => local_decision(&self.namer.path(Artifact::Video { track })),
            Stage::Publish => match self.remote.get(track) {
                Some(_) => GateDecision::Skip,
                None => GateDecision::Run,
            },
        }
    }
}

/// Size-based validity only; content is never checksummed.
pub fn local_decision(path: &Path) -> GateDecision {
    if fs::is_valid_artifact(path) {
        GateDecision::Skip
    } else if fs::is_empty_artifact(path) {
        GateDecision::RunStale
    } else {
        GateDecision::Run
    }
}
