//! Dry run: what a collection would become, without downloading anything

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::{
    format, links,
    matcher::{self, MatchOutcome},
    pipeline::collaborators::Renderer,
    resolve::{self, ResolvedCollection, error::ResolveError, record::RawRecord},
    services::error::FetchError,
};

/// Where raw collection records come from
pub trait RecordSource {
    fn fetch_record(&self, identifier: &str) -> Result<RawRecord, FetchError>;

    /// Base URL download links are built on
    fn download_base(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("not an archive.org identifier or details URL: {0:?}")]
    InvalidInput(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A resolved and matched collection
pub struct LoadedCollection {
    pub resolved: ResolvedCollection,
    pub matched: MatchOutcome,
}

impl LoadedCollection {
    pub fn total_tracks(&self) -> u32 {
        self.resolved.tracks.len() as u32
    }
}

/// Fetches, resolves and matches the collection named by `input`.
pub fn load(source: &dyn RecordSource, input: &str) -> Result<LoadedCollection, PreviewError> {
    let identifier = links::identifier_from_input(input)
        .ok_or_else(|| PreviewError::InvalidInput(input.to_string()))?;
    info!("fetching metadata for {identifier}");
    let record = source.fetch_record(&identifier)?;
    let resolved = resolve::resolve(&identifier, &record, source.download_base())?;
    let matched = matcher::match_tracks(&resolved.tracks, &resolved.assets);
    info!(
        "{identifier}: {} tracks, {} bound, {} unmatched",
        resolved.tracks.len(),
        matched.bindings.len(),
        matched.unmatched.len()
    );
    Ok(LoadedCollection { resolved, matched })
}

#[derive(Debug, Serialize)]
pub struct Preview {
    pub identifier: String,
    pub source_url: String,
    pub playlist_title: String,
    pub performer: Option<String>,
    pub date: Option<String>,
    pub venue: Option<String>,
    pub image: Option<String>,
    pub tracks: Vec<PreviewTrack>,
}

#[derive(Debug, Serialize)]
pub struct PreviewTrack {
    pub number: u32,
    pub disc: u32,
    pub name: String,
    pub title: String,
    /// bound audio file, absent when the track is unmatched
    pub file: Option<String>,
    pub format: Option<&'static str>,
    pub duration_secs: Option<f64>,
}

impl Preview {
    pub fn unmatched(&self) -> impl Iterator<Item = &PreviewTrack> {
        self.tracks.iter().filter(|t| t.file.is_none())
    }
}

/// Builds the preview of a loaded collection.
///
/// With a renderer, each bound file's duration is probed from its remote URL.
pub fn build(loaded: &LoadedCollection, renderer: Option<&dyn Renderer>) -> Preview {
    let meta = &loaded.resolved.metadata;
    let total = loaded.total_tracks();

    let tracks = loaded
        .resolved
        .tracks
        .iter()
        .map(|track| {
            let binding = loaded
                .matched
                .bindings
                .iter()
                .find(|b| b.track.number == track.number);
            let duration_secs = match (binding, renderer) {
                (Some(b), Some(renderer)) => {
                    debug!("probing {}", b.asset.download_url);
                    renderer.duration(&b.asset.download_url)
                }
                _ => None,
            };
            PreviewTrack {
                number: track.number,
                disc: track.disc,
                name: track.name.clone(),
                title: format::video_title(meta, track, total),
                file: binding.map(|b| b.asset.filename.clone()),
                format: binding.map(|b| b.asset.format.extension()),
                duration_secs,
            }
        })
        .collect();

    Preview {
        identifier: meta.identifier.clone(),
        source_url: meta.source_url.clone(),
        playlist_title: format::playlist_title(meta),
        performer: meta.performer.clone(),
        date: meta.date.clone(),
        venue: meta.venue.clone(),
        image: loaded.resolved.image.as_ref().map(|i| i.filename.clone()),
        tracks,
    }
}
