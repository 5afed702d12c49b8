//! Drives every bound track through download, render and publish

pub mod collaborators;
pub mod error;
pub mod gate;

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{
    domain::{CollectionMetadata, ImageAsset, PublishedItem, Track, TrackBinding, Visibility},
    format,
    storage::{Artifact, ArtifactNamer, fs},
};
use collaborators::{Downloader, Publisher, Renderer, UploadRequest};
use error::{DownloadError, FailedTrack, PipelineError, RenderError, TrackFailure};
use gate::{GateDecision, RemoteIndex, StageGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Match,
    Download,
    Render,
    Publish,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Match => "match",
            Stage::Download => "download",
            Stage::Render => "render",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Where one track stands in the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackState {
    Pending,
    Downloaded,
    Rendered,
    Published,
    Done,
    Failed { stage: Stage, error: String },
}

/// What a run works on
pub struct RunInput<'a> {
    pub metadata: &'a CollectionMetadata,
    pub bindings: &'a [TrackBinding],
    /// tracks the matcher could not bind; reported as failures
    pub unmatched: &'a [Track],
    pub total_tracks: u32,
    pub image: Option<&'a ImageAsset>,
}

#[derive(Debug, Default)]
pub struct RunResult {
    /// every item of the collection, new or from earlier runs, by track number
    pub published: Vec<PublishedItem>,
    pub failures: Vec<FailedTrack>,
    pub states: BTreeMap<u32, TrackState>,
}

impl RunResult {
    pub fn newly_published(&self) -> usize {
        self.published.iter().filter(|p| p.newly_published).count()
    }
}

pub struct Collaborators<'a> {
    pub downloader: &'a dyn Downloader,
    pub renderer: &'a dyn Renderer,
    pub publisher: &'a dyn Publisher,
}

/// Sequential, resumable pipeline for one collection.
///
/// Nothing is persisted besides the artifacts themselves: every decision is
/// re-derived from the artifact directory and the publisher on each run.
pub struct Pipeline<'a> {
    services: Collaborators<'a>,
    namer: ArtifactNamer,
}

impl<'a> Pipeline<'a> {
    pub fn new(services: Collaborators<'a>, artifact_root: &Path, identifier: &str) -> Self {
        Self {
            services,
            namer: ArtifactNamer::new(artifact_root, identifier),
        }
    }

    /// Items already published for this collection.
    pub fn remote_index(&self, input: &RunInput) -> Result<RemoteIndex, PipelineError> {
        let source_url = &input.metadata.source_url;
        let items = self
            .services
            .publisher
            .find_published(source_url)
            .map_err(PipelineError::RemoteLookup)?;
        let titles: HashMap<u32, String> = input
            .bindings
            .iter()
            .map(|b| {
                let title = format::video_title(input.metadata, &b.track, input.total_tracks);
                (b.track.number, title)
            })
            .collect();
        Ok(RemoteIndex::build(items, source_url, &titles))
    }

    pub fn run(
        &self,
        input: &RunInput,
        visibility: Visibility,
    ) -> Result<RunResult, PipelineError> {
        std::fs::create_dir_all(self.namer.dir())
            .map_err(|e| PipelineError::Storage(e.into()))?;

        let remote = self.remote_index(input)?;
        if !remote.is_empty() {
            info!("{} tracks were published by an earlier run", remote.len());
        }
        let gate = StageGate::new(&self.namer, &remote);

        let mut result = RunResult::default();
        for track in input.unmatched {
            result.states.insert(
                track.number,
                TrackState::Failed {
                    stage: Stage::Match,
                    error: TrackFailure::Unmatched.to_string(),
                },
            );
            result.failures.push(FailedTrack {
                track: track.clone(),
                stage: Stage::Match,
                error: TrackFailure::Unmatched,
            });
        }

        let mut background = BackgroundImage::NotFetched;
        for binding in input.bindings {
            let number = binding.track.number;
            if let Some(existing) = remote.get(number) {
                result.states.insert(number, TrackState::Done);
                result.published.push(PublishedItem {
                    track_number: number,
                    item_id: existing.id.clone(),
                    title: existing.title.clone(),
                    newly_published: false,
                });
                continue;
            }

            let mut state = TrackState::Pending;
            match self.process(input, binding, &gate, &mut background, visibility, &mut state) {
                Ok(item) => {
                    advance(number, &mut state, TrackState::Done);
                    result.published.push(item);
                }
                Err((stage, error)) => {
                    warn!("track {number} failed at {stage}: {error}");
                    advance(
                        number,
                        &mut state,
                        TrackState::Failed {
                            stage,
                            error: error.to_string(),
                        },
                    );
                    result.failures.push(FailedTrack {
                        track: binding.track.clone(),
                        stage,
                        error,
                    });
                }
            }
            result.states.insert(number, state);
        }

        result.published.sort_by_key(|p| p.track_number);
        result.failures.sort_by_key(|f| f.track.number);

        let publish_failures = result
            .failures
            .iter()
            .filter(|f| f.stage == Stage::Publish)
            .count();
        if result.published.is_empty()
            && !input.bindings.is_empty()
            && publish_failures == input.bindings.len()
        {
            return Err(PipelineError::AllUploadsFailed {
                failures: result.failures,
            });
        }

        info!(
            "{}: {} published ({} new), {} failed",
            input.metadata.identifier,
            result.published.len(),
            result.newly_published(),
            result.failures.len()
        );
        Ok(result)
    }

    fn process(
        &self,
        input: &RunInput,
        binding: &TrackBinding,
        gate: &StageGate,
        background: &mut BackgroundImage,
        visibility: Visibility,
        state: &mut TrackState,
    ) -> Result<PublishedItem, (Stage, TrackFailure)> {
        let track = &binding.track;
        let audio = self.namer.path(Artifact::RawAudio {
            track: track.number,
            format: binding.asset.format,
        });
        let video = self.namer.path(Artifact::Video {
            track: track.number,
        });

        match gate.should_run(Stage::Download, binding) {
            GateDecision::Skip => info!("track {}: download already done", track.number),
            decision => {
                self.download(&binding.asset.download_url, &audio, decision)
                    .map_err(|e| (Stage::Download, e))?;
            }
        }
        advance(track.number, state, TrackState::Downloaded);

        match gate.should_run(Stage::Render, binding) {
            GateDecision::Skip => info!("track {}: render already done", track.number),
            decision => {
                let image = background.path(self, input.image);
                self.render(&audio, image.as_deref(), &video, decision)
                    .map_err(|e| (Stage::Render, e))?;
            }
        }
        advance(track.number, state, TrackState::Rendered);

        let title = format::video_title(input.metadata, track, input.total_tracks);
        let request = UploadRequest {
            title: title.clone(),
            description: format::track_description(input.metadata, track, input.total_tracks),
            tags: input.metadata.topics.clone(),
            visibility,
        };
        info!("track {}: publishing \"{title}\" as {visibility}", track.number);
        let item_id = self
            .services
            .publisher
            .upload(&video, &request)
            .map_err(|e| (Stage::Publish, TrackFailure::Publish(e)))?;
        advance(track.number, state, TrackState::Published);

        // only now are the lower-stage artifacts superseded
        for path in [&audio, &video] {
            if let Err(e) = fs::remove_artifact(path) {
                warn!("could not remove {}: {e}", path.display());
            }
        }

        Ok(PublishedItem {
            track_number: track.number,
            item_id,
            title,
            newly_published: true,
        })
    }

    fn download(&self, url: &str, dest: &Path, decision: GateDecision) -> Result<(), TrackFailure> {
        if decision == GateDecision::RunStale {
            warn!("removing empty leftover {}", dest.display());
            fs::remove_artifact(dest)?;
        }
        let part = fs::part_path(dest);
        let bytes = self.services.downloader.fetch(url, &part)?;
        if bytes == 0 || !fs::is_valid_artifact(&part) {
            fs::remove_artifact(&part)?;
            return Err(DownloadError::Empty {
                url: url.to_string(),
            }
            .into());
        }
        fs::finalize(&part, dest)?;
        info!("downloaded {} ({bytes} bytes)", dest.display());
        Ok(())
    }

    fn render(
        &self,
        audio: &Path,
        image: Option<&Path>,
        dest: &Path,
        decision: GateDecision,
    ) -> Result<(), TrackFailure> {
        if decision == GateDecision::RunStale {
            warn!("removing empty leftover {}", dest.display());
            fs::remove_artifact(dest)?;
        }
        let part = fs::part_path(dest);
        self.services.renderer.render(audio, image, &part)?;
        if !fs::is_valid_artifact(&part) {
            fs::remove_artifact(&part)?;
            return Err(RenderError::EmptyOutput(dest.to_path_buf()).into());
        }
        fs::finalize(&part, dest)?;
        info!("rendered {}", dest.display());
        Ok(())
    }
}

/// The collection image, fetched once on the first render that needs it
enum BackgroundImage {
    NotFetched,
    Ready(Option<PathBuf>),
}

impl BackgroundImage {
    fn path(&mut self, pipeline: &Pipeline, image: Option<&ImageAsset>) -> Option<PathBuf> {
        if let BackgroundImage::Ready(path) = self {
            return path.clone();
        }
        let path = image.and_then(|image| fetch_background(pipeline, image));
        *self = BackgroundImage::Ready(path.clone());
        path
    }
}

fn fetch_background(pipeline: &Pipeline, image: &ImageAsset) -> Option<PathBuf> {
    let extension = image.extension();
    let dest = pipeline.namer.path(Artifact::Background {
        extension: &extension,
    });
    match gate::local_decision(&dest) {
        GateDecision::Skip => return Some(dest),
        decision => {
            if let Err(e) = pipeline.download(&image.download_url, &dest, decision) {
                warn!("background image unavailable, rendering without it: {e}");
                return None;
            }
        }
    }
    Some(dest)
}

fn advance(track: u32, state: &mut TrackState, next: TrackState) {
    debug!("track {track}: {state:?} -> {next:?}");
    *state = next;
}
