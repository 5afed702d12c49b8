use std::path::PathBuf;

use thiserror::Error;

use crate::{domain::Track, pipeline::Stage, storage::error::StorageError};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url} produced an empty file")]
    Empty { url: String },

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("renderer produced an empty file at {0}")]
    EmptyOutput(PathBuf),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("not authorized: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("publishing service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why one track did not make it through
#[derive(Debug, Error)]
pub enum TrackFailure {
    #[error("no audio file matches this track")]
    Unmatched,

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("artifact error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct FailedTrack {
    pub track: Track,
    pub stage: Stage,
    pub error: TrackFailure,
}

/// Errors that stop a whole collection
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not look up earlier uploads, stopping to avoid duplicates: {0}")]
    RemoteLookup(#[source] PublishError),

    #[error("all {} uploads failed, first error: {}", .failures.len(), first_error(.failures))]
    AllUploadsFailed { failures: Vec<FailedTrack> },

    #[error("artifact directory error: {0}")]
    Storage(#[from] StorageError),
}

fn first_error(failures: &[FailedTrack]) -> String {
    failures
        .first()
        .map(|f| f.error.to_string())
        .unwrap_or_default()
}
