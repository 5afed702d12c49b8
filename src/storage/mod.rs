use std::path::{Path, PathBuf};

use crate::domain::{AudioFormat, hash::Fingerprint};

pub mod error;
pub mod fs;

/// One local file a track (or the collection) produces along the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact<'a> {
    RawAudio { track: u32, format: AudioFormat },
    Video { track: u32 },
    Background { extension: &'a str },
}

/// Deterministic local paths for one collection.
///
/// Every collection gets its own directory under the artifact root, so
/// independent collections never share a file.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    dir: PathBuf,
}

impl ArtifactNamer {
    pub fn new(root: &Path, identifier: &str) -> Self {
        Self {
            dir: root.join(collection_slug(identifier)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        let name = match artifact {
            Artifact::RawAudio { track, format } => {
                format!("track{track:03}.audio.{}", format.extension())
            }
            Artifact::Video { track } => format!("track{track:03}.video.mp4"),
            Artifact::Background { extension } => format!("background.{extension}"),
        };
        self.dir.join(name)
    }
}

/// Filesystem-safe directory name for an identifier.
///
/// Identifiers that need rewriting get a digest suffix, so two identifiers
/// that sanitize alike still land in different directories.
pub fn collection_slug(identifier: &str) -> String {
    let sanitized: String = identifier
        .chars()
        .enumerate()
        .map(|(i, c)| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            '.' if i > 0 => c,
            _ => '_',
        })
        .collect();
    if sanitized == identifier && !sanitized.is_empty() {
        sanitized
    } else {
        format!("{sanitized}-{}", Fingerprint::of(identifier).short())
    }
}
