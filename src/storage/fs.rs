//! Probing and finalising local artifacts

use walkdir::WalkDir;

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use log::{debug, warn};
use regex::Regex;

use crate::storage::error::StorageError;

static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^track(\d{3,})\.(audio|video)\.[A-Za-z0-9]+$").expect("valid regex")
});

const PART_SUFFIX: &str = "part";

/// Best-effort check that a finished artifact is usable.
///
/// This does NOT decode media, but rules out:
/// - missing paths
/// - directories / special files
/// - empty files (a crash mid-write)
/// - unreadable files
pub fn is_valid_artifact(path: &Path) -> bool {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return false,
    };

    if !meta.is_file() || meta.len() == 0 {
        return false;
    }

    std::fs::File::open(path).is_ok()
}

/// An artifact that exists but holds no bytes
pub fn is_empty_artifact(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() == 0)
}

/// The sibling a writer fills before [`finalize`] moves it into place
pub fn part_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(PART_SUFFIX);
    path.with_file_name(name)
}

/// Renames the finished `.part` file onto its final name.
pub fn finalize(part: &Path, dest: &Path) -> Result<(), StorageError> {
    std::fs::rename(part, dest).map_err(|source| StorageError::Finalize {
        path: dest.to_path_buf(),
        source,
    })
}

/// Deletes an artifact; a file that is already gone is fine.
pub fn remove_artifact(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    RawAudio,
    Video,
    Background,
    /// unfinished write from an interrupted run
    Partial,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub track: Option<u32>,
    pub size: u64,
}

/// Lists every file left in a collection's artifact directory, sorted by path.
///
/// A missing directory simply means nothing was left behind.
pub fn scan_artifacts(dir: &Path) -> Result<Vec<LocalArtifact>, StorageError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let dir_str = dir.to_string_lossy();

    WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("error while scanning dir {dir_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| -> Result<LocalArtifact, StorageError> {
            let size = e.metadata()?.len();
            let (kind, track) = classify(&e.file_name().to_string_lossy());
            Ok(LocalArtifact {
                path: e.path().to_path_buf(),
                kind,
                track,
                size,
            })
        })
        .collect()
}

fn classify(name: &str) -> (ArtifactKind, Option<u32>) {
    if name.ends_with(&format!(".{PART_SUFFIX}")) {
        return (ArtifactKind::Partial, None);
    }
    if name.starts_with("background.") {
        return (ArtifactKind::Background, None);
    }
    match ARTIFACT_NAME.captures(name) {
        Some(caps) => {
            let kind = if &caps[2] == "audio" {
                ArtifactKind::RawAudio
            } else {
                ArtifactKind::Video
            };
            (kind, caps[1].parse().ok())
        }
        None => (ArtifactKind::Other, None),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_validity_is_size_based() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let full = tmp.path().join("track001.video.mp4");
        let empty = tmp.path().join("track002.video.mp4");
        std::fs::write(&full, b"data")?;
        std::fs::write(&empty, b"")?;

        assert!(is_valid_artifact(&full));
        assert!(!is_valid_artifact(&empty));
        assert!(is_empty_artifact(&empty));
        assert!(!is_valid_artifact(&tmp.path().join("missing.mp4")));
        assert!(!is_valid_artifact(tmp.path()));
        Ok(())
    }

    #[test]
    fn test_part_file_is_renamed_into_place() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let dest = tmp.path().join("track001.audio.flac");
        let part = part_path(&dest);
        assert_eq!(part, tmp.path().join("track001.audio.flac.part"));

        std::fs::write(&part, b"abc")?;
        assert!(!is_valid_artifact(&dest));
        finalize(&part, &dest)?;

        assert!(is_valid_artifact(&dest));
        assert!(!part.exists());
        Ok(())
    }

    #[test]
    fn test_removing_missing_artifact_is_ok() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        remove_artifact(&tmp.path().join("nope"))?;
        Ok(())
    }

    #[test]
    fn test_scan_classifies_leftovers() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let dir = tmp.path();
        std::fs::write(dir.join("track001.audio.flac"), b"aaa")?;
        std::fs::write(dir.join("track001.video.mp4"), b"bbbb")?;
        std::fs::write(dir.join("track002.video.mp4.part"), b"b")?;
        std::fs::write(dir.join("background.jpg"), b"img")?;
        std::fs::write(dir.join("notes.txt"), b"?")?;

        let found = scan_artifacts(dir)?;
        let summary: Vec<(ArtifactKind, Option<u32>, u64)> =
            found.iter().map(|a| (a.kind, a.track, a.size)).collect();

        assert_eq!(
            summary,
            vec![
                (ArtifactKind::Background, None, 3),
                (ArtifactKind::Other, None, 1),
                (ArtifactKind::RawAudio, Some(1), 3),
                (ArtifactKind::Video, Some(1), 4),
                (ArtifactKind::Partial, None, 1),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_scan_of_missing_dir_is_empty() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        assert!(scan_artifacts(&tmp.path().join("never-ran"))?.is_empty());
        Ok(())
    }
}
