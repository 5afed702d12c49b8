//! Background image selection

use std::path::Path;

use log::debug;

use super::{filename, record::RawFile};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const KNOWN_NAMES: &[&str] = &["cover", "folder", "front", "artwork", "img", "image"];
const SKIPPED_FORMATS: &[&str] = &["thumbnail", "spectrogram", "item tile"];

/// Picks the file that most plausibly illustrates the whole collection.
///
/// Per-track images (those carrying a track number), thumbnails and
/// spectrograms are never chosen. The remaining candidates are ranked by
/// being an original upload, how many other files were derived from them,
/// and a conventional cover name.
pub fn select_background(files: &[RawFile]) -> Option<&RawFile> {
    let mut candidates: Vec<(i64, &RawFile)> = files
        .iter()
        .filter(|f| is_collection_image(f))
        .map(|f| (score(f, files), f))
        .collect();

    candidates.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| is_jpeg(b).cmp(&is_jpeg(a)))
            .then_with(|| a.name.cmp(&b.name))
    });
    if let Some((score, file)) = candidates.first() {
        debug!("background image {} (score {score})", file.name);
    }
    candidates.first().map(|(_, f)| *f)
}

fn is_collection_image(file: &RawFile) -> bool {
    let name = file.name.to_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension(&name).as_str()) {
        return false;
    }
    if name.contains(".thumbs/") || name.ends_with("__ia_thumb.jpg") {
        return false;
    }
    let format = file.format.as_deref().unwrap_or_default().to_lowercase();
    if SKIPPED_FORMATS.iter().any(|f| format.contains(f)) {
        return false;
    }
    filename::extract(&file.name).is_none()
}

fn score(file: &RawFile, files: &[RawFile]) -> i64 {
    let mut score = 0;
    if file.is_original() {
        score += 2;
    }
    let references = files
        .iter()
        .filter(|f| f.original.as_deref() == Some(file.name.as_str()))
        .count();
    score += references as i64;

    let stem = Path::new(&file.name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if KNOWN_NAMES.contains(&stem.as_str()) {
        score += 3;
    }
    score
}

fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

fn is_jpeg(file: &RawFile) -> bool {
    matches!(extension(&file.name).as_str(), "jpg" | "jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, source: &str) -> RawFile {
        RawFile {
            name: name.to_string(),
            source: Some(source.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cover_beats_other_images() {
        let files = vec![
            file("poster.png", "original"),
            file("cover.jpg", "original"),
            file("t01.flac", "original"),
        ];
        assert_eq!(select_background(&files).unwrap().name, "cover.jpg");
    }

    #[test]
    fn test_thumbnails_and_track_images_are_skipped() {
        let files = vec![
            file("romp__ia_thumb.jpg", "original"),
            file("track01.jpg", "original"),
            file(".thumbs/t01_000001.jpg", "derivative"),
            RawFile {
                format: Some("Spectrogram".to_string()),
                ..file("t01_spectrogram.png", "derivative")
            },
        ];
        assert!(select_background(&files).is_none());
    }

    #[test]
    fn test_most_referenced_image_wins() {
        let mut thumb = file("poster_thumb.jpg", "derivative");
        thumb.original = Some("poster.png".to_string());
        let files = vec![
            file("flyer.gif", "original"),
            file("poster.png", "original"),
            thumb,
        ];
        assert_eq!(select_background(&files).unwrap().name, "poster.png");
    }

    #[test]
    fn test_no_images_is_not_an_error() {
        assert!(select_background(&[file("t01.flac", "original")]).is_none());
    }
}
