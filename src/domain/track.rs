use std::path::Path;

/// Where a track's name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Description,
    FilenameInference,
}

/// One logical track.
///
/// `number` is global and contiguous across discs, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub number: u32,
    pub disc: u32,
    pub name: String,
    pub derived_from: TrackSource,
}

/// Audio container formats, ordered by preference (best first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioFormat {
    Flac,
    Wav,
    M4a,
    Ogg,
    Mp3,
}

const AUDIO_EXTENSIONS: &[(&str, AudioFormat)] = &[
    ("flac", AudioFormat::Flac),
    ("wav", AudioFormat::Wav),
    ("m4a", AudioFormat::M4a),
    ("ogg", AudioFormat::Ogg),
    ("mp3", AudioFormat::Mp3),
];

impl AudioFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        AUDIO_EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, format)| *format)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// One physical audio file listed in the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub filename: String,
    pub download_url: String,
    pub format: AudioFormat,
    pub extracted_number: Option<u32>,
    pub extracted_disc: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub filename: String,
    pub download_url: String,
}

impl ImageAsset {
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "jpg".to_string())
    }
}

/// A track paired with the single asset verified to carry its audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackBinding {
    pub track: Track,
    pub asset: AudioAsset,
}
