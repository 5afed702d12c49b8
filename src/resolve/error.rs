use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no track data for {identifier}: no numbered description lines and no numbered audio files")]
    NoTrackData { identifier: String },
}
