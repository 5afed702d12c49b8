//! Real implementations of the pipeline collaborators

pub mod archive;
pub mod error;
pub mod ffmpeg;
pub mod youtube;
