//! The outside services a run depends on

use std::path::Path;

use crate::{
    domain::{PlaylistEntry, RemoteItem, RemotePlaylist, Visibility},
    pipeline::error::{DownloadError, PublishError, RenderError},
};

pub trait Downloader {
    /// Streams `url` into `dest`, returning the number of bytes written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

pub trait Renderer {
    /// Combines one audio file and an optional still image into a video at `dest`.
    fn render(&self, audio: &Path, image: Option<&Path>, dest: &Path) -> Result<(), RenderError>;

    /// Duration in seconds of a local path or remote URL, when it can be probed.
    fn duration(&self, source: &str) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
}

pub trait Publisher {
    /// Items of the authenticated channel whose description carries `marker`.
    fn find_published(&self, marker: &str) -> Result<Vec<RemoteItem>, PublishError>;

    /// Uploads a video, returning its item id.
    fn upload(&self, video: &Path, request: &UploadRequest) -> Result<String, PublishError>;

    fn find_playlist(&self, title: &str, marker: &str)
    -> Result<Option<RemotePlaylist>, PublishError>;

    /// Current entries of a playlist, in position order.
    fn playlist_items(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, PublishError>;

    fn create_playlist(
        &self,
        title: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<String, PublishError>;

    fn insert_into_playlist(
        &self,
        playlist_id: &str,
        item_id: &str,
        position: usize,
    ) -> Result<(), PublishError>;

    fn set_item_visibility(&self, item_id: &str, visibility: Visibility)
    -> Result<(), PublishError>;

    fn set_playlist_visibility(
        &self,
        playlist_id: &str,
        visibility: Visibility,
    ) -> Result<(), PublishError>;
}
