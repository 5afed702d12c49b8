//! Post-hoc visibility change for everything a collection published

use log::{info, warn};

use crate::{
    domain::{CollectionMetadata, Visibility},
    format,
    pipeline::{collaborators::Publisher, error::PublishError},
};

#[derive(Debug, Default)]
pub struct ReleaseOutcome {
    pub items: usize,
    pub playlist_id: Option<String>,
}

/// Sets every published item of the collection, and its playlist, to `visibility`.
pub fn release(
    publisher: &dyn Publisher,
    meta: &CollectionMetadata,
    visibility: Visibility,
) -> Result<ReleaseOutcome, PublishError> {
    let items = publisher.find_published(&meta.source_url)?;
    if items.is_empty() {
        warn!("nothing published yet for {}", meta.identifier);
    }
    for item in &items {
        publisher.set_item_visibility(&item.id, visibility)?;
        info!("{} ({}) is now {visibility}", item.title, item.id);
    }

    let title = format::playlist_title(meta);
    let playlist_id = match publisher.find_playlist(&title, &meta.source_url)? {
        Some(playlist) => {
            publisher.set_playlist_visibility(&playlist.id, visibility)?;
            info!("playlist {} is now {visibility}", playlist.id);
            Some(playlist.id)
        }
        None => None,
    };

    Ok(ReleaseOutcome {
        items: items.len(),
        playlist_id,
    })
}
