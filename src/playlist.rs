//! Keeps the collection's playlist complete and in track order

use log::info;

use crate::{
    domain::{CollectionMetadata, PlaylistEntry, PublishedItem, Track, Visibility},
    format,
    pipeline::{collaborators::Publisher, error::PublishError},
};

/// Put `item_id` at 0-based `position`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOp {
    pub item_id: String,
    pub position: usize,
}

/// Computes the inserts that bring `existing` to the order of `desired`.
///
/// Items already present keep their relative order; each missing item goes
/// right after the closest earlier item that is present, or first if none is.
/// Entries not belonging to `desired` are left where they are.
pub fn reconcile(desired: &[PublishedItem], existing: &[PlaylistEntry]) -> Vec<InsertOp> {
    let mut ordered: Vec<&PlaylistEntry> = existing.iter().collect();
    ordered.sort_by_key(|e| e.position);
    let mut current: Vec<String> = ordered.into_iter().map(|e| e.item_id.clone()).collect();

    let mut ops = vec![];
    for (i, item) in desired.iter().enumerate() {
        if current.contains(&item.item_id) {
            continue;
        }
        let position = desired[..i]
            .iter()
            .rev()
            .find_map(|prev| current.iter().position(|id| *id == prev.item_id))
            .map_or(0, |idx| idx + 1);
        current.insert(position, item.item_id.clone());
        ops.push(InsertOp {
            item_id: item.item_id.clone(),
            position,
        });
    }
    ops
}

#[derive(Debug)]
pub struct PlaylistSync {
    pub playlist_id: String,
    pub created: bool,
    pub inserted: usize,
}

/// Finds or creates the collection's playlist and fills in what is missing.
pub fn sync(
    publisher: &dyn Publisher,
    meta: &CollectionMetadata,
    tracks: &[Track],
    published: &[PublishedItem],
    visibility: Visibility,
) -> Result<PlaylistSync, PublishError> {
    let title = format::playlist_title(meta);

    let (playlist_id, created, existing) =
        match publisher.find_playlist(&title, &meta.source_url)? {
            Some(playlist) => {
                let entries = publisher.playlist_items(&playlist.id)?;
                (playlist.id, false, entries)
            }
            None => {
                let description = format::playlist_description(meta, tracks);
                let id = publisher.create_playlist(&title, &description, visibility)?;
                info!("created playlist \"{title}\" ({id})");
                (id, true, vec![])
            }
        };

    let mut desired: Vec<PublishedItem> = published.to_vec();
    desired.sort_by_key(|p| p.track_number);
    let ops = reconcile(&desired, &existing);
    for op in &ops {
        publisher.insert_into_playlist(&playlist_id, &op.item_id, op.position)?;
    }
    if !ops.is_empty() {
        info!("added {} items to playlist {playlist_id}", ops.len());
    }

    Ok(PlaylistSync {
        playlist_id,
        created,
        inserted: ops.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use super::*;
    use crate::{
        domain::{RemoteItem, RemotePlaylist},
        pipeline::collaborators::UploadRequest,
    };

    fn item(n: u32) -> PublishedItem {
        PublishedItem {
            track_number: n,
            item_id: format!("v{n}"),
            title: format!("Song {n}"),
            newly_published: true,
        }
    }

    fn entries(ids: &[u32]) -> Vec<PlaylistEntry> {
        ids.iter()
            .enumerate()
            .map(|(position, n)| PlaylistEntry {
                item_id: format!("v{n}"),
                position,
            })
            .collect()
    }

    #[test]
    fn test_single_gap_is_filled_in_place() {
        let desired: Vec<_> = (1..=4).map(item).collect();
        let ops = reconcile(&desired, &entries(&[1, 3, 4]));
        assert_eq!(
            ops,
            vec![InsertOp {
                item_id: "v2".to_string(),
                position: 1
            }]
        );
    }

    #[test]
    fn test_empty_playlist_is_filled_in_order() {
        let desired: Vec<_> = (1..=3).map(item).collect();
        let positions: Vec<(String, usize)> = reconcile(&desired, &[])
            .into_iter()
            .map(|op| (op.item_id, op.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("v1".to_string(), 0),
                ("v2".to_string(), 1),
                ("v3".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_leading_gap_goes_first() {
        let desired: Vec<_> = (1..=3).map(item).collect();
        let ops = reconcile(&desired, &entries(&[2, 3]));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].position, 0);
    }

    #[test]
    fn test_complete_playlist_needs_nothing() {
        let desired: Vec<_> = (1..=3).map(item).collect();
        assert!(reconcile(&desired, &entries(&[1, 2, 3])).is_empty());
    }

    #[test]
    fn test_foreign_entries_are_kept() {
        let desired: Vec<_> = (1..=2).map(item).collect();
        let mut existing = entries(&[1]);
        existing.push(PlaylistEntry {
            item_id: "other".to_string(),
            position: 1,
        });
        let ops = reconcile(&desired, &existing);
        assert_eq!(ops[0].position, 1);
    }

    #[derive(Default)]
    struct FakePublisher {
        playlist: Option<RemotePlaylist>,
        entries: Vec<PlaylistEntry>,
        inserts: RefCell<Vec<(String, usize)>>,
        created: RefCell<Vec<String>>,
    }

    impl Publisher for FakePublisher {
        fn find_published(&self, _: &str) -> Result<Vec<RemoteItem>, PublishError> {
            Ok(vec![])
        }

        fn upload(&self, _: &Path, _: &UploadRequest) -> Result<String, PublishError> {
            unreachable!()
        }

        fn find_playlist(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<RemotePlaylist>, PublishError> {
            Ok(self.playlist.clone())
        }

        fn playlist_items(&self, _: &str) -> Result<Vec<PlaylistEntry>, PublishError> {
            Ok(self.entries.clone())
        }

        fn create_playlist(
            &self,
            title: &str,
            _: &str,
            _: Visibility,
        ) -> Result<String, PublishError> {
            self.created.borrow_mut().push(title.to_string());
            Ok("new-pl".to_string())
        }

        fn insert_into_playlist(
            &self,
            _: &str,
            item_id: &str,
            position: usize,
        ) -> Result<(), PublishError> {
            self.inserts
                .borrow_mut()
                .push((item_id.to_string(), position));
            Ok(())
        }

        fn set_item_visibility(&self, _: &str, _: Visibility) -> Result<(), PublishError> {
            Ok(())
        }

        fn set_playlist_visibility(&self, _: &str, _: Visibility) -> Result<(), PublishError> {
            Ok(())
        }
    }

    #[test]
    fn test_sync_creates_missing_playlist() -> anyhow::Result<()> {
        let publisher = FakePublisher::default();
        let meta = CollectionMetadata::new("x");
        let published = vec![item(2), item(1)];

        let outcome = sync(&publisher, &meta, &[], &published, Visibility::Private)?;

        assert!(outcome.created);
        assert_eq!(outcome.playlist_id, "new-pl");
        assert_eq!(publisher.created.borrow().len(), 1);
        assert_eq!(
            *publisher.inserts.borrow(),
            vec![("v1".to_string(), 0), ("v2".to_string(), 1)]
        );
        Ok(())
    }

    #[test]
    fn test_sync_heals_existing_playlist() -> anyhow::Result<()> {
        let publisher = FakePublisher {
            playlist: Some(RemotePlaylist {
                id: "pl".to_string(),
                title: "x".to_string(),
                description: "Original source: https://archive.org/details/x".to_string(),
            }),
            entries: entries(&[1, 3, 4]),
            ..Default::default()
        };
        let meta = CollectionMetadata::new("x");
        let published: Vec<_> = (1..=4).map(item).collect();

        let outcome = sync(&publisher, &meta, &[], &published, Visibility::Private)?;

        assert!(!outcome.created);
        assert_eq!(outcome.inserted, 1);
        assert!(publisher.created.borrow().is_empty());
        assert_eq!(*publisher.inserts.borrow(), vec![("v2".to_string(), 1)]);
        Ok(())
    }
}
