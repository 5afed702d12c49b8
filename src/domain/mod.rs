pub mod collection;
pub mod hash;
pub mod publish;
pub mod track;

pub use collection::CollectionMetadata;
pub use publish::{PlaylistEntry, PublishedItem, RemoteItem, RemotePlaylist, Visibility};
pub use track::{AudioAsset, AudioFormat, ImageAsset, Track, TrackBinding, TrackSource};
