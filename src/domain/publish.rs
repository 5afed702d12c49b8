use std::{fmt::Display, str::FromStr};

use serde::Deserialize;

/// Visibility of a published item or playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Unlisted,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
            Visibility::Public => "public",
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "unlisted" => Ok(Visibility::Unlisted),
            "public" => Ok(Visibility::Public),
            other => Err(format!(
                "unknown visibility '{other}', expected private, unlisted or public"
            )),
        }
    }
}

/// A track that exists on the publishing platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedItem {
    pub track_number: u32,
    pub item_id: String,
    pub title: String,
    /// false when the item was found from an earlier run
    pub newly_published: bool,
}

/// An item as reported by the publishing platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// One slot of a remote playlist, 0-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub item_id: String,
    pub position: usize,
}
