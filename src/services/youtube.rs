//! YouTube Data API v3 publisher over `ureq`
//!
//! The OAuth exchange happens elsewhere; this client only reads an
//! `access_token` from the configured token file.

use std::{fs::File, path::Path, time::Duration};

use log::{debug, info};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    config::PublishConfig,
    domain::{PlaylistEntry, RemoteItem, RemotePlaylist, Visibility},
    format,
    pipeline::{
        collaborators::{Publisher, UploadRequest},
        error::PublishError,
    },
};

const PAGE_SIZE: &str = "50";
/// `videos?id=` accepts at most this many ids per call
const IDS_PER_CALL: usize = 50;

#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    position: usize,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

pub struct YouTubePublisher {
    agent: ureq::Agent,
    config: PublishConfig,
    token: String,
}

impl YouTubePublisher {
    pub fn new(config: PublishConfig) -> Result<Self, PublishError> {
        let file = File::open(&config.token_path).map_err(|e| {
            PublishError::Auth(format!("cannot read {}: {e}", config.token_path.display()))
        })?;
        let token: TokenFile = serde_json::from_reader(file)
            .map_err(|e| PublishError::Auth(format!("malformed token file: {e}")))?;
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(300))
            .build();
        Ok(Self {
            agent,
            config,
            token: token.access_token,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/json")
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, PublishError> {
        let mut request = self.authorized(self.agent.get(&self.api(path)));
        for (key, value) in query {
            request = request.query(key, value);
        }
        debug!("GET {path} {query:?}");
        decode(request.call().map_err(classify)?)
    }

    /// Follows `nextPageToken` until the listing is exhausted.
    fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, PublishError> {
        let mut items = vec![];
        let mut token: Option<String> = None;
        loop {
            let mut query = query.to_vec();
            if let Some(token) = &token {
                query.push(("pageToken", token.as_str()));
            }
            let page: Page<T> = self.get(path, &query)?;
            items.extend(page.items);
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => return Ok(items),
            }
        }
    }

    fn send(&self, method: &str, path: &str, part: &str, body: Value) -> Result<Value, PublishError> {
        let request = self
            .authorized(self.agent.request(method, &self.api(path)))
            .query("part", part);
        debug!("{method} {path}");
        decode(request.send_json(body).map_err(classify)?)
    }

    fn videos(&self, ids: &[String]) -> Result<Vec<RemoteItem>, PublishError> {
        let mut items = vec![];
        for chunk in ids.chunks(IDS_PER_CALL) {
            let joined = chunk.join(",");
            let page: Page<Resource> =
                self.get("videos", &[("part", "snippet"), ("id", joined.as_str())])?;
            items.extend(page.items.into_iter().map(|v| RemoteItem {
                id: v.id,
                title: v.snippet.title,
                description: v.snippet.description,
            }));
        }
        Ok(items)
    }
}

impl Publisher for YouTubePublisher {
    fn find_published(&self, marker: &str) -> Result<Vec<RemoteItem>, PublishError> {
        // search matches words, the identifier is the distinctive one
        let identifier = marker.trim_end_matches('/').rsplit('/').next().unwrap_or(marker);
        let found: Vec<SearchResult> = self.get_all(
            "search",
            &[
                ("part", "id"),
                ("forMine", "true"),
                ("type", "video"),
                ("maxResults", PAGE_SIZE),
                ("q", identifier),
            ],
        )?;
        let ids: Vec<String> = found.into_iter().filter_map(|r| r.id.video_id).collect();
        // search snippets are truncated, full descriptions come from `videos`
        let items: Vec<RemoteItem> = self
            .videos(&ids)?
            .into_iter()
            .filter(|item| format::mentions_source(&item.description, marker))
            .collect();
        info!("{} earlier uploads reference {marker}", items.len());
        Ok(items)
    }

    fn upload(&self, video: &Path, request: &UploadRequest) -> Result<String, PublishError> {
        let size = std::fs::metadata(video)?.len();
        let mime = mime_guess::from_path(video).first_or_octet_stream();
        let url = format!(
            "{}/videos",
            self.config.upload_base.trim_end_matches('/')
        );
        let body = json!({
            "snippet": {
                "title": request.title,
                "description": request.description,
                "tags": request.tags,
                "categoryId": self.config.category_id,
            },
            "status": {
                "privacyStatus": request.visibility.as_str(),
                "selfDeclaredMadeForKids": false,
            },
        });

        let session = self
            .authorized(self.agent.post(&url))
            .query("uploadType", "resumable")
            .query("part", "snippet,status")
            .set("X-Upload-Content-Type", mime.essence_str())
            .set("X-Upload-Content-Length", &size.to_string())
            .send_json(body)
            .map_err(classify)?;
        let location = session
            .header("Location")
            .ok_or_else(|| PublishError::Decode("upload session without Location".to_string()))?
            .to_string();

        info!("uploading {} ({size} bytes)", video.display());
        let response = self
            .agent
            .put(&location)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", mime.essence_str())
            .set("Content-Length", &size.to_string())
            .send(File::open(video)?)
            .map_err(classify)?;
        let created: Created = decode(response)?;
        info!("uploaded as {}", created.id);
        Ok(created.id)
    }

    fn find_playlist(
        &self,
        title: &str,
        marker: &str,
    ) -> Result<Option<RemotePlaylist>, PublishError> {
        let playlists: Vec<Resource> = self.get_all(
            "playlists",
            &[("part", "snippet"), ("mine", "true"), ("maxResults", PAGE_SIZE)],
        )?;
        let wanted = normalize(title);
        Ok(playlists
            .into_iter()
            .find(|p| {
                let have = normalize(&p.snippet.title);
                (have.contains(&wanted) || wanted.contains(&have))
                    && format::mentions_source(&p.snippet.description, marker)
            })
            .map(|p| RemotePlaylist {
                id: p.id,
                title: p.snippet.title,
                description: p.snippet.description,
            }))
    }

    fn playlist_items(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, PublishError> {
        let items: Vec<PlaylistItem> = self.get_all(
            "playlistItems",
            &[
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", PAGE_SIZE),
            ],
        )?;
        let mut entries: Vec<PlaylistEntry> = items
            .into_iter()
            .map(|i| PlaylistEntry {
                item_id: i.snippet.resource_id.video_id,
                position: i.snippet.position,
            })
            .collect();
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }

    fn create_playlist(
        &self,
        title: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<String, PublishError> {
        let created = self.send(
            "POST",
            "playlists",
            "snippet,status",
            json!({
                "snippet": {"title": title, "description": description},
                "status": {"privacyStatus": visibility.as_str()},
            }),
        )?;
        id_of(&created)
    }

    fn insert_into_playlist(
        &self,
        playlist_id: &str,
        item_id: &str,
        position: usize,
    ) -> Result<(), PublishError> {
        self.send(
            "POST",
            "playlistItems",
            "snippet",
            json!({
                "snippet": {
                    "playlistId": playlist_id,
                    "position": position,
                    "resourceId": {"kind": "youtube#video", "videoId": item_id},
                },
            }),
        )?;
        Ok(())
    }

    fn set_item_visibility(&self, item_id: &str, visibility: Visibility) -> Result<(), PublishError> {
        self.send(
            "PUT",
            "videos",
            "status",
            json!({"id": item_id, "status": {"privacyStatus": visibility.as_str()}}),
        )?;
        info!("video {item_id} is now {visibility}");
        Ok(())
    }

    fn set_playlist_visibility(
        &self,
        playlist_id: &str,
        visibility: Visibility,
    ) -> Result<(), PublishError> {
        // the update replaces the snippet, so send the current one back
        let page: Page<Value> = self.get(
            "playlists",
            &[("part", "snippet"), ("id", playlist_id)],
        )?;
        let snippet = page
            .items
            .into_iter()
            .next()
            .and_then(|p| p.get("snippet").cloned())
            .ok_or_else(|| PublishError::Decode(format!("playlist {playlist_id} not found")))?;
        self.send(
            "PUT",
            "playlists",
            "snippet,status",
            json!({
                "id": playlist_id,
                "snippet": snippet,
                "status": {"privacyStatus": visibility.as_str()},
            }),
        )?;
        info!("playlist {playlist_id} is now {visibility}");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, PublishError> {
    response
        .into_json()
        .map_err(|e| PublishError::Decode(e.to_string()))
}

fn id_of(value: &Value) -> Result<String, PublishError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PublishError::Decode("response without id".to_string()))
}

fn classify(error: ureq::Error) -> PublishError {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(status, body)
        }
        ureq::Error::Transport(t) => PublishError::Transport(t.to_string()),
    }
}

fn classify_status(status: u16, body: String) -> PublishError {
    match status {
        401 => PublishError::Auth(body),
        403 if body.contains("quotaExceeded") || body.contains("uploadLimitExceeded") => {
            PublishError::Quota(body)
        }
        _ => PublishError::Status { status, body },
    }
}

fn normalize(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_errors_are_recognised() {
        let body = r#"{"error": {"errors": [{"reason": "quotaExceeded"}]}}"#.to_string();
        assert!(matches!(classify_status(403, body), PublishError::Quota(_)));
        assert!(matches!(
            classify_status(403, "forbidden".to_string()),
            PublishError::Status { status: 403, .. }
        ));
        assert!(matches!(classify_status(401, String::new()), PublishError::Auth(_)));
    }

    #[test]
    fn test_playlist_items_page_parses() -> anyhow::Result<()> {
        let page: Page<PlaylistItem> = serde_json::from_str(
            r#"{
                "nextPageToken": "abc",
                "items": [
                    {"snippet": {"position": 1, "resourceId": {"kind": "youtube#video", "videoId": "v2"}}},
                    {"snippet": {"position": 0, "resourceId": {"kind": "youtube#video", "videoId": "v1"}}}
                ]
            }"#,
        )?;
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.items[1].snippet.resource_id.video_id, "v1");
        Ok(())
    }

    #[test]
    fn test_missing_token_file_is_an_auth_error() {
        let config = PublishConfig {
            token_path: "/nonexistent/token.json".into(),
            ..Default::default()
        };
        assert!(matches!(
            YouTubePublisher::new(config),
            Err(PublishError::Auth(_))
        ));
    }

    #[test]
    fn test_titles_compare_loosely() {
        assert_eq!(normalize("  Romp   Live "), "romp live");
    }
}
