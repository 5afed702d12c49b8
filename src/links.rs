//! URLs that appear in generated text or are handed to collaborators

const DETAILS_PREFIX: &str = "https://archive.org/details/";

/// canonical source URL of a collection, also the duplicate-detection marker
pub fn details_url(identifier: &str) -> String {
    format!("{DETAILS_PREFIX}{identifier}")
}

/// Accepts a bare identifier or an archive.org details URL
/// (`https://archive.org/details/<identifier>[/...][?...]`).
pub fn identifier_from_input(input: &str) -> Option<String> {
    let input = input.trim();
    let identifier = match input.find("/details/") {
        Some(idx) => {
            if !input.contains("archive.org/details/") {
                return None;
            }
            let rest = &input[idx + "/details/".len()..];
            rest.split(['/', '?', '#']).next().unwrap_or_default()
        }
        None if input.contains('/') || input.contains(':') => return None,
        None => input,
    };

    let valid = !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    valid.then(|| identifier.to_string())
}

/// download URL of one file inside a collection; every path segment is percent-encoded
pub fn download_url(base_url: &str, identifier: &str, filename: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = filename
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{base}/download/{identifier}/{path}")
}

pub fn metadata_url(base_url: &str, identifier: &str) -> String {
    format!("{}/metadata/{identifier}", base_url.trim_end_matches('/'))
}

pub fn video_url(item_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={item_id}")
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}
