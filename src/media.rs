//! Media lookup collaborator.
//!
//! `completionMediaId` and `backgroundMediaId` are opaque identifiers owned
//! by an external media service; this client resolves them into a playable
//! reference. The core never interprets the id itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A resolved media reference.
#[derive(Debug, Clone, Serialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
}

/// Item shape returned by the media service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaItem {
    #[serde(default)]
    public_urls: Vec<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    content_type: String,
}

/// HTTP client for the external media API.
pub struct MediaClient {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl MediaClient {
    /// `base_url = None` means no media service is configured; every lookup
    /// resolves to `None`.
    pub fn new(base_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    /// Resolve an opaque media id. Lookup failures are logged and resolve to
    /// `None`; they are never fatal to the render path.
    pub async fn get_by_id(&self, id: &str) -> Option<MediaRef> {
        let base = self.base_url.as_ref()?;
        let url = format!("{}/media/{}", base.trim_end_matches('/'), id);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Media: Lookup of {} failed: {}", id, e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("Media: Lookup of {} returned {}", id, response.status());
            return None;
        }

        let item: MediaItem = match response.json().await {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Media: Malformed item for {}: {}", id, e);
                return None;
            }
        };

        resolve_item(item)
    }
}

fn resolve_item(item: MediaItem) -> Option<MediaRef> {
    let url = item
        .public_urls
        .into_iter()
        .next()
        .or(item.thumbnail_url)?;
    Some(MediaRef {
        url,
        kind: kind_from_content_type(&item.content_type),
    })
}

fn kind_from_content_type(content_type: &str) -> MediaKind {
    if content_type.starts_with("video") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_content_type() {
        assert_eq!(kind_from_content_type("video/mp4"), MediaKind::Video);
        assert_eq!(kind_from_content_type("image/png"), MediaKind::Image);
        assert_eq!(kind_from_content_type(""), MediaKind::Image);
    }

    #[test]
    fn test_resolve_prefers_public_url_over_thumbnail() {
        let item = MediaItem {
            public_urls: vec!["https://cdn/a.mp4".to_string()],
            thumbnail_url: Some("https://cdn/a.jpg".to_string()),
            content_type: "video/mp4".to_string(),
        };
        let resolved = resolve_item(item).unwrap();
        assert_eq!(resolved.url, "https://cdn/a.mp4");
        assert_eq!(resolved.kind, MediaKind::Video);
    }

    #[test]
    fn test_resolve_falls_back_to_thumbnail() {
        let item = MediaItem {
            public_urls: vec![],
            thumbnail_url: Some("https://cdn/a.jpg".to_string()),
            content_type: "image/jpeg".to_string(),
        };
        assert_eq!(resolve_item(item).unwrap().url, "https://cdn/a.jpg");
    }

    #[test]
    fn test_resolve_without_any_url_is_none() {
        let item = MediaItem {
            public_urls: vec![],
            thumbnail_url: None,
            content_type: "image/jpeg".to_string(),
        };
        assert!(resolve_item(item).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_client_resolves_to_none() {
        let client = MediaClient::new(None);
        assert!(client.get_by_id("abc123").await.is_none());
    }
}
