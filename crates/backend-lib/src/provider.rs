// ============================
// crates/backend-lib/src/provider.rs
// ============================
//! Client for the external video catalog that expands playlist references.
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderSettings;
use crate::error::AppError;

/// Expands a provider list id into playable links, in provider order
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    async fn expand(&self, list_id: &str) -> Result<Vec<String>, AppError>;
}

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
/// Page size cap enforced by the playlistItems endpoint
const PAGE_SIZE: usize = 50;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ItemsPage {
    #[serde(default)]
    items: Vec<PageItem>,
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageItem {
    content_details: ContentDetails,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    video_id: String,
}

fn watch_link(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}

/// YouTube Data API `playlistItems` client
#[derive(Clone)]
pub struct YouTubeProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_items: usize,
}

impl YouTubeProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            max_items: settings.max_items,
        })
    }

    async fn fetch_page(
        &self,
        list_id: &str,
        api_key: &str,
        page_token: Option<&str>,
    ) -> Result<ItemsPage, AppError> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "contentDetails"),
            ("playlistId", list_id),
            ("maxResults", page_size.as_str()),
            ("key", api_key),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("provider request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "provider responded with {status}"
            )));
        }

        response
            .json::<ItemsPage>()
            .await
            .map_err(|e| AppError::ExternalService(format!("unreadable provider response: {e}")))
    }
}

#[async_trait]
impl PlaylistProvider for YouTubeProvider {
    async fn expand(&self, list_id: &str) -> Result<Vec<String>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalService("provider api key is not configured".to_string()))?;

        let mut links = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(list_id, api_key, page_token.as_deref()).await?;
            links.extend(
                page.items
                    .iter()
                    .map(|item| watch_link(&item.content_details.video_id)),
            );

            match page.next_page_token {
                Some(token) if links.len() < self.max_items => page_token = Some(token),
                _ => break,
            }
        }

        links.truncate(self.max_items);
        tracing::debug!(list_id, count = links.len(), "expanded provider playlist");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_page() {
        let body = r#"{
            "kind": "youtube#playlistItemListResponse",
            "nextPageToken": "CAUQAA",
            "items": [
                {"contentDetails": {"videoId": "dQw4w9WgXcQ", "videoPublishedAt": "2009-10-25T06:57:33Z"}},
                {"contentDetails": {"videoId": "9bZkp7q19f0"}}
            ]
        }"#;
        let page: ItemsPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        let links: Vec<_> = page
            .items
            .iter()
            .map(|i| watch_link(&i.content_details.video_id))
            .collect();
        assert_eq!(
            links,
            [
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "https://www.youtube.com/watch?v=9bZkp7q19f0"
            ]
        );
    }

    #[test]
    fn test_parse_last_page() {
        let page: ItemsPage = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_external_error() {
        let settings = ProviderSettings {
            api_key: None,
            ..ProviderSettings::default()
        };
        let provider = YouTubeProvider::new(&settings).unwrap();
        let err = provider.expand("PL123").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalService(_)));
    }
}
