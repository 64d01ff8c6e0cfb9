use crate::error::{FarmError, Result};
use crate::farm::parser;
use crate::model::{PlatformIndex, StatusSnapshot};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_INDEX_URL: &str = "http://api.mynonpublic.com/content.json";

// Fail fast on the commonly-timing-out public endpoint while tolerating
// normal server latency.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(3050);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// HTTP layer for the build farm: one bounded-timeout GET per call, no
/// retries, no caching.
#[derive(Debug, Clone)]
pub struct FarmClient {
    http: reqwest::Client,
    index_url: String,
}

impl Default for FarmClient {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_URL)
    }
}

impl FarmClient {
    pub fn new(index_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            index_url: index_url.into(),
        }
    }

    /// Loads the JSON platform index and derives the platform and
    /// architecture lists.
    pub async fn load_index(&self) -> Result<PlatformIndex> {
        tracing::debug!("loading platform index from {}", self.index_url);
        let body = self.get_text(&self.index_url).await?;
        parse_index(&body)
    }

    /// Retrieves one platform's raw HTML status page. Pure I/O; no
    /// interpretation of the payload.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        tracing::debug!("fetching status page {url}");
        self.get_text(url).await
    }

    /// Fetches and parses the status page of a named platform.
    pub async fn build_infos(
        &self,
        index: &PlatformIndex,
        platform: &str,
    ) -> Result<StatusSnapshot> {
        let url = index
            .url_for(platform)
            .ok_or_else(|| FarmError::UnknownPlatform(platform.to_string()))?;
        let html = self.fetch_page(url).await?;
        Ok(parser::parse_status_page(&html))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        if body.is_empty() {
            return Err(FarmError::Data(format!("empty response from {url}")));
        }
        Ok(body)
    }
}

#[derive(Deserialize)]
struct IndexDoc {
    versionurls: HashMap<String, PlatformUrl>,
}

#[derive(Deserialize)]
struct PlatformUrl {
    url: String,
}

/// Split out from the fetch so malformed bodies are testable offline.
/// A missing `versionurls` key is a data error; an empty-but-present map is
/// a valid empty index.
pub fn parse_index(body: &str) -> Result<PlatformIndex> {
    let doc: IndexDoc = serde_json::from_str(body)
        .map_err(|e| FarmError::Data(format!("bad platform index: {e}")))?;
    let urls = doc
        .versionurls
        .into_iter()
        .map(|(name, platform)| (name, platform.url))
        .collect();
    Ok(PlatformIndex::new(urls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_index_extracts_urls() {
        let body = r#"{"versionurls": {
            "ARM box A": {"url": "http://farm.example/arm-a"},
            "MIPS box": {"url": "http://farm.example/mips"}
        }}"#;
        let index = parse_index(body).unwrap();
        assert_eq!(index.platforms(), ["ARM box A", "MIPS box"]);
        assert_eq!(index.url_for("MIPS box"), Some("http://farm.example/mips"));
    }

    #[test]
    fn parse_index_empty_map_is_valid() {
        let index = parse_index(r#"{"versionurls": {}}"#).unwrap();
        assert!(index.is_empty());
        assert!(index.architectures().is_empty());
    }

    #[test]
    fn parse_index_missing_key_is_data_error() {
        let err = parse_index(r#"{"something": {}}"#).unwrap_err();
        assert!(matches!(err, FarmError::Data(_)));
    }

    #[test]
    fn parse_index_invalid_json_is_data_error() {
        let err = parse_index("not json").unwrap_err();
        assert!(matches!(err, FarmError::Data(_)));
    }

    #[test]
    fn parse_index_entry_without_url_is_data_error() {
        let err = parse_index(r#"{"versionurls": {"ARM box A": {}}}"#).unwrap_err();
        assert!(matches!(err, FarmError::Data(_)));
    }
}
