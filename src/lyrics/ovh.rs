//! lyrics.ovh API client
//!
//! Free lyrics lookup keyed by (artist, title), no authentication.
//! API: https://lyrics.ovh

use async_trait::async_trait;
use serde::Deserialize;

use super::{LookupError, LyricsSource};

#[derive(Debug, Deserialize)]
struct OvhResponse {
    lyrics: Option<String>,
}

/// lyrics.ovh API client
#[derive(Debug, Clone)]
pub struct OvhClient {
    client: reqwest::Client,
    base_url: String,
}

impl OvhClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.lyrics.ovh";

    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(super::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for OvhClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LyricsSource for OvhClient {
    fn name(&self) -> &'static str {
        "lyrics.ovh"
    }

    async fn lookup(&self, title: &str, artist: &str) -> Result<Option<String>, LookupError> {
        let url = format!(
            "{}/v1/{}/{}",
            self.base_url,
            urlencoding::encode(artist),
            urlencoding::encode(title)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| LookupError::request(self.name(), err))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Status {
                provider: self.name(),
                status: response.status().as_u16(),
            });
        }

        let body: OvhResponse = response
            .json()
            .await
            .map_err(|err| LookupError::parse(self.name(), err))?;
        Ok(body.lyrics.filter(|text| !text.trim().is_empty()))
    }
}
