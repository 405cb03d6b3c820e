//! Genius API client
//!
//! Genius exposes search over its catalogue but not lyrics bodies, so the
//! matching song's public page is fetched and the lyrics containers are
//! extracted from its HTML.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::{LookupError, LyricsSource};

static LYRICS_CONTAINER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[data-lyrics-container="true"]"#).expect("lyrics container selector")
});

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: SongResult,
}

#[derive(Debug, Deserialize)]
struct SongResult {
    url: String,
}

/// Genius API client
#[derive(Debug, Clone)]
pub struct GeniusClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GeniusClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.genius.com";

    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(super::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            token,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Search the catalogue and return the best hit's song page URL.
    async fn search_song_url(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, LookupError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", format!("{title} {artist}"))])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| LookupError::request(self.name(), err))?;

        if !response.status().is_success() {
            return Err(LookupError::Status {
                provider: self.name(),
                status: response.status().as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| LookupError::parse(self.name(), err))?;
        Ok(pick_song_url(body.response.hits))
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>, LookupError> {
        let response = self
            .client
            .get(url)
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

        let html = response
            .text()
            .await
            .map_err(|err| LookupError::parse(self.name(), err))?;
        Ok(Some(html))
    }
}

#[async_trait]
impl LyricsSource for GeniusClient {
    fn name(&self) -> &'static str {
        "genius"
    }

    async fn lookup(&self, title: &str, artist: &str) -> Result<Option<String>, LookupError> {
        let Some(url) = self.search_song_url(title, artist).await? else {
            return Ok(None);
        };
        let Some(page) = self.fetch_page(&url).await? else {
            return Ok(None);
        };
        Ok(extract_lyrics(&page))
    }
}

/// Search also returns annotations and articles; song pages all end in
/// "-lyrics".
fn pick_song_url(hits: Vec<SearchHit>) -> Option<String> {
    hits.into_iter()
        .map(|hit| hit.result.url)
        .find(|url| url.ends_with("-lyrics"))
}

/// Pull lyrics text out of a Genius song page.
///
/// Lyrics live in one or more `div[data-lyrics-container]` blocks with
/// `<br>` line breaks; formatting spans are flattened to their text.
fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let mut text = String::new();
    for container in document.select(&LYRICS_CONTAINER) {
        for node in container.descendants() {
            match node.value() {
                scraper::Node::Text(chunk) => text.push_str(chunk),
                scraper::Node::Element(element) if element.name() == "br" => text.push('\n'),
                _ => {}
            }
        }
        text.push('\n');
    }

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            result: SongResult {
                url: url.to_string(),
            },
        }
    }

    #[test]
    fn picks_first_song_hit() {
        let hits = vec![
            hit("https://genius.com/articles/best-of-2024"),
            hit("https://genius.com/John-lennon-imagine-lyrics"),
            hit("https://genius.com/John-lennon-imagine-live-lyrics"),
        ];
        assert_eq!(
            pick_song_url(hits).as_deref(),
            Some("https://genius.com/John-lennon-imagine-lyrics")
        );
    }

    #[test]
    fn no_song_hit_yields_none() {
        assert_eq!(pick_song_url(Vec::new()), None);
        assert_eq!(
            pick_song_url(vec![hit("https://genius.com/articles/best-of-2024")]),
            None
        );
    }

    #[test]
    fn extracts_text_from_lyrics_containers() {
        let html = r#"<html><body>
            <div data-lyrics-container="true">Imagine there's no heaven<br/><i>It's easy if you try</i></div>
            <div class="ad">Buy the album</div>
            <div data-lyrics-container="true">No hell below us</div>
        </body></html>"#;
        assert_eq!(
            extract_lyrics(html).as_deref(),
            Some("Imagine there's no heaven\nIt's easy if you try\nNo hell below us")
        );
    }

    #[test]
    fn page_without_containers_yields_none() {
        assert_eq!(extract_lyrics("<html><body><p>404</p></body></html>"), None);
    }
}
