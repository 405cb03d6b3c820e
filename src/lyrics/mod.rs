//! Lyrics lookup across remote sources.
//!
//! Sources implement [`LyricsSource`] and are tried strictly in order:
//! Genius first when a token is configured, lyrics.ovh as the free
//! fallback. The first non-empty hit wins and later sources are never
//! queried.

pub mod clean;
pub mod genius;
pub mod ovh;

pub use clean::{CleanRules, normalize};

use async_trait::async_trait;
use tracing::{debug, warn};

pub(crate) const USER_AGENT: &str = concat!("verse/", env!("CARGO_PKG_VERSION"));

/// Lookup failure from a single source.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{provider} request failed: {reason}")]
    Request {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider} returned a malformed response: {reason}")]
    Parse {
        provider: &'static str,
        reason: String,
    },
}

impl LookupError {
    fn request(provider: &'static str, err: reqwest::Error) -> Self {
        Self::Request {
            provider,
            reason: err.to_string(),
        }
    }

    fn parse(provider: &'static str, err: reqwest::Error) -> Self {
        Self::Parse {
            provider,
            reason: err.to_string(),
        }
    }
}

/// A single remote lyrics service queried by (title, artist).
#[async_trait]
pub trait LyricsSource: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Fetch raw lyrics text. `Ok(None)` means the source answered with
    /// "no lyrics for this track"; `Err` is a transport or parse failure.
    async fn lookup(&self, title: &str, artist: &str) -> Result<Option<String>, LookupError>;
}

/// Outcome of a full resolver pass for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { text: String, source: &'static str },
    NotFound,
}

/// Settings for [`Resolver::new`]. Built by the caller; the resolver never
/// reads the environment itself.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Genius API token; enables the Genius source when present.
    pub genius_token: Option<String>,
}

/// Ordered chain of lyrics sources.
pub struct Resolver {
    sources: Vec<Box<dyn LyricsSource>>,
}

impl Resolver {
    pub fn new(cfg: &ResolverConfig) -> Self {
        let mut sources: Vec<Box<dyn LyricsSource>> = Vec::new();
        match &cfg.genius_token {
            Some(token) => sources.push(Box::new(genius::GeniusClient::new(token.clone()))),
            None => debug!("no Genius token configured; fallback source only"),
        }
        sources.push(Box::new(ovh::OvhClient::new()));
        Self { sources }
    }

    /// Build a resolver over an explicit source list. This is the seam for
    /// tests and the extension point for additional services.
    pub fn from_sources(sources: Vec<Box<dyn LyricsSource>>) -> Self {
        Self { sources }
    }

    /// Query each source in order until one returns lyrics.
    ///
    /// A failing source is skipped unless it is the last in the chain, in
    /// which case its error becomes the resolver's error.
    pub async fn resolve(&self, title: &str, artist: &str) -> Result<Resolution, LookupError> {
        for (index, source) in self.sources.iter().enumerate() {
            debug!(source = source.name(), title, artist, "querying lyrics source");
            match source.lookup(title, artist).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    return Ok(Resolution::Found {
                        text,
                        source: source.name(),
                    });
                }
                Ok(_) => debug!(source = source.name(), "no lyrics for this track"),
                Err(err) if index + 1 == self.sources.len() => return Err(err),
                Err(err) => {
                    warn!(source = source.name(), error = %err, "source failed; trying next")
                }
            }
        }
        Ok(Resolution::NotFound)
    }
}
