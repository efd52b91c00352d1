//! Automatic accenter implementations
//!
//! - [`DictionaryAccenter`]: local lexicon of word -> accented form
//! - [`HttpAccenter`]: sidecar service over HTTP/JSON
//!
//! Both only mark words that do not already carry an accent. Placeholders
//! handed in by the frontend are not letters and pass through untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use voice_render_core::{Accenter, Error, Result};

use crate::accents::{has_accent_mark, override_key, tokenize, Token};
use crate::TextError;

/// Lexicon-backed accenter
pub struct DictionaryAccenter {
    lexicon: HashMap<String, String>,
}

impl DictionaryAccenter {
    pub fn new(lexicon: HashMap<String, String>) -> Self {
        let lexicon = lexicon
            .into_iter()
            .map(|(word, accented)| (override_key(&word), accented))
            .collect();
        Self { lexicon }
    }

    /// Load a JSON object file of word -> accented form
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, TextError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let lexicon: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| TextError::Lexicon(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), entries = lexicon.len(), "Accent lexicon loaded");
        Ok(Self::new(lexicon))
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    fn accent_sync(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 8);
        for token in tokenize(text) {
            match token {
                Token::Word(word) if !has_accent_mark(word) => {
                    match self.lexicon.get(&override_key(word)) {
                        Some(accented) => out.push_str(&match_initial_case(word, accented)),
                        None => out.push_str(word),
                    }
                }
                other => out.push_str(other.as_str()),
            }
        }
        out
    }
}

/// Carry an initial capital from `original` over to `accented`
fn match_initial_case(original: &str, accented: &str) -> String {
    let starts_upper = original.chars().next().map_or(false, char::is_uppercase);
    if !starts_upper {
        return accented.to_string();
    }
    let mut chars = accented.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Accenter for DictionaryAccenter {
    async fn accent(&self, text: &str) -> Result<String> {
        Ok(self.accent_sync(text))
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}

/// HTTP accenter configuration
#[derive(Debug, Clone)]
pub struct HttpAccenterConfig {
    /// Base URL (http://host:port)
    pub endpoint: String,
    pub timeout: Duration,
    pub cache_enabled: bool,
    pub cache_size: usize,
}

impl Default for HttpAccenterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8030".to_string(),
            timeout: Duration::from_secs(10),
            cache_enabled: true,
            cache_size: 1000,
        }
    }
}

/// Bounded cache of accented texts
struct AccentCache {
    entries: HashMap<String, String>,
    max_size: usize,
}

impl AccentCache {
    fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
        }
    }

    fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(String::as_str)
    }

    fn insert(&mut self, text: &str, accented: String) {
        // Simple eviction: clear half when full
        if self.entries.len() >= self.max_size {
            let keys_to_remove: Vec<_> = self
                .entries
                .keys()
                .take(self.max_size / 2 + 1)
                .cloned()
                .collect();
            for key in keys_to_remove {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(text.to_string(), accented);
    }
}

#[derive(Serialize)]
struct AccentRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AccentResponse {
    text: String,
}

/// Accenter sidecar client
///
/// API format:
/// POST {endpoint}/accent
/// { "text": "..." }
/// Response: { "text": "..." }
pub struct HttpAccenter {
    config: HttpAccenterConfig,
    client: reqwest::Client,
    cache: RwLock<AccentCache>,
}

impl HttpAccenter {
    pub fn new(config: HttpAccenterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Backend(format!("failed to build accenter client: {}", e)))?;
        let cache = RwLock::new(AccentCache::new(config.cache_size.max(1)));
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    async fn call_service(&self, text: &str) -> Result<String> {
        let url = format!("{}/accent", self.config.endpoint.trim_end_matches('/'));
        tracing::debug!(endpoint = %self.config.endpoint, text_len = text.len(), "Accenter service called");

        let response = self
            .client
            .post(&url)
            .json(&AccentRequest { text })
            .send()
            .await
            .map_err(|e| Error::Backend(format!("accenter request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Backend(format!(
                "accenter returned {}",
                response.status()
            )));
        }

        let body: AccentResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("accenter response malformed: {}", e)))?;
        Ok(body.text)
    }
}

#[async_trait]
impl Accenter for HttpAccenter {
    async fn accent(&self, text: &str) -> Result<String> {
        if self.config.cache_enabled {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(text) {
                tracing::trace!("Accent cache hit");
                return Ok(cached.to_string());
            }
        }

        let accented = self.call_service(text).await?;

        if self.config.cache_enabled {
            self.cache.write().await.insert(text, accented.clone());
        }
        Ok(accented)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> DictionaryAccenter {
        DictionaryAccenter::new(
            [("замок", "замо\u{301}к"), ("Мука", "му\u{301}ка")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_dictionary_marks_known_words() {
        let accenter = lexicon();
        let out = accenter.accent("замок и мука, хлеб").await.unwrap();
        assert_eq!(out, "замо\u{301}к и му\u{301}ка, хлеб");
    }

    #[tokio::test]
    async fn test_dictionary_keeps_initial_capital() {
        let out = lexicon().accent("Замок").await.unwrap();
        assert_eq!(out, "Замо\u{301}к");
    }

    #[tokio::test]
    async fn test_dictionary_skips_marked_words() {
        let out = lexicon().accent("за\u{301}мок").await.unwrap();
        assert_eq!(out, "за\u{301}мок");
    }

    #[test]
    fn test_dictionary_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, r#"{"мука": "му\u0301ка"}"#).unwrap();
        let accenter = DictionaryAccenter::from_file(&path).unwrap();
        assert_eq!(accenter.len(), 1);

        std::fs::write(&path, "oops").unwrap();
        assert!(matches!(
            DictionaryAccenter::from_file(&path),
            Err(TextError::Lexicon(_))
        ));
    }

    #[test]
    fn test_cache_eviction_bounds_size() {
        let mut cache = AccentCache::new(4);
        for i in 0..10 {
            cache.insert(&format!("text{}", i), format!("accented{}", i));
            assert!(cache.entries.len() <= 4);
        }
        assert_eq!(cache.get("text9"), Some("accented9"));
    }

    #[tokio::test]
    async fn test_http_unreachable_is_backend_error() {
        let accenter = HttpAccenter::new(HttpAccenterConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();
        let err = accenter.accent("текст").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}
