mod sse;

use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;

use speech_core::{GenerateContentResponse, GenerateRequest, ResponseStream, SpeechBackend};

pub use sse::SseDecoder;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `streamGenerateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY` and, optionally, `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .context("GEMINI_API_KEY must be set in the environment")?;
        let base_url = env::var("GEMINI_BASE_URL").ok().filter(|u| !u.trim().is_empty());
        Ok(Self::new(&api_key, base_url.as_deref()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }
}

fn parse_event(payload: &str) -> Result<GenerateContentResponse> {
    serde_json::from_str(payload)
        .with_context(|| format!("Malformed stream event: {}", truncate(payload, 200)))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl SpeechBackend for GeminiClient {
    async fn generate_stream(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<ResponseStream> {
        let url = self.stream_url(model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API returned {}: {}", status, body.trim());
        }

        let stream = async_stream::stream! {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(anyhow::Error::new(e).context("Gemini response stream failed"));
                        return;
                    }
                };
                for payload in decoder.feed(&chunk) {
                    yield parse_event(&payload);
                }
            }
            for payload in decoder.finish() {
                yield parse_event(&payload);
            }
        };

        Ok(Box::pin(stream))
    }
}
