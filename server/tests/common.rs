//! Common utilities for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};

use server::{build_app, config::ServerConfig, AppState};
use speech_core::{
    FileUsageLog, GenerateContentResponse, GenerateRequest, ResponseStream, SpeechBackend,
    SpeechManager, SpeechRequestBuilder,
};

/// Backend that replays canned responses instead of calling the real API.
pub struct ScriptedBackend {
    responses: Vec<serde_json::Value>,
    failure: Option<String>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            responses: Vec::new(),
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    async fn generate_stream(
        &self,
        _model: &str,
        request: &GenerateRequest,
    ) -> anyhow::Result<ResponseStream> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(ref message) = self.failure {
            anyhow::bail!("{}", message);
        }
        let items: Vec<anyhow::Result<GenerateContentResponse>> = self
            .responses
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(anyhow::Error::from))
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// One streamed response carrying `bytes` of inline audio.
pub fn audio_chunk(mime: &str, bytes: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "inlineData": {
                        "mimeType": mime,
                        "data": general_purpose::STANDARD.encode(bytes)
                    }
                }]
            }
        }]
    })
}

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<ScriptedBackend>,
    pub root: PathBuf,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn usage_log(&self) -> String {
        std::fs::read_to_string(self.root.join("usage_logs.txt")).unwrap_or_default()
    }

    pub fn stored_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.config.audio_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Create a test app instance backed by `backend`, with its own temp directories
pub async fn create_test_app_with(backend: ScriptedBackend) -> TestApp {
    let root = std::env::temp_dir().join(format!("sonify_test_{}", uuid::Uuid::new_v4()));
    let config = ServerConfig {
        static_dir: root.join("static"),
        audio_dir: root.join("static").join("audio"),
        usage_log_path: Some(root.join("usage_logs.txt")),
        ..ServerConfig::default()
    };

    let backend = Arc::new(backend);
    let builder = SpeechRequestBuilder::new(Arc::new(FileUsageLog::new(root.join("usage_logs.txt"))));
    let speech = SpeechManager::new(backend.clone(), builder, &config.model);
    let state = AppState::new(speech, config.clone());
    state.store.ensure_dir().await.expect("create audio dir");

    TestApp {
        router: build_app(state).expect("build app"),
        backend,
        root,
        config,
    }
}

/// Test app whose backend streams a short 16-bit PCM clip
pub async fn create_test_app() -> TestApp {
    create_test_app_with(ScriptedBackend::new(vec![
        audio_chunk("audio/L16;rate=24000", &[0, 1, 0, 1, 0, 1]),
        audio_chunk("audio/L16;rate=24000", &[0, 1, 0, 1]),
    ]))
    .await
}
