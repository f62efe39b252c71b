pub mod config;
pub mod error;
pub mod pages;
pub mod speakers;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use speech_core::{SpeechManager, VoiceInfo, CATALOG_SIZE};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::pages::{render_form, AudioView, FormView, FORM_SCRIPT, SCRIPT_PATH};
use crate::speakers::{detect_speaker_count, speaker_template};
use crate::storage::AudioStore;
use crate::validation::{parse_speaker_count, validate_filename, validate_script, EMPTY_SCRIPT_MESSAGE};

#[derive(Clone)]
pub struct AppState {
    pub speech: Arc<SpeechManager>,
    pub store: AudioStore,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(speech: SpeechManager, config: ServerConfig) -> Self {
        Self {
            speech: Arc::new(speech),
            store: AudioStore::new(&config.audio_dir),
            config,
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    script: String,
    num_speakers: Option<String>,
}

#[derive(Deserialize)]
pub struct IndexQuery {
    num_speakers: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateJson {
    script: String,
    num_speakers: Option<usize>,
}

/// A generated file as stored on disk.
#[derive(Debug, Serialize)]
pub struct StoredAudio {
    pub filename: String,
    pub audio_url: String,
    pub download_url: String,
    pub mime_type: String,
    pub voices: Vec<String>,
    pub size_bytes: usize,
}

/// Build the full application: routes, middleware and state.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();

    let cors = cors_layer(&config);

    // Global limit: every client shares the same bucket
    let period_ms = (60_000 / u64::from(config.rate_limit_per_minute.max(1))).max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(period_ms)
            .burst_size(config.rate_limit_per_minute.max(1))
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .into_inner();

    let app = Router::new()
        .route("/", get(index_page).post(submit_form))
        .route("/api/generate", post(generate_json))
        .route("/audio/{filename}", get(play_audio))
        .route("/download/{filename}", get(download_audio))
        .route(SCRIPT_PATH, get(form_script))
        .route("/health", get(health_check))
        .route("/voices", get(list_voices))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state);

    Ok(app)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false);

    match config.cors_allowed_origins {
        Some(ref allowed) => {
            let origins: Vec<HeaderValue> = allowed
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect();
            if origins.is_empty() {
                warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
                base.allow_origin(tower_http::cors::Any)
            } else {
                info!("CORS configured for {} origin(s)", origins.len());
                base.allow_origin(tower_http::cors::AllowOrigin::list(origins))
            }
        }
        None => {
            warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
            base.allow_origin(tower_http::cors::Any)
        }
    }
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(ref value) = header_value {
        request.headers_mut().insert("x-request-id", value.clone());
    }
    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_voices(State(state): State<AppState>) -> Json<Vec<VoiceInfo>> {
    Json(state.speech.list_voices())
}

/// Empty form with the script prefilled for the requested speaker count.
pub async fn index_page(Query(query): Query<IndexQuery>) -> Html<String> {
    let num_speakers = parse_speaker_count(query.num_speakers.as_deref())
        .unwrap_or(1)
        .min(CATALOG_SIZE);
    let template = speaker_template(num_speakers);
    Html(render_form(&FormView {
        script: &template,
        num_speakers,
        ..FormView::default()
    }))
}

pub async fn form_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        FORM_SCRIPT,
    )
}

/// Without an explicit count the highest `Speaker N:` label decides, else one speaker.
fn resolve_speaker_count(explicit: Option<usize>, script: &str) -> usize {
    explicit
        .or_else(|| detect_speaker_count(script))
        .unwrap_or(1)
}

// Filesystem details stay in the log, clients get a generic message
fn storage_error(e: anyhow::Error) -> ApiError {
    tracing::error!("Audio storage error: {:#}", e);
    ApiError::InternalError("Failed to access stored audio".to_string())
}

/// Generate audio for a script and persist it under a fresh name.
async fn generate_and_store(
    state: &AppState,
    script: &str,
    num_speakers: usize,
) -> Result<StoredAudio, ApiError> {
    info!(
        "Generation request: {} characters, {} speaker(s)",
        script.chars().count(),
        num_speakers
    );

    let audio = state.speech.generate_audio(script, num_speakers).await?;

    let filename = state
        .store
        .save(&audio.bytes)
        .await
        .map_err(storage_error)?;
    info!("Saved {} ({} bytes)", filename, audio.bytes.len());

    Ok(StoredAudio {
        audio_url: format!("/audio/{filename}"),
        download_url: format!("/download/{filename}"),
        filename,
        mime_type: audio.mime_type,
        voices: audio.voices,
        size_bytes: audio.bytes.len(),
    })
}

pub async fn submit_form(State(state): State<AppState>, Form(form): Form<GenerateForm>) -> Response {
    let raw_script = form.script.trim();

    let explicit = form
        .num_speakers
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let num_speakers = match explicit.map(|v| parse_speaker_count(Some(v))).transpose() {
        Ok(n) => resolve_speaker_count(n, raw_script),
        Err(e) => {
            let message = e.to_string();
            let page = render_form(&FormView {
                script: raw_script,
                num_speakers: 1,
                error: Some(&message),
                audio: None,
            });
            return (StatusCode::BAD_REQUEST, Html(page)).into_response();
        }
    };

    let script = match validate_script(raw_script) {
        Ok(script) => script,
        Err(e) => {
            let message = match e {
                ApiError::InvalidInput(msg) => msg,
                other => other.to_string(),
            };
            // An empty script re-renders the form without failing the request
            let status = if message == EMPTY_SCRIPT_MESSAGE {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            let page = render_form(&FormView {
                script: raw_script,
                num_speakers,
                error: Some(&message),
                audio: None,
            });
            return (status, Html(page)).into_response();
        }
    };

    match generate_and_store(&state, script, num_speakers).await {
        Ok(stored) => Html(render_form(&FormView {
            script,
            num_speakers,
            error: None,
            audio: Some(AudioView {
                audio_url: &stored.audio_url,
                download_url: &stored.download_url,
                voices: &stored.voices,
            }),
        }))
        .into_response(),
        Err(e) => {
            let status = e.status_code();
            if let ApiError::Generation(ref inner) = e {
                tracing::error!("Generation error: {:#}", inner);
            }
            let message = e.to_string();
            let page = render_form(&FormView {
                script,
                num_speakers,
                error: Some(&message),
                audio: None,
            });
            (status, Html(page)).into_response()
        }
    }
}

pub async fn generate_json(
    State(state): State<AppState>,
    Json(req): Json<GenerateJson>,
) -> Result<Json<StoredAudio>, ApiError> {
    let script = validate_script(&req.script)?;
    let num_speakers = resolve_speaker_count(req.num_speakers, script);
    if num_speakers < 1 {
        return Err(ApiError::InvalidInput(
            "Number of speakers must be at least 1".to_string(),
        ));
    }
    let stored = generate_and_store(&state, script, num_speakers).await?;
    Ok(Json(stored))
}

async fn serve_audio(state: &AppState, filename: &str, disposition: &str) -> Result<Response, ApiError> {
    validate_filename(filename)?;
    let bytes = state
        .store
        .load(filename)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{disposition}; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub async fn play_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_audio(&state, &filename, "inline").await
}

pub async fn download_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_audio(&state, &filename, "attachment").await
}
