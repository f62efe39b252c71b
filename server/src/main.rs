use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use gemini_core::GeminiClient;
use server::{build_app, config::ServerConfig, AppState};
use speech_core::{FileUsageLog, NoopUsageLog, SpeechManager, SpeechRequestBuilder, UsageLog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting Sonify server...");

    let config = ServerConfig::from_env();
    let backend = Arc::new(GeminiClient::from_env()?);

    let usage_log: Arc<dyn UsageLog> = match config.usage_log_path {
        Some(ref path) => {
            info!("Recording usage to {}", path.display());
            Arc::new(FileUsageLog::new(path))
        }
        None => {
            info!("USAGE_LOG_PATH empty, usage log disabled");
            Arc::new(NoopUsageLog)
        }
    };

    let speech = SpeechManager::new(backend, SpeechRequestBuilder::new(usage_log), &config.model);
    let state = AppState::new(speech, config.clone());
    state.store.ensure_dir().await?;

    info!(
        "Server configuration loaded: port={}, model={}, audio_dir={}, rate_limit={}/min",
        config.port,
        config.model,
        config.audio_dir.display(),
        config.rate_limit_per_minute
    );

    let app = build_app(state)?;

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
