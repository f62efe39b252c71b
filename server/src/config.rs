// Configuration for the server, read from the environment

use std::{path::PathBuf, time::Duration};

use speech_core::DEFAULT_MODEL;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub model: String,
    pub static_dir: PathBuf,
    pub audio_dir: PathBuf,
    /// `None` disables the usage log file.
    pub usage_log_path: Option<PathBuf>,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            model: DEFAULT_MODEL.to_string(),
            static_dir: PathBuf::from("static"),
            audio_dir: PathBuf::from("static/audio"),
            usage_log_path: Some(PathBuf::from("usage_logs.txt")),
            rate_limit_per_minute: 60,
            request_timeout_secs: 300,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let model = std::env::var("GEMINI_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model);

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let audio_dir = std::env::var("AUDIO_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| static_dir.join("audio"));

        // An explicitly empty value turns the usage log off.
        let usage_log_path = match std::env::var("USAGE_LOG_PATH") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => defaults.usage_log_path,
        };

        let rate_limit_per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &u32| *v > 0)
            .unwrap_or(defaults.rate_limit_per_minute);

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

        Self {
            port,
            model,
            static_dir,
            audio_dir,
            usage_log_path,
            rate_limit_per_minute,
            request_timeout_secs,
            cors_allowed_origins,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
