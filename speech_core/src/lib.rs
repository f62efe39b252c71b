mod backend;
mod request;
mod stream;
mod usage_log;
mod voices;
mod wav;

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

pub use backend::{ResponseStream, SpeechBackend};
pub use request::{
    BuiltRequest, Content, GenerateRequest, GenerationConfig, MultiSpeakerVoiceConfig, Part,
    PrebuiltVoiceConfig, SpeakerAssignment, SpeakerSlot, SpeakerVoiceConfig, SpeechConfig,
    SpeechRequestBuilder, VoiceConfig, TEMPERATURE,
};
pub use stream::{
    collect_audio, AudioAccumulator, AudioChunk, Candidate, GenerateContentResponse, InlineData,
    ResponseContent, ResponsePart,
};
pub use usage_log::{FileUsageLog, NoopUsageLog, UsageLog, UsageRecord};
pub use voices::{catalog, select_voices, voice_names, VoiceInfo, CATALOG_SIZE};
pub use wav::{
    frame_audio, parse_audio_mime, wrap_pcm, AudioMimeDescriptor, FramedAudio, WAV_HEADER_LEN,
    WAV_MIME,
};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Result of one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedAudio {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Voice per speaker, in speaker order.
    pub voices: Vec<String>,
}

/// Ties voice selection, the generation backend and WAV framing together.
#[derive(Clone)]
pub struct SpeechManager {
    backend: Arc<dyn SpeechBackend>,
    builder: SpeechRequestBuilder,
    model: String,
}

impl SpeechManager {
    pub fn new(backend: Arc<dyn SpeechBackend>, builder: SpeechRequestBuilder, model: &str) -> Self {
        Self {
            backend,
            builder,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn list_voices(&self) -> Vec<VoiceInfo> {
        catalog()
    }

    /// Turn a script into a playable WAV.
    ///
    /// Upstream failures are returned as-is; there is no retry.
    pub async fn generate_audio(
        &self,
        script: &str,
        speaker_count: usize,
    ) -> anyhow::Result<GeneratedAudio> {
        // The usage log append is blocking file IO
        let built = tokio::task::spawn_blocking({
            let builder = self.builder.clone();
            let script = script.to_string();
            move || builder.build(&script, speaker_count)
        })
        .await
        .context("Request builder task failed")?;
        self.generate_built(built).await
    }

    /// Same as [`generate_audio`](Self::generate_audio) for an already built request.
    pub async fn generate_built(&self, built: BuiltRequest) -> anyhow::Result<GeneratedAudio> {
        let voices = built.voice_names();
        let stream = self
            .backend
            .generate_stream(&self.model, &built.request)
            .await
            .with_context(|| format!("Generation request to {} failed", self.model))?;
        let framed = collect_audio(stream).await?;

        info!(
            "Generated {} bytes of {} with {} voice(s)",
            framed.bytes.len(),
            framed.mime_type,
            voices.len()
        );

        Ok(GeneratedAudio {
            bytes: framed.bytes,
            mime_type: framed.mime_type,
            voices,
        })
    }
}
