//! Request construction for the generation API.
//!
//! The types below serialize to the JSON body the API expects
//! (`contents` + `generationConfig`), so adapters can post them as-is.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::usage_log::{UsageLog, UsageRecord};
use crate::voices::select_voices;

/// High randomness, matching what the TTS models are tuned for.
pub const TEMPERATURE: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.to_string() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

impl VoiceConfig {
    pub fn prebuilt(voice: &str) -> Self {
        Self {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerVoiceConfig {
    pub speaker: String,
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiSpeakerVoiceConfig {
    pub speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

/// Exactly one of the two fields is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_speaker_voice_config: Option<MultiSpeakerVoiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// One speaker slot bound to a voice. `index` is 1-based.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SpeakerSlot {
    pub index: usize,
    pub voice: String,
}

impl SpeakerSlot {
    pub fn label(&self) -> String {
        format!("Speaker {}", self.index)
    }
}

pub type SpeakerAssignment = Vec<SpeakerSlot>;

#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub assignment: SpeakerAssignment,
    pub request: GenerateRequest,
    /// False when the usage log rejected the record.
    pub usage_logged: bool,
}

impl BuiltRequest {
    pub fn voice_names(&self) -> Vec<String> {
        self.assignment.iter().map(|s| s.voice.clone()).collect()
    }
}

/// Picks voices for a script and produces the generation request.
#[derive(Clone)]
pub struct SpeechRequestBuilder {
    usage_log: Arc<dyn UsageLog>,
}

impl SpeechRequestBuilder {
    pub fn new(usage_log: Arc<dyn UsageLog>) -> Self {
        Self { usage_log }
    }

    pub fn build(&self, script: &str, speaker_count: usize) -> BuiltRequest {
        self.build_with_rng(script, speaker_count, &mut rand::thread_rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        script: &str,
        speaker_count: usize,
        rng: &mut R,
    ) -> BuiltRequest {
        let voices = select_voices(rng, speaker_count);
        info!(
            "Selected voices for {} speaker(s): {}",
            speaker_count,
            voices.join(", ")
        );

        let usage_logged = match self
            .usage_log
            .record(&UsageRecord::new(script, speaker_count, &voices))
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write usage log: {e:#}");
                false
            }
        };

        let assignment: SpeakerAssignment = voices
            .iter()
            .enumerate()
            .map(|(i, voice)| SpeakerSlot {
                index: i + 1,
                voice: voice.to_string(),
            })
            .collect();

        let speech_config = if speaker_count <= 1 {
            SpeechConfig {
                voice_config: Some(VoiceConfig::prebuilt(&assignment[0].voice)),
                multi_speaker_voice_config: None,
            }
        } else {
            SpeechConfig {
                voice_config: None,
                multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                    speaker_voice_configs: assignment
                        .iter()
                        .map(|slot| SpeakerVoiceConfig {
                            speaker: slot.label(),
                            voice_config: VoiceConfig::prebuilt(&slot.voice),
                        })
                        .collect(),
                }),
            }
        };

        let request = GenerateRequest {
            contents: vec![Content::user_text(script)],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_modalities: vec!["AUDIO".to_string()],
                speech_config,
            },
        };

        BuiltRequest {
            assignment,
            request,
            usage_logged,
        }
    }
}
