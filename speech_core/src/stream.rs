//! Streaming response handling.
//!
//! The generation API answers with a sequence of partial responses. Each one
//! may carry a piece of inline audio (base64) in the first part of the first
//! candidate. Pieces are concatenated in arrival order and framed once the
//! stream ends.

use base64::{engine::general_purpose, Engine as _};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::wav::{frame_audio, FramedAudio};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64-encoded payload.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub inline_data: Option<InlineData>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One element of a `streamGenerateContent` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

/// Decoded audio bytes plus the MIME type they were declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

impl GenerateContentResponse {
    /// Audio carried by this response, if any.
    pub fn audio_chunk(&self) -> Option<AudioChunk> {
        let part = self
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?;
        let inline = part.inline_data.as_ref()?;
        let encoded = inline.data.as_deref().filter(|d| !d.is_empty())?;

        match general_purpose::STANDARD.decode(encoded) {
            Ok(data) if !data.is_empty() => Some(AudioChunk {
                data,
                mime_type: inline.mime_type.clone(),
            }),
            Ok(_) => None,
            Err(e) => {
                debug!("Skipping chunk with undecodable inline data: {e}");
                None
            }
        }
    }
}

/// Accumulates audio chunks and latches the first declared MIME type.
#[derive(Debug, Default)]
pub struct AudioAccumulator {
    buffer: Vec<u8>,
    mime_type: Option<String>,
    chunks: usize,
}

impl AudioAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: AudioChunk) {
        if self.mime_type.is_none() {
            self.mime_type = chunk.mime_type.filter(|m| !m.is_empty());
        }
        self.buffer.extend_from_slice(&chunk.data);
        self.chunks += 1;
    }

    /// Feed a raw response; responses without audio are skipped.
    pub fn push_response(&mut self, response: &GenerateContentResponse) {
        match response.audio_chunk() {
            Some(chunk) => self.push(chunk),
            None => debug!("Skipping response without inline audio"),
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn finish(self) -> FramedAudio {
        frame_audio(self.buffer, self.mime_type.as_deref())
    }
}

/// Drain a response stream in order and frame the result.
///
/// The first upstream error aborts the whole call.
pub async fn collect_audio<S>(stream: S) -> anyhow::Result<FramedAudio>
where
    S: Stream<Item = anyhow::Result<GenerateContentResponse>>,
{
    futures::pin_mut!(stream);
    let mut acc = AudioAccumulator::new();
    while let Some(response) = stream.next().await {
        acc.push_response(&response?);
    }
    debug!(
        "Stream ended: {} audio chunk(s), {} bytes, mime={:?}",
        acc.chunk_count(),
        acc.len(),
        acc.mime_type()
    );
    Ok(acc.finish())
}
