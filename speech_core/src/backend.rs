use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::request::GenerateRequest;
use crate::stream::GenerateContentResponse;

/// Partial responses in emission order. Finite, not restartable.
pub type ResponseStream =
    Pin<Box<dyn Stream<Item = anyhow::Result<GenerateContentResponse>> + Send>>;

/// A generative speech API that streams its answer.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn generate_stream(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> anyhow::Result<ResponseStream>;
}
