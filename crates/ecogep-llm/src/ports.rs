//! Model port definitions

use async_trait::async_trait;
use ecogep_core::error::Result;
use futures::Stream;
use std::pin::Pin;

use crate::upload::EncodedImage;

/// Incremental reply text. The stream ending is the completion event;
/// dropping it cancels the underlying request.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Port for the multimodal model that values a photo
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one image with an instruction and wait for the full reply text
    async fn analyze(&self, image: &EncodedImage, instruction: &str) -> Result<String>;

    /// Get the name/identifier of the model
    fn model_name(&self) -> &str;
}

/// Port for the chat model answering follow-up questions
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a streamed reply to a single user message
    async fn stream_reply(&self, prompt: &str) -> Result<ChunkStream>;

    /// Get the name/identifier of the model
    fn model_name(&self) -> &str;
}
