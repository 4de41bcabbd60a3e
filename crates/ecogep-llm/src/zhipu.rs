use async_trait::async_trait;
use ecogep_core::config::LayeredConfig;
use ecogep_core::error::{GepError, Result};
use ecogep_core::models::ApiKey;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::ports::{ChatModel, ChunkStream, VisionModel};
use crate::sse::{SseDecoder, SseEvent};
use crate::upload::EncodedImage;

/// HTTP client for the Zhipu BigModel chat-completions API
#[derive(Clone)]
pub struct ZhipuClient {
    /// Base URL of the API (e.g., "https://open.bigmodel.cn/api/paas/v4")
    base_url: String,

    /// Session credential, sent as a bearer token
    api_key: ApiKey,

    /// HTTP client
    client: reqwest::Client,
}

impl ZhipuClient {
    /// Create a new client. `timeout` of `None` keeps the transport default.
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKey,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| GepError::Transport {
            reason: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self { base_url: base_url.into(), api_key, client })
    }

    /// Create from layered configuration
    pub fn from_config(config: &LayeredConfig, api_key: ApiKey) -> Result<Self> {
        Self::new(
            config.base_url.value.clone(),
            api_key,
            config.request_timeout_secs.value.map(Duration::from_secs),
        )
    }

    /// Vision adapter bound to a model name
    pub fn vision(&self, model: impl Into<String>) -> ZhipuVisionModel {
        ZhipuVisionModel { client: self.clone(), model: model.into() }
    }

    /// Chat adapter bound to a model name
    pub fn chat(&self, model: impl Into<String>) -> ZhipuChatModel {
        ZhipuChatModel { client: self.clone(), model: model.into() }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post(&self, request: &CompletionRequest<'_>) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| GepError::Transport { reason: describe_transport_error(&e) })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = request.model, "Hosted model rejected request");
            return Err(GepError::Api { status: status.as_u16(), body });
        }

        Ok(response)
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("could not connect: {}", err)
    } else {
        err.to_string()
    }
}

/// Multimodal model adapter (e.g. `glm-4v-plus`)
#[derive(Clone)]
pub struct ZhipuVisionModel {
    client: ZhipuClient,
    model: String,
}

#[async_trait]
impl VisionModel for ZhipuVisionModel {
    async fn analyze(&self, image: &EncodedImage, instruction: &str) -> Result<String> {
        let request = CompletionRequest::vision(&self.model, &image.base64, instruction);

        let started = Instant::now();
        tracing::info!(model = %self.model, jpeg_bytes = image.jpeg_len, "Requesting valuation");

        let response = self.client.post(&request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| GepError::Transport { reason: describe_transport_error(&e) })?;
        let content = extract_message_content(&body)?;

        tracing::info!(
            model = %self.model,
            reply_chars = content.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Valuation reply received"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Text chat adapter (e.g. `glm-4`) with streamed replies
#[derive(Clone)]
pub struct ZhipuChatModel {
    client: ZhipuClient,
    model: String,
}

#[async_trait]
impl ChatModel for ZhipuChatModel {
    async fn stream_reply(&self, prompt: &str) -> Result<ChunkStream> {
        let request = CompletionRequest::chat(&self.model, prompt);
        tracing::info!(model = %self.model, prompt_chars = prompt.chars().count(), "Starting streamed reply");

        let response = self.client.post(&request).await?;
        Ok(completion_chunks(response.bytes_stream()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Turn an SSE byte stream into text deltas.
///
/// A stream that closes without the `[DONE]` sentinel ends with a
/// `StreamInterrupted` error so callers never mistake a cut-off reply for a
/// complete one.
pub fn completion_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: futures::Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = ChunkState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        received_chars: 0,
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.feed(chunk.as_ref());
                    state.accept(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let err = state.interrupted(format!("connection error: {}", e));
                    return Some((Err(err), state));
                }
                None => {
                    let tail = state.decoder.finish();
                    state.accept(tail.into_iter().collect());
                    if !state.finished {
                        state.finished = true;
                        let err = state.interrupted("stream closed before [DONE]".to_string());
                        state.pending.push_back(Err(err));
                    }
                }
            }
        }
    });

    Box::pin(stream)
}

struct ChunkState<S> {
    bytes: std::pin::Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    received_chars: usize,
    finished: bool,
}

impl<S> ChunkState<S> {
    fn accept(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                break;
            }
            match event {
                SseEvent::Done => {
                    tracing::debug!(received_chars = self.received_chars, "Streamed reply complete");
                    self.finished = true;
                }
                SseEvent::Data(data) => match extract_delta_content(&data) {
                    Ok(Some(text)) => {
                        self.received_chars += text.chars().count();
                        self.pending.push_back(Ok(text));
                    }
                    Ok(None) => {}
                    Err(reason) => {
                        self.finished = true;
                        let err = self.interrupted(reason);
                        self.pending.push_back(Err(err));
                    }
                },
            }
        }
    }

    fn interrupted(&self, reason: String) -> GepError {
        tracing::warn!(received_chars = self.received_chars, reason = %reason, "Streamed reply interrupted");
        GepError::StreamInterrupted { reason, received_chars: self.received_chars }
    }
}

/// Reply text of a non-streamed completion
pub fn extract_message_content(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GepError::malformed(format!("unreadable completion envelope: {}", e), body))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GepError::malformed("completion has no message content", body))
}

/// Text carried by one streamed chunk, if any
fn extract_delta_content(data: &str) -> std::result::Result<Option<String>, String> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| format!("undecodable stream chunk: {}", e))?;

    if let Some(error) = chunk.error {
        return Err(format!("model reported an error mid-stream: {}", error));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty()))
}

/// Request body for the chat-completions API
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> CompletionRequest<'a> {
    fn vision(model: &'a str, image_base64: &'a str, instruction: &'a str) -> Self {
        Self {
            model,
            messages: vec![RequestMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::ImageUrl { image_url: ImageUrl { url: image_base64 } },
                    ContentPart::Text { text: instruction },
                ]),
            }],
            stream: false,
        }
    }

    fn chat(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![RequestMessage { role: "user", content: MessageContent::Text(prompt) }],
            stream: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageUrl<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

/// Response from the chat-completions API
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sse(deltas: &[&str], done: bool) -> Vec<std::result::Result<Vec<u8>, String>> {
        let mut frames: Vec<_> = deltas
            .iter()
            .map(|d| {
                let chunk = json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": d}}]});
                Ok(format!("data: {}\n\n", chunk).into_bytes())
            })
            .collect();
        if done {
            frames.push(Ok(b"data: [DONE]\n\n".to_vec()));
        }
        frames
    }

    async fn collect(stream: ChunkStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    #[test]
    fn test_vision_request_shape() {
        let request = CompletionRequest::vision("glm-4v-plus", "QUJD", "评估这张图");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "glm-4v-plus");
        assert!(value.get("stream").is_none());
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image_url");
        assert_eq!(content[0]["image_url"]["url"], "QUJD");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "评估这张图");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = CompletionRequest::chat("glm-4", "用户提问：你好");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "用户提问：你好");
    }

    #[test]
    fn test_extract_message_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "```json\n{}\n```"}}]});
        assert_eq!(extract_message_content(&body.to_string()).unwrap(), "```json\n{}\n```");

        let empty = json!({"choices": []});
        assert!(matches!(
            extract_message_content(&empty.to_string()),
            Err(GepError::MalformedResponse { .. })
        ));
        assert!(extract_message_content("<html>").is_err());
    }

    #[test]
    fn test_client_creation() {
        let key = ApiKey::new("id.secret").unwrap();
        let client = ZhipuClient::new("http://localhost:9", key, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/chat/completions");
        assert_eq!(client.vision("glm-4v-plus").model_name(), "glm-4v-plus");
        assert_eq!(client.chat("glm-4").model_name(), "glm-4");
    }

    #[tokio::test]
    async fn test_completion_chunks_until_done() {
        let stream = completion_chunks(futures::stream::iter(sse(&["生态", "", "价值"], true)));
        let items = collect(stream).await;
        let texts: Vec<_> = items.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(texts, vec!["生态".to_string(), "价值".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_done_is_interruption() {
        let stream = completion_chunks(futures::stream::iter(sse(&["半句"], false)));
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "半句");
        assert!(matches!(
            items[1],
            Err(GepError::StreamInterrupted { received_chars: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let mut frames = sse(&["一", "二"], false);
        frames.push(Err("connection reset".to_string()));
        let items = collect(completion_chunks(futures::stream::iter(frames))).await;

        assert_eq!(items.len(), 3);
        assert!(items[2].is_err());
    }

    #[tokio::test]
    async fn test_mid_stream_error_payload() {
        let frames: Vec<std::result::Result<Vec<u8>, String>> = vec![Ok(
            b"data: {\"error\": {\"code\": \"1301\", \"message\": \"sensitive\"}}\n\n".to_vec(),
        )];
        let items = collect(completion_chunks(futures::stream::iter(frames))).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(GepError::StreamInterrupted { .. })));
    }
}
