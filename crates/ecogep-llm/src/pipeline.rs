use ecogep_core::error::{GepError, Result};
use ecogep_core::models::ValuationReport;
use ecogep_core::parse::parse_reply;
use ecogep_core::prompt::{build_follow_up_prompt, VALUATION_INSTRUCTION};
use ecogep_core::SessionContext;
use futures::StreamExt;
use std::time::Duration;

use crate::ports::{ChatModel, VisionModel};
use crate::upload::{encode_image, EncodedImage};

/// Bounded retry with exponential backoff for the valuation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A single attempt
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::from_millis(500) }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::none() }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Drives a session through report generation and follow-up questions
pub struct ValuationPipeline<V, C>
where
    V: VisionModel,
    C: ChatModel,
{
    vision: V,
    chat: C,
    retry: RetryPolicy,
}

impl<V, C> ValuationPipeline<V, C>
where
    V: VisionModel,
    C: ChatModel,
{
    /// Create a new pipeline
    pub fn new(vision: V, chat: C) -> Self {
        Self { vision, chat, retry: RetryPolicy::none() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn vision(&self) -> &V {
        &self.vision
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    /// Value an uploaded photo and install the resulting report.
    ///
    /// The image is decoded first; undecodable input fails without touching
    /// the session. Otherwise the previous report and the conversation are
    /// cleared before the hosted call, and the new report is only installed
    /// after a complete, successful parse.
    pub async fn generate_report<'s>(
        &self,
        session: &'s mut SessionContext,
        image_bytes: &[u8],
    ) -> Result<&'s ValuationReport> {
        let image = encode_image(image_bytes)?;

        session.begin_generation();
        tracing::info!(
            session = %session.id(),
            model = self.vision.model_name(),
            width = image.width,
            height = image.height,
            "Generating valuation report"
        );

        let reply = self.analyze_with_retry(&image).await?;
        let report = parse_reply(&reply).inspect_err(|e| {
            tracing::warn!(session = %session.id(), error = %e, "Valuation reply could not be parsed");
        })?;

        Ok(session.commit_report(report))
    }

    async fn analyze_with_retry(&self, image: &EncodedImage) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.vision.analyze(image, VALUATION_INSTRUCTION).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Valuation request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Valuation request failed");
                    return Err(e);
                }
            }
        }
    }

    /// Ask a follow-up question about the current report.
    ///
    /// The question is recorded before the request is sent. `on_partial`
    /// receives the accumulated reply after every chunk. The assistant turn
    /// is recorded only once the stream completes; on failure the partial
    /// reply is discarded and a `StreamInterrupted` error is returned.
    pub async fn ask<F>(
        &self,
        session: &mut SessionContext,
        question: &str,
        mut on_partial: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        session.history_mut().push_user(question);
        let prompt = build_follow_up_prompt(question, session.report_context().as_deref());

        let mut buffer = String::new();
        let mut stream = self
            .chat
            .stream_reply(&prompt)
            .await
            .map_err(|e| interrupted(e, &buffer))?;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) if text.is_empty() => {}
                Ok(text) => {
                    buffer.push_str(&text);
                    on_partial(&buffer);
                }
                Err(e) => {
                    tracing::warn!(session = %session.id(), error = %e, "Follow-up reply interrupted");
                    return Err(interrupted(e, &buffer));
                }
            }
        }

        tracing::debug!(session = %session.id(), reply_chars = buffer.chars().count(), "Follow-up reply complete");
        session.history_mut().push_assistant(buffer.clone());
        Ok(buffer)
    }
}

fn interrupted(err: GepError, buffer: &str) -> GepError {
    match err {
        GepError::StreamInterrupted { .. } => err,
        other => GepError::StreamInterrupted {
            reason: other.to_string(),
            received_chars: buffer.chars().count(),
        },
    }
}
