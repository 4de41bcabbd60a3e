//! Error types for EcoGEP

use thiserror::Error;

/// Shown when a hosted call could not complete or was rejected.
pub const MSG_ANALYSIS_FAILED: &str = "AI 思考超时，请重试！";

/// Shown when the model replied but the reply is not a usable JSON report.
pub const MSG_MALFORMED_REPLY: &str = "AI 返回的报告格式无法解析，请重试！";

/// Shown when the follow-up stream breaks off.
pub const MSG_ADVISOR_OFFLINE: &str = "顾问掉线了";

#[derive(Debug, Error)]
pub enum GepError {
    // Hosted model errors
    #[error("Request to hosted model failed: {reason}")]
    Transport { reason: String },

    #[error("Hosted model rejected the request ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model reply is not a valid report: {reason}")]
    MalformedResponse { reason: String, excerpt: String },

    #[error("Reply stream interrupted after {received_chars} characters: {reason}")]
    StreamInterrupted {
        reason: String,
        received_chars: usize,
    },

    // Input errors
    #[error("Uploaded file is not a decodable image: {reason}")]
    InvalidImage { reason: String },

    #[error("No API key available. Set ZHIPUAI_API_KEY or enter one when prompted")]
    CredentialMissing,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl GepError {
    /// Message suitable for the person at the keyboard. The `Display`
    /// output carries the diagnostic detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            GepError::Transport { .. } | GepError::Api { .. } => MSG_ANALYSIS_FAILED,
            GepError::MalformedResponse { .. } => MSG_MALFORMED_REPLY,
            GepError::StreamInterrupted { .. } => MSG_ADVISOR_OFFLINE,
            GepError::InvalidImage { .. } => "无法识别上传的图片，请上传 JPG 或 PNG 文件",
            GepError::CredentialMissing => "请先填入智谱 API Key",
            GepError::ConfigInvalid { .. } => "配置有误",
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GepError::Transport { .. } => true,
            GepError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Build a `MalformedResponse`, keeping a short prefix of the reply for diagnostics.
    pub fn malformed(reason: impl Into<String>, reply: &str) -> Self {
        GepError::MalformedResponse {
            reason: reason.into(),
            excerpt: reply.chars().take(200).collect(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GepError>;
