//! EcoGEP LLM - Hosted model ports, adapters, and the valuation pipeline
//!
//! This crate defines the ports for the vision and chat models, the Zhipu
//! BigModel adapter implementing them, and the pipeline that drives a
//! session through report generation and follow-up questions.

pub mod upload;
pub mod pipeline;
pub mod ports;
pub mod sse;
pub mod zhipu;

// Re-export main types
pub use upload::{encode_image, EncodedImage};
pub use pipeline::{RetryPolicy, ValuationPipeline};
pub use ports::{ChatModel, ChunkStream, VisionModel};
pub use zhipu::{ZhipuChatModel, ZhipuClient, ZhipuVisionModel};
