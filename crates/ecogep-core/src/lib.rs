//! EcoGEP Core - Domain models, session state, and configuration
//!
//! This crate contains the valuation data contract, the coefficient table,
//! reply parsing, and the session context shared by the adapters.

pub mod config;
pub mod error;
pub mod models;
pub mod parse;
pub mod prompt;
pub mod session;

pub use error::{GepError, Result};
pub use models::{ApiKey, CoefficientTable, ConversationHistory, ValuationReport};
pub use session::SessionContext;
