use clap::{Parser, Subcommand};
use ecogep_core::config::CliConfigOverrides;
use std::path::PathBuf;

/// EcoGEP - Gross Ecosystem Product valuation from photos
#[derive(Parser, Debug)]
#[command(name = "gep")]
#[command(about = "Gross Ecosystem Product valuation from ecosystem photos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the hosted model API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Multimodal model used for valuation
    #[arg(long, global = true, value_name = "MODEL")]
    pub vision_model: Option<String>,

    /// Chat model used for follow-up questions
    #[arg(long, global = true, value_name = "MODEL")]
    pub chat_model: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Extra attempts for a failed valuation request
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            base_url: self.base_url.clone(),
            vision_model: self.vision_model.clone(),
            chat_model: self.chat_model.clone(),
            request_timeout_secs: self.timeout,
            max_retries: self.retries,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the per-hectare value-equivalent coefficient table
    Table(TableArgs),

    /// Value an ecosystem photo
    Assess(AssessArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct TableArgs {
    /// Show a single category, e.g. "阔叶林 (森林)", or every row of a land class, e.g. "森林"
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AssessArgs {
    /// Path to a JPG or PNG photo
    pub image: PathBuf,

    /// Ask follow-up questions about the report afterwards
    #[arg(long)]
    pub chat: bool,
}
