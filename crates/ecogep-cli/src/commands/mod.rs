//! Command implementations

mod assess;
mod config;
mod table;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::Result;

pub(crate) use assess::assess_image;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let overrides = cli.config_overrides();

    match cli.command {
        Commands::Table(args) => table::execute(args, &output),
        Commands::Assess(args) => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            assess::execute(args, &config, &output).await
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            config::execute(&config, &output)
        }
    }
}
