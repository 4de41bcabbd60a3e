//! Config command implementation

use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;
use anyhow::Result;
use ecogep_core::config::LayeredConfig;
use ecogep_core::ApiKey;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let credential_present = ApiKey::from_env().is_some();

    if output.is_json() {
        return output.result(serde_json::json!({
            "entries": entries,
            "api_key_set": credential_present,
        }));
    }

    output.section("Configuration");
    output.table(entries);
    output.kv(
        "ZHIPUAI_API_KEY",
        if credential_present { "set" } else { "not set (you will be prompted)" },
    );

    Ok(())
}
