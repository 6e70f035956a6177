use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Print `value` in the machine formats, or the `human` rendering.
pub fn emit<T: Serialize>(
    format: &OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Human => human(value),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
