use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use page_dom::{Document, PageSpec};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicenav_cli::config::default_config_path;
use voicenav_cli::Config;

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Resolve, read, override from the environment and validate the config.
pub fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = config_path.cloned().unwrap_or_else(default_config_path);
    let mut config = Config::load(&path)?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(LoadedConfig { config, path })
}

/// Read a page fixture (YAML or JSON `PageSpec`).
pub async fn load_page(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let spec: PageSpec =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), title = %spec.title, "loaded page fixture");
    Ok(spec.to_document())
}
