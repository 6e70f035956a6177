use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::fs;
use voicenav_cli::Config;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file, defaults and overrides)
    Show,

    /// Validate the configuration file
    Validate,

    /// Print the configuration file path in use
    Path,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path().to_path_buf();
    match args.action {
        ConfigAction::Show => {
            println!("# effective configuration ({})", path.display());
            println!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Validate => {
            if fs::try_exists(&path).await? {
                let raw = fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let config = Config::from_yaml(&raw, &path)?;
                config.validate()?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }

    Ok(())
}
