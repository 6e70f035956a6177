use super::config::cmd_config;
use super::env::CliArgs;
use super::locate::cmd_locate;
use super::replay::cmd_replay;
use super::snapshot::cmd_snapshot;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Locate(args) => cmd_locate(args, ctx).await,
        Commands::Snapshot(args) => cmd_snapshot(args, ctx).await,
        Commands::Replay(args) => cmd_replay(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
