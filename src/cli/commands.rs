use clap::Subcommand;

use super::config::ConfigArgs;
use super::locate::LocateArgs;
use super::replay::ReplayArgs;
use super::snapshot::SnapshotArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Resolve an element query against a page fixture
    Locate(LocateArgs),

    /// Print the page content summary the agent would receive
    Snapshot(SnapshotArgs),

    /// Drive a scripted voice session against a site fixture
    Replay(ReplayArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
