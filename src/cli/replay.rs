use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;
use voice_bridge::{NoticeLevel, OutboundMessage};
use voicenav_cli::{parse_events, run_replay, SiteFixture};

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Site fixture: app host, start path and one page per route
    #[arg(long, value_name = "FILE")]
    pub site: PathBuf,

    /// Session script, one JSON transport event per line
    #[arg(long, value_name = "FILE")]
    pub events: PathBuf,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext) -> Result<()> {
    let raw_site = fs::read_to_string(&args.site)
        .await
        .with_context(|| format!("reading {}", args.site.display()))?;
    let site = SiteFixture::from_yaml(&raw_site)?;
    let raw_events = fs::read_to_string(&args.events)
        .await
        .with_context(|| format!("reading {}", args.events.display()))?;
    let events = parse_events(&raw_events)?;

    let report = run_replay(&site, &events, ctx.config()).await;
    emit(ctx.output(), &report, |r| {
        let mut out = String::new();
        for message in &r.messages {
            match message {
                OutboundMessage::DomActionResult {
                    action_id,
                    result,
                    success,
                } => {
                    let mark = if *success { "ok" } else { "FAILED" };
                    out.push_str(&format!("result  {action_id} {mark}: {result}\n"));
                }
                OutboundMessage::PageContent { content } => {
                    out.push_str(&format!(
                        "content {} \"{}\" ({} buttons, {} cards)\n",
                        content.pathname,
                        content.title,
                        content.buttons.len(),
                        content.cards.len()
                    ));
                }
            }
        }
        for notice in &r.notices {
            let level = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warn",
            };
            out.push_str(&format!("notice  [{level}] {}\n", notice.message));
        }
        out.push_str(&format!("route   {}\n", r.final_path));
        out
    })
}
