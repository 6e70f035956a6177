use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use voice_bridge::snapshot;

use super::context::CliContext;
use super::output::emit;
use super::runtime::load_page;

#[derive(Args, Clone, Debug)]
pub struct SnapshotArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Pathname reported for the page
    #[arg(long, default_value = "/")]
    pub path: String,
}

pub async fn cmd_snapshot(args: SnapshotArgs, ctx: &CliContext) -> Result<()> {
    let doc = load_page(&args.page).await?;
    let content = snapshot(&doc, &args.path, &ctx.config().bridge.snapshot);
    emit(ctx.output(), &content, |c| {
        let mut out = format!("{} ({})\n", c.title, c.pathname);
        for button in &c.buttons {
            out.push_str(&format!("  button  {}\n", button.text));
        }
        for input in &c.inputs {
            let name = input.element.name.as_deref().unwrap_or("-");
            out.push_str(&format!("  input   {} [{}]\n", name, input.kind));
        }
        for link in &c.links {
            out.push_str(&format!("  link    {} -> {}\n", link.element.text, link.href));
        }
        for card in &c.cards {
            let date = card.date.as_deref().unwrap_or("no date");
            out.push_str(&format!("  card    {} ({})\n", card.preview, date));
        }
        out
    })
}
