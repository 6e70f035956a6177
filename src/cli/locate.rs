use std::path::PathBuf;

use action_locator::{ElementLocator, ElementQuery, LocatorOptions};
use action_primitives::ActionKind;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::output::emit;
use super::runtime::load_page;

#[derive(Args, Clone, Debug)]
pub struct LocateArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Element query as JSON, e.g. '{"text":"View Report"}'
    #[arg(long)]
    pub query: String,

    /// Action the query is for; date targets only resolve for clicks
    #[arg(long, default_value = "click")]
    pub action: String,
}

#[derive(Debug, Serialize)]
struct LocateReport {
    element: String,
    label: String,
    strategy: &'static str,
    locator: String,
    confidence: f64,
}

pub async fn cmd_locate(args: LocateArgs, ctx: &CliContext) -> Result<()> {
    let doc = load_page(&args.page).await?;
    let query: ElementQuery =
        serde_json::from_str(&args.query).context("parsing --query as an element query")?;
    let kind = ActionKind::from(args.action);

    let locator = ElementLocator::new(LocatorOptions {
        report_button_phrase: ctx.config().bridge.report_button_phrase.clone(),
    });
    let resolution = locator.locate(&doc, &query, kind == ActionKind::Click)?;

    let report = LocateReport {
        element: doc.describe(resolution.node),
        label: doc.label(resolution.node),
        strategy: resolution.strategy.name(),
        locator: resolution.locator.to_string(),
        confidence: resolution.confidence,
    };
    emit(ctx.output(), &report, |r| {
        format!(
            "{} \"{}\"\n  via {} ({}, confidence {:.2})",
            r.element, r.label, r.strategy, r.locator, r.confidence
        )
    })
}
