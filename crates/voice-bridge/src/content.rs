//! Page content snapshots for the remote agent

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use action_locator::extract_date_text;
use page_dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::encode_outbound;
use crate::model::{ConnectionState, OutboundMessage};
use crate::policy::BridgePolicy;
use crate::ports::{BridgePorts, PagePort, RouterPort, SessionTransport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotLimits {
    /// Maximum entries per list
    pub list_cap: usize,
    pub preview_chars: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            list_cap: 50,
            preview_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEntry {
    #[serde(flatten)]
    pub element: ElementEntry,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(flatten)]
    pub element: ElementEntry,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    #[serde(flatten)]
    pub element: ElementEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub preview: String,
}

/// Structured summary of the rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContentSnapshot {
    pub pathname: String,
    pub title: String,
    pub buttons: Vec<ElementEntry>,
    pub inputs: Vec<InputEntry>,
    pub links: Vec<LinkEntry>,
    pub cards: Vec<CardEntry>,
}

/// Summarise the rendered elements of `doc`. Pure and bounded by the list cap.
pub fn snapshot(doc: &Document, pathname: &str, limits: &SnapshotLimits) -> PageContentSnapshot {
    let rendered: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|node| doc.is_rendered(*node))
        .collect();
    let cap = limits.list_cap;

    let buttons = rendered
        .iter()
        .filter(|node| is_button(doc, **node))
        .take(cap)
        .map(|node| entry(doc, *node, limits.preview_chars))
        .collect();

    let inputs = rendered
        .iter()
        .filter(|node| is_input(doc, **node))
        .take(cap)
        .map(|node| InputEntry {
            element: entry(doc, *node, limits.preview_chars),
            kind: input_kind(doc, *node),
            placeholder: attr(doc, *node, "placeholder"),
        })
        .collect();

    let links = rendered
        .iter()
        .filter(|node| doc.tag(**node) == Some("a") && doc.attr(**node, "href").is_some())
        .take(cap)
        .map(|node| LinkEntry {
            element: entry(doc, *node, limits.preview_chars),
            href: doc.attr(*node, "href").unwrap_or_default().to_string(),
        })
        .collect();

    let cards = rendered
        .iter()
        .filter(|node| {
            doc.element(**node)
                .is_some_and(|element| element.class_contains("card"))
        })
        .take(cap)
        .map(|node| {
            let text = doc.inner_text(*node);
            CardEntry {
                element: entry(doc, *node, limits.preview_chars),
                date: extract_date_text(&text),
                preview: truncate(&text, limits.preview_chars),
            }
        })
        .collect();

    PageContentSnapshot {
        pathname: pathname.to_string(),
        title: doc.title().to_string(),
        buttons,
        inputs,
        links,
        cards,
    }
}

fn entry(doc: &Document, node: NodeId, max_chars: usize) -> ElementEntry {
    ElementEntry {
        id: attr(doc, node, "id"),
        text: truncate(&doc.inner_text(node), max_chars),
        name: attr(doc, node, "name"),
        aria_label: attr(doc, node, "aria-label"),
    }
}

fn attr(doc: &Document, node: NodeId, name: &str) -> Option<String> {
    doc.attr(node, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn input_kind(doc: &Document, node: NodeId) -> String {
    match doc.tag(node) {
        Some("input") => doc
            .attr(node, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string()),
        Some(tag) => tag.to_string(),
        None => String::new(),
    }
}

fn is_button(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("button") => true,
        Some("input") => matches!(input_kind(doc, node).as_str(), "button" | "submit" | "reset"),
        Some(_) => doc
            .attr(node, "role")
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("button")),
        None => false,
    }
}

fn is_input(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("textarea" | "select") => true,
        Some("input") => !matches!(
            input_kind(doc, node).as_str(),
            "button" | "submit" | "reset" | "hidden"
        ),
        _ => false,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Publishes snapshots on connect, on every route change, and once more
/// after the settle delay to catch late-rendered content.
pub struct PageContentReporter {
    transport: Arc<dyn SessionTransport>,
    router: Arc<dyn RouterPort>,
    page: Arc<dyn PagePort>,
    topic: String,
    limits: SnapshotLimits,
    settle: Duration,
}

impl PageContentReporter {
    pub fn new(ports: &BridgePorts, policy: &BridgePolicy) -> Self {
        Self {
            transport: Arc::clone(&ports.transport),
            router: Arc::clone(&ports.router),
            page: Arc::clone(&ports.page),
            topic: policy.content_topic.clone(),
            limits: policy.snapshot.clone(),
            settle: Duration::from_millis(policy.settle_delay_ms),
        }
    }

    pub fn current(&self) -> PageContentSnapshot {
        let path = self.router.current_path();
        let doc = self.page.document();
        let guard = doc.read();
        snapshot(&guard, &path, &self.limits)
    }

    /// Publish one snapshot if the session is connected. Returns whether it was sent.
    pub async fn report(&self) -> bool {
        if self.transport.connection_state() != ConnectionState::Connected {
            debug!("session not connected; snapshot skipped");
            return false;
        }
        let content = self.current();
        let pathname = content.pathname.clone();
        let payload = match encode_outbound(&OutboundMessage::PageContent { content }) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to encode page content");
                return false;
            }
        };
        match self.transport.publish(&self.topic, payload, true).await {
            Ok(()) => {
                debug!(pathname = %pathname, "page content published");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to publish page content");
                false
            }
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut changes = self.router.route_changes();
        let mut router_open = true;
        self.report().await;
        let mut settle_at = Some(Instant::now() + self.settle);

        loop {
            let deadline = settle_at;
            let settle = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => pending::<()>().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                change = changes.recv(), if router_open => match change {
                    Ok(path) => {
                        debug!(path = %path, "route changed; reporting page content");
                        self.report().await;
                        settle_at = Some(Instant::now() + self.settle);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "route change notifications lagged");
                    }
                    Err(RecvError::Closed) => router_open = false,
                },
                _ = settle => {
                    settle_at = None;
                    self.report().await;
                }
            }
        }
    }
}
