//! Navigation dispatcher: allow-list check, indicator, route change

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn};
use url::{Host, Url};

use crate::errors::{BridgeError, BridgeResult};
use crate::model::Notice;
use crate::policy::BridgePolicy;
use crate::ports::{BridgePorts, NotifierPort, RouterPort};
use crate::routes::RouteTable;

/// Turn a navigation target into an in-app path.
///
/// Absolute URLs must point at `app_host` (or, with `allow_loopback`, both
/// hosts must be loopback); the path keeps its query and fragment. Relative
/// targets get a leading `/`; an empty target is the root.
pub fn resolve_target(target: &str, app_host: &str, allow_loopback: bool) -> BridgeResult<String> {
    let target = target.trim();
    if target.is_empty() {
        return Ok("/".to_string());
    }

    let absolute = if target.starts_with("//") {
        Url::parse(&format!("http:{target}")).ok()
    } else {
        Url::parse(target).ok()
    };
    let Some(url) = absolute else {
        return Ok(if target.starts_with('/') {
            target.to_string()
        } else {
            format!("/{target}")
        });
    };

    let app_host_name = host_name(app_host);
    let allowed = match url.host() {
        Some(host) => {
            let name = host.to_string();
            name.eq_ignore_ascii_case(&app_host_name)
                || (allow_loopback && is_loopback(&host) && is_loopback_name(&app_host_name))
        }
        None => false,
    };
    if !allowed {
        return Err(BridgeError::BlockedCrossOrigin {
            host: url
                .host_str()
                .map(str::to_string)
                .unwrap_or_else(|| url.scheme().to_string()),
            app_host: app_host.to_string(),
        });
    }

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    Ok(path)
}

/// Host part of an `app_host` that may carry a port.
fn host_name(app_host: &str) -> String {
    Url::parse(&format!("http://{app_host}/"))
        .ok()
        .and_then(|url| url.host().map(|host| host.to_string()))
        .unwrap_or_else(|| app_host.to_string())
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

fn is_loopback_name(name: &str) -> bool {
    if name.eq_ignore_ascii_case("localhost") {
        return true;
    }
    name.trim_matches(|c| c == '[' || c == ']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

pub struct NavigationDispatcher {
    router: Arc<dyn RouterPort>,
    notifier: Arc<dyn NotifierPort>,
    routes: RouteTable,
    lead: Duration,
    hold: Duration,
    allow_loopback: bool,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl NavigationDispatcher {
    pub fn new(ports: &BridgePorts, policy: &BridgePolicy, routes: RouteTable) -> Self {
        Self {
            router: Arc::clone(&ports.router),
            notifier: Arc::clone(&ports.notifier),
            routes,
            lead: Duration::from_millis(policy.indicator_lead_ms),
            hold: Duration::from_millis(policy.indicator_hold_ms),
            allow_loopback: policy.allow_loopback,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Track indicator timers on the owning session's tracker and token.
    pub fn with_tasks(mut self, tasks: TaskTracker, cancel: CancellationToken) -> Self {
        self.tasks = tasks;
        self.cancel = cancel;
        self
    }

    pub fn resolve(&self, target: &str) -> BridgeResult<String> {
        resolve_target(target, &self.router.app_host(), self.allow_loopback)
    }

    /// De-duplication key; equal for every spelling of the same destination.
    pub fn canonical_key(&self, target: &str) -> String {
        match self.resolve(target) {
            Ok(path) => format!("nav:{path}"),
            Err(_) => format!("nav-blocked:{}", target.trim()),
        }
    }

    /// Navigate to `target`, returning the path entered.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn navigate(&self, target: &str) -> BridgeResult<String> {
        let path = match self.resolve(target) {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "navigation blocked");
                self.notifier
                    .notify(Notice::warning(format!("Blocked navigation to {}", target.trim())));
                return Err(err);
            }
        };
        let label = self.routes.label_for(&path);

        self.notifier.set_navigating(true);
        sleep(self.lead).await;
        let pushed = self.router.push(&path).await;
        self.schedule_indicator_clear();

        match pushed {
            Ok(()) => {
                info!(path = %path, label = %label, "navigated");
                self.notifier.notify(Notice::info(format!("Opening {label}")));
                Ok(path)
            }
            Err(err) => {
                warn!(path = %path, error = %err, "route change failed");
                self.notifier
                    .notify(Notice::warning(format!("Could not open {label}")));
                Err(err)
            }
        }
    }

    fn schedule_indicator_clear(&self) {
        let notifier = Arc::clone(&self.notifier);
        let hold = self.hold;
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = sleep(hold) => {}
                _ = cancel.cancelled() => {}
            }
            notifier.set_navigating(false);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryApp, MemoryTransport};
    use crate::model::NoticeLevel;
    use page_dom::Document;

    fn dispatcher(app: &Arc<MemoryApp>) -> NavigationDispatcher {
        let ports = app.ports(MemoryTransport::new());
        NavigationDispatcher::new(&ports, &BridgePolicy::default(), RouteTable::default())
    }

    #[test]
    fn resolves_relative_and_same_origin_targets() {
        let host = "app.example.com";
        assert_eq!(resolve_target("/dashboard", host, false).unwrap(), "/dashboard");
        assert_eq!(resolve_target("reports", host, false).unwrap(), "/reports");
        assert_eq!(resolve_target("  ", host, false).unwrap(), "/");
        assert_eq!(
            resolve_target("https://APP.example.com/reports?tab=2#top", host, false).unwrap(),
            "/reports?tab=2#top"
        );
    }

    #[test]
    fn blocks_foreign_hosts() {
        let err = resolve_target("https://evil.example.com/dashboard", "app.example.com", true)
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::BlockedCrossOrigin {
                host: "evil.example.com".into(),
                app_host: "app.example.com".into()
            }
        );
        assert!(resolve_target("//evil.example.com/x", "app.example.com", true).is_err());
        assert!(resolve_target("mailto:someone@example.com", "app.example.com", true).is_err());
    }

    #[test]
    fn loopback_hosts_are_interchangeable_in_development() {
        assert_eq!(
            resolve_target("http://127.0.0.1:8080/bots", "localhost:5173", true).unwrap(),
            "/bots"
        );
        assert!(resolve_target("http://127.0.0.1:8080/bots", "localhost:5173", false).is_err());
        assert!(resolve_target("http://localhost/bots", "app.example.com", true).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn navigate_shows_indicator_and_notice() {
        let app = MemoryApp::new("app.example.com", "/", Document::new("Home"));
        let dispatcher = dispatcher(&app);

        let path = dispatcher.navigate("/bots").await.unwrap();
        assert_eq!(path, "/bots");
        assert_eq!(app.current_path(), "/bots");
        assert!(app.is_navigating());
        assert_eq!(app.notices(), vec![Notice::info("Opening Bot Controls")]);

        sleep(Duration::from_millis(601)).await;
        assert!(!app.is_navigating());
        assert_eq!(app.indicator_log(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_navigation_never_changes_route() {
        let app = MemoryApp::new("app.example.com", "/home", Document::new("Home"));
        let dispatcher = dispatcher(&app);

        let err = dispatcher
            .navigate("https://evil.example.com/dashboard")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "blocked_cross_origin");
        assert_eq!(app.current_path(), "/home");
        assert!(app.history().is_empty());
        assert!(app.indicator_log().is_empty());
        let notices = app.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn canonical_keys_unify_spellings() {
        let app = MemoryApp::new("app.example.com", "/", Document::new("Home"));
        let dispatcher = dispatcher(&app);
        assert_eq!(dispatcher.canonical_key("bots"), "nav:/bots");
        assert_eq!(
            dispatcher.canonical_key("https://app.example.com/bots"),
            "nav:/bots"
        );
        assert_eq!(
            dispatcher.canonical_key("https://evil.example.com/bots"),
            "nav-blocked:https://evil.example.com/bots"
        );
    }
}
