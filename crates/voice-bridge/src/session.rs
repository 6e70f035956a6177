//! Session lifecycle
//!
//! [`VoiceBridge`] follows the transport's connection state. Each connected
//! period gets a [`SessionScope`] owning four tasks:
//! - intake: transport events, handed over by the bridge, into the inbound stream
//! - poller: participant metadata into the inbound stream every poll interval
//! - pump: the single consumer of the inbound stream, dispatching commands
//! - reporter: page content snapshots
//!
//! Leaving `Connected` cancels the scope and waits for every task it spawned.

use std::sync::Arc;
use std::time::Duration;

use action_locator::LocatorOptions;
use action_primitives::{ActionExecutor, DomAction};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};
use voicenav_core_types::SessionId;

use crate::codec::encode_outbound;
use crate::content::PageContentReporter;
use crate::model::{ConnectionState, InboundCommand, InboundFrame, OutboundMessage, SessionEvent};
use crate::multiplexer::Multiplexer;
use crate::navigation::NavigationDispatcher;
use crate::policy::BridgePolicy;
use crate::ports::BridgePorts;
use crate::routes::RouteTable;

/// Tasks and state of one connected period
pub struct SessionScope {
    id: SessionId,
    cancel: CancellationToken,
    tracker: TaskTracker,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionScope {
    /// Spawn the scope's tasks on `tracker`.
    ///
    /// The scope does not subscribe to the transport itself: the bridge hands
    /// over every event it reads after the `Connected` transition through
    /// [`SessionScope::deliver`], so nothing sent right after connecting is lost.
    pub fn start(
        ports: &BridgePorts,
        policy: &BridgePolicy,
        routes: &RouteTable,
        tracker: TaskTracker,
    ) -> Self {
        let id = SessionId::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(policy.inbound_buffer.max(1));
        let (events, events_rx) = mpsc::channel(policy.inbound_buffer.max(1));

        tracker.spawn(intake(events_rx, tx.clone(), policy.clone(), cancel.clone()));

        tracker.spawn(poll_metadata(
            ports.clone(),
            Duration::from_millis(policy.poll_interval_ms.max(1)),
            tx,
            cancel.clone(),
        ));

        let pump = Pump {
            ports: ports.clone(),
            multiplexer: Multiplexer::new(policy),
            dispatcher: NavigationDispatcher::new(ports, policy, routes.clone())
                .with_tasks(tracker.clone(), cancel.clone()),
            executor: ActionExecutor::new(LocatorOptions {
                report_button_phrase: policy.report_button_phrase.clone(),
            }),
            result_topic: policy.result_topic.clone(),
        };
        tracker.spawn(pump.run(rx, cancel.clone()));

        let reporter = PageContentReporter::new(ports, policy);
        tracker.spawn(reporter.run(cancel.clone()));

        info!(session = %id, "voice session scope started");
        Self {
            id,
            cancel,
            tracker,
            events,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn live_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Sender feeding transport events to the scope's intake task.
    pub fn deliver(&self) -> mpsc::Sender<SessionEvent> {
        self.events.clone()
    }

    /// Cancel every task of the scope and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
        info!(session = %self.id, "voice session scope stopped");
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn intake(
    mut events: mpsc::Receiver<SessionEvent>,
    tx: mpsc::Sender<InboundFrame>,
    policy: BridgePolicy,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        let Some(frame) = InboundFrame::from_event(event, |topic| policy.accepts_topic(topic)) else {
            continue;
        };
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(frame) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    debug!("intake stopped");
}

async fn poll_metadata(
    ports: BridgePorts,
    every: Duration,
    tx: mpsc::Sender<InboundFrame>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let metadata = match ports.transport.participant_metadata().await {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!(error = %err, "metadata poll failed");
                continue;
            }
        };
        for (participant, value) in metadata {
            let frame = InboundFrame::poll(participant, value);
            tokio::select! {
                _ = cancel.cancelled() => return,
                sent = tx.send(frame) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }
    debug!("metadata poller stopped");
}

struct Pump {
    ports: BridgePorts,
    multiplexer: Multiplexer,
    dispatcher: NavigationDispatcher,
    executor: ActionExecutor,
    result_topic: String,
}

impl Pump {
    async fn run(mut self, mut rx: mpsc::Receiver<InboundFrame>, cancel: CancellationToken) {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let channel = frame.channel;
            let dispatcher = &self.dispatcher;
            let accepted =
                self.multiplexer
                    .accept(frame, Instant::now(), |target| dispatcher.canonical_key(target));
            match accepted {
                Ok(Some(command)) => self.dispatch(command).await,
                Ok(None) => {}
                Err(err) => warn!(%channel, code = err.code(), error = %err, "inbound frame dropped"),
            }
        }
        debug!("inbound pump stopped");
    }

    async fn dispatch(&self, command: InboundCommand) {
        match command {
            InboundCommand::Navigate { target } => {
                // failures already surfaced as notices
                let _ = self.dispatcher.navigate(&target).await;
            }
            InboundCommand::Dom(action) => self.execute(action).await,
        }
    }

    #[instrument(skip_all, fields(action_id = %action.id))]
    async fn execute(&self, action: DomAction) {
        let result = {
            let document = self.ports.page.document();
            let mut doc = document.write();
            self.executor.execute(&mut doc, &action)
        };
        let payload = match encode_outbound(&OutboundMessage::from(result)) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to encode action result");
                return;
            }
        };
        if let Err(err) = self
            .ports
            .transport
            .publish(&self.result_topic, payload, true)
            .await
        {
            warn!(error = %err, "failed to publish action result");
        }
    }
}

/// Connects one voice transport to the hosting application for its whole
/// lifetime, starting a fresh [`SessionScope`] for every connected period.
pub struct VoiceBridge {
    ports: BridgePorts,
    policy: BridgePolicy,
    routes: RouteTable,
    tracker: TaskTracker,
    state: RwLock<ConnectionState>,
    scope: Mutex<Option<SessionScope>>,
}

impl VoiceBridge {
    pub fn new(ports: BridgePorts, policy: BridgePolicy, routes: RouteTable) -> Arc<Self> {
        Arc::new(Self {
            ports,
            policy,
            routes,
            tracker: TaskTracker::new(),
            state: RwLock::new(ConnectionState::Disconnected),
            scope: Mutex::new(None),
        })
    }

    /// Connection state the bridge has finished acting on.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Tasks still running across all session scopes.
    pub fn live_tasks(&self) -> usize {
        self.tracker.len()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.scope.lock().as_ref().map(|scope| scope.id().clone())
    }

    pub fn policy(&self) -> &BridgePolicy {
        &self.policy
    }

    /// Move to `next`, starting or tearing down the session scope.
    ///
    /// `Connecting` only records the state; a scope survives a reconnect
    /// that never reports `Disconnected`.
    pub async fn handle_connection(&self, next: ConnectionState) {
        let previous = self.state();
        if previous == next {
            return;
        }
        info!(from = ?previous, to = ?next, "connection state changed");
        match next {
            ConnectionState::Connected => {
                let has_scope = self.scope.lock().is_some();
                if !has_scope {
                    let scope = SessionScope::start(
                        &self.ports,
                        &self.policy,
                        &self.routes,
                        self.tracker.clone(),
                    );
                    *self.scope.lock() = Some(scope);
                }
                *self.state.write() = next;
            }
            ConnectionState::Connecting => {
                *self.state.write() = next;
            }
            ConnectionState::Disconnected => {
                let scope = self.scope.lock().take();
                if let Some(scope) = scope {
                    scope.shutdown().await;
                }
                *self.state.write() = next;
            }
        }
    }

    /// Hand `event` to the live scope; dropped while no scope exists.
    async fn forward(&self, event: SessionEvent, shutdown: &CancellationToken) {
        let sender = self.scope.lock().as_ref().map(SessionScope::deliver);
        let Some(sender) = sender else {
            debug!("no live session; event dropped");
            return;
        };
        tokio::select! {
            _ = shutdown.cancelled() => {}
            sent = sender.send(event) => {
                if sent.is_err() {
                    debug!("session intake closed; event dropped");
                }
            }
        }
    }

    /// Subscribe to transport events now and follow them on a new task.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let events = self.ports.transport.events();
        tokio::spawn(Arc::clone(self).run_with(events, shutdown))
    }

    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let events = self.ports.transport.events();
        self.run_with(events, shutdown).await;
    }

    /// Follow `events` until `shutdown` fires or the transport closes, then
    /// tear down any live scope. Everything but connection changes goes to
    /// the live scope, in the order it was read.
    pub async fn run_with(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
        shutdown: CancellationToken,
    ) {
        let initial = self.ports.transport.connection_state();
        self.handle_connection(initial).await;
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(SessionEvent::Connection(state)) => self.handle_connection(state).await,
                Ok(event) => self.forward(event, &shutdown).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connection events lagged; resynchronising");
                    let current = self.ports.transport.connection_state();
                    self.handle_connection(current).await;
                }
                Err(RecvError::Closed) => break,
            }
        }
        self.handle_connection(ConnectionState::Disconnected).await;
        info!("voice bridge stopped");
    }
}
