use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};

use crewwatch_core::error::CrewError;
use crewwatch_core::gateway::CrewGateway;
use crewwatch_core::model::{CommandKind, Endpoint};
use crewwatch_core::notification::{DEFAULT_NOTIFICATION_TTL_SECS, Notification, NotificationSink};
use crewwatch_core::reconciler::{ConnectionState, Reconciler, SourceUpdate};
use crewwatch_core::snapshot::MonitorSnapshot;

use crate::dispatcher::{CommandDispatcher, CommandResult};
use crate::poller::{ForceDecision, PollTimers, Poller, TickDecision};

/// Capacity of the handle-to-monitor request queue.
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// Timing knobs for the monitor task.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub agents_interval: Duration,
    pub status_interval: Duration,
    pub stats_interval: Duration,
    pub notification_ttl: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            agents_interval: Duration::from_secs(2),
            status_interval: Duration::from_secs(2),
            stats_interval: Duration::from_secs(5),
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS),
        }
    }
}

enum Request {
    Command {
        kind: CommandKind,
        reply: oneshot::Sender<CommandResult>,
    },
    DismissNotification,
    ForcePoll(Endpoint),
    Shutdown,
}

/// Result of a spawned gateway call, applied on the monitor task.
enum Completion {
    Fetched(SourceUpdate),
    Command(CommandKind, Result<(), CrewError>),
}

/// What a spawned gateway task was doing, so a panicked task can still be
/// accounted for.
#[derive(Debug, Clone, Copy)]
enum Task {
    Fetch(Endpoint),
    Command(CommandKind),
}

impl Task {
    fn failed(self, error: CrewError) -> Completion {
        match self {
            Self::Fetch(Endpoint::Agents) => Completion::Fetched(SourceUpdate::Agents(Err(error))),
            Self::Fetch(Endpoint::CrewStatus) => {
                Completion::Fetched(SourceUpdate::CrewStatus(Err(error)))
            },
            Self::Fetch(Endpoint::CrewStats) => {
                Completion::Fetched(SourceUpdate::CrewStats(Err(error)))
            },
            Self::Command(kind) => Completion::Command(kind, Err(error)),
        }
    }
}

/// The single cooperative task that owns all crew state.
///
/// Gateway calls run as child tasks whose results come back through a
/// [`JoinSet`]; only this task mutates the reconciler, the notification sink
/// and the command bookkeeping.
pub struct CrewMonitor<G: CrewGateway> {
    gateway: Arc<G>,
    settings: MonitorSettings,
    reconciler: Reconciler,
    notifications: NotificationSink,
    poller: Poller,
    dispatcher: CommandDispatcher,
    tasks: JoinSet<Completion>,
    running: HashMap<task::Id, Task>,
    snapshots: watch::Sender<MonitorSnapshot>,
}

impl<G: CrewGateway> CrewMonitor<G> {
    /// Start monitoring on the current tokio runtime.
    pub fn spawn(gateway: G, settings: MonitorSettings) -> MonitorHandle {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(MonitorSnapshot::default());

        let monitor = Self {
            gateway: Arc::new(gateway),
            notifications: NotificationSink::new(settings.notification_ttl),
            settings,
            reconciler: Reconciler::new(),
            poller: Poller::new(),
            dispatcher: CommandDispatcher::new(),
            tasks: JoinSet::new(),
            running: HashMap::new(),
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(monitor.run(request_rx));

        MonitorHandle {
            requests: request_tx,
            snapshots: snapshot_rx,
            _task: Arc::new(AbortOnDrop(task)),
        }
    }

    async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        let mut timers = PollTimers::new(
            self.settings.agents_interval,
            self.settings.status_interval,
            self.settings.stats_interval,
        );
        tracing::info!(
            agents_ms = self.settings.agents_interval.as_millis() as u64,
            status_ms = self.settings.status_interval.as_millis() as u64,
            stats_ms = self.settings.stats_interval.as_millis() as u64,
            "Crew monitor started"
        );

        loop {
            let dismiss_at = self.notifications.deadline();
            tokio::select! {
                _ = timers.agents.tick() => self.on_tick(Endpoint::Agents),
                _ = timers.crew_status.tick() => self.on_tick(Endpoint::CrewStatus),
                _ = timers.crew_stats.tick() => self.on_tick(Endpoint::CrewStats),
                Some(joined) = self.tasks.join_next_with_id() => match joined {
                    Ok((id, completion)) => {
                        self.running.remove(&id);
                        self.on_completion(completion, &mut timers);
                    },
                    Err(e) => self.on_task_failure(e, &mut timers),
                },
                _ = sleep_until(dismiss_at) => {
                    self.notifications.expire(now());
                },
                request = requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.on_request(request, &mut timers),
                },
            }
            self.publish_snapshot();
        }

        // In-flight fetches and commands must not outlive the monitor.
        self.tasks.abort_all();
        self.running.clear();
        tracing::info!("Crew monitor stopped");
    }

    fn on_tick(&mut self, endpoint: Endpoint) {
        match self.poller.on_tick(endpoint) {
            TickDecision::Issue => self.spawn_fetch(endpoint),
            TickDecision::Skip => {
                tracing::debug!(
                    %endpoint,
                    skipped = self.poller.skipped(endpoint),
                    "Previous fetch still outstanding, skipping tick"
                );
            },
        }
    }

    fn force_poll(&mut self, endpoint: Endpoint, timers: &mut PollTimers) {
        match self.poller.on_force(endpoint) {
            ForceDecision::IssueNow => self.spawn_fetch(endpoint),
            ForceDecision::Queued => {
                tracing::debug!(%endpoint, "Forced poll queued behind outstanding fetch");
            },
        }
        timers.reset(endpoint);
    }

    fn spawn_fetch(&mut self, endpoint: Endpoint) {
        let gateway = Arc::clone(&self.gateway);
        let handle = self.tasks.spawn(async move {
            let update = match endpoint {
                Endpoint::Agents => SourceUpdate::Agents(gateway.fetch_agents().await),
                Endpoint::CrewStatus => SourceUpdate::CrewStatus(gateway.fetch_crew_status().await),
                Endpoint::CrewStats => SourceUpdate::CrewStats(gateway.fetch_crew_stats().await),
            };
            Completion::Fetched(update)
        });
        self.running.insert(handle.id(), Task::Fetch(endpoint));
    }

    fn on_request(&mut self, request: Request, timers: &mut PollTimers) {
        match request {
            Request::Command { kind, reply } => {
                if !self.dispatcher.begin(kind, Some(reply)) {
                    tracing::debug!(command = %kind, "Command already in flight, coalesced");
                    return;
                }
                tracing::info!(command = %kind, "Dispatching command");
                let gateway = Arc::clone(&self.gateway);
                let handle = self.tasks.spawn(async move {
                    let result = gateway.send_command(kind).await;
                    Completion::Command(kind, result)
                });
                self.running.insert(handle.id(), Task::Command(kind));
            },
            Request::DismissNotification => self.notifications.dismiss(),
            Request::ForcePoll(endpoint) => self.force_poll(endpoint, timers),
            Request::Shutdown => {},
        }
    }

    /// Release the bookkeeping of a task that panicked, as if its gateway
    /// call had failed.
    fn on_task_failure(&mut self, error: JoinError, timers: &mut PollTimers) {
        let Some(task) = self.running.remove(&error.id()) else {
            tracing::error!(error = %error, "Unknown gateway task failed");
            return;
        };
        tracing::error!(?task, error = %error, "Gateway task failed");
        let failure = CrewError::NetworkUnreachable(format!("gateway task failed: {error}"));
        self.on_completion(task.failed(failure), timers);
    }

    fn on_completion(&mut self, completion: Completion, timers: &mut PollTimers) {
        match completion {
            Completion::Fetched(update) => {
                let endpoint = update.endpoint();
                if let Some(e) = update.error() {
                    tracing::warn!(
                        %endpoint,
                        error = %e,
                        class = e.class(),
                        failures = self.reconciler.consecutive_failures(endpoint) + 1,
                        attempts = self.poller.issued(endpoint),
                        "Poll failed, keeping last known value"
                    );
                }
                if let Some(state) = self.reconciler.apply(update) {
                    self.on_connection_change(state);
                }
                if self.poller.on_complete(endpoint) {
                    self.spawn_fetch(endpoint);
                }
            },
            Completion::Command(kind, result) => {
                let done = self.dispatcher.finish(kind, result);
                match &done.result {
                    Ok(_) => tracing::info!(command = %kind, "Command acknowledged"),
                    Err(e) => tracing::warn!(command = %kind, error = %e, "Command failed"),
                }
                for endpoint in done.force_polls {
                    self.force_poll(*endpoint, timers);
                }
                self.notifications.publish(done.message, done.severity, now());
                if let Some(reply) = done.reply {
                    let _ = reply.send(done.result);
                }
            },
        }
    }

    fn on_connection_change(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connected => tracing::info!("Connected to crew engine"),
            ConnectionState::Disconnected => {
                tracing::warn!("Crew engine unreachable, no data received yet");
                let (message, severity) = Notification::disconnected();
                self.notifications.publish(message, severity, now());
            },
            ConnectionState::Connecting => {},
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = MonitorSnapshot::capture(
            &self.reconciler,
            &self.notifications,
            self.dispatcher.in_flight(),
        );
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Presentation-side access to a running [`CrewMonitor`].
///
/// Cheap to clone. The monitor is torn down when the last handle drops.
#[derive(Clone)]
pub struct MonitorHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<MonitorSnapshot>,
    _task: Arc<AbortOnDrop>,
}

impl MonitorHandle {
    pub async fn start(&self) -> CommandResult {
        self.command(CommandKind::Start).await
    }

    pub async fn stop(&self) -> CommandResult {
        self.command(CommandKind::Stop).await
    }

    /// Send `kind` and wait for the engine's answer.
    pub async fn command(&self, kind: CommandKind) -> CommandResult {
        let stopped = || CrewError::CommandRejected {
            kind,
            reason: "monitor stopped".to_string(),
        };
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(Request::Command { kind, reply })
            .await
            .map_err(|_| stopped())?;
        answer.await.map_err(|_| stopped())?
    }

    pub async fn dismiss_notification(&self) {
        let _ = self.requests.send(Request::DismissNotification).await;
    }

    /// Refresh `endpoint` now instead of waiting for its timer.
    pub async fn force_poll(&self, endpoint: Endpoint) {
        let _ = self.requests.send(Request::ForcePoll(endpoint)).await;
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.clone()
    }

    /// Stop polling, cancel outstanding calls, and wait for the task to end.
    pub async fn shutdown(&self) {
        let _ = self.requests.send(Request::Shutdown).await;
        let mut rx = self.snapshots.clone();
        while rx.changed().await.is_ok() {}
    }
}
