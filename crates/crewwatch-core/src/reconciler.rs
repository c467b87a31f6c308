use serde::Serialize;

use crate::error::CrewError;
use crate::model::{Agent, AgentStatus, CrewStats, CrewStatus, Endpoint};

/// Connectivity as seen by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No successful read yet and not every source has failed.
    #[default]
    Connecting,
    /// At least one agents or status fetch succeeded. Sticky.
    Connected,
    /// Both agents and status failed and neither has ever succeeded.
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// Agent tallies by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentCounts {
    pub idle: usize,
    pub running: usize,
    pub completed: usize,
    pub error: usize,
}

impl AgentCounts {
    pub fn from_agents(agents: &[Agent]) -> Self {
        let mut counts = Self::default();
        for agent in agents {
            match agent.status {
                AgentStatus::Idle => counts.idle += 1,
                AgentStatus::Running => counts.running += 1,
                AgentStatus::Completed => counts.completed += 1,
                AgentStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.idle + self.running + self.completed + self.error
    }
}

/// Share of completed agents in percent. Zero for an empty crew.
///
/// Independent of `CrewStats::success_rate`, which the engine reports on
/// its own terms.
pub fn overall_progress(agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    let completed = agents
        .iter()
        .filter(|a| a.status == AgentStatus::Completed)
        .count();
    (completed as f64 / agents.len() as f64) * 100.0
}

/// The single reconciled view of the crew.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedCrewView {
    pub agents: Vec<Agent>,
    pub crew_status: CrewStatus,
    pub counts: AgentCounts,
    pub overall_progress_percent: f64,
}

impl UnifiedCrewView {
    pub fn new(agents: Vec<Agent>, crew_status: CrewStatus) -> Self {
        let mut view = Self {
            agents: Vec::new(),
            crew_status,
            counts: AgentCounts::default(),
            overall_progress_percent: 0.0,
        };
        view.replace_agents(agents);
        view
    }

    fn replace_agents(&mut self, agents: Vec<Agent>) {
        self.counts = AgentCounts::from_agents(&agents);
        self.overall_progress_percent = overall_progress(&agents);
        self.agents = agents;
    }
}

/// A poll result handed to the reconciler.
#[derive(Debug, Clone)]
pub enum SourceUpdate {
    Agents(Result<Vec<Agent>, CrewError>),
    CrewStatus(Result<CrewStatus, CrewError>),
    CrewStats(Result<CrewStats, CrewError>),
}

impl SourceUpdate {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Agents(_) => Endpoint::Agents,
            Self::CrewStatus(_) => Endpoint::CrewStatus,
            Self::CrewStats(_) => Endpoint::CrewStats,
        }
    }

    pub fn error(&self) -> Option<&CrewError> {
        match self {
            Self::Agents(r) => r.as_ref().err(),
            Self::CrewStatus(r) => r.as_ref().err(),
            Self::CrewStats(r) => r.as_ref().err(),
        }
    }
}

#[derive(Debug, Default)]
struct SourceHealth {
    succeeded: bool,
    failed: bool,
    consecutive_failures: u32,
    last_error: Option<CrewError>,
}

impl SourceHealth {
    fn record_success(&mut self) {
        self.succeeded = true;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    fn record_failure(&mut self, error: CrewError) {
        self.failed = true;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
    }
}

/// Owns the authoritative [`UnifiedCrewView`].
///
/// Each source only ever writes its own field, so results may arrive in any
/// order. A failed fetch keeps the last good value for that source.
#[derive(Debug, Default)]
pub struct Reconciler {
    view: UnifiedCrewView,
    stats: Option<CrewStats>,
    agents: SourceHealth,
    status: SourceHealth,
    crew_stats: SourceHealth,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one poll result into the view.
    ///
    /// Returns the new connection state when this update changed it.
    pub fn apply(&mut self, update: SourceUpdate) -> Option<ConnectionState> {
        let before = self.connection();
        match update {
            SourceUpdate::Agents(Ok(agents)) => {
                self.view.replace_agents(agents);
                self.agents.record_success();
            },
            SourceUpdate::Agents(Err(e)) => self.agents.record_failure(e),
            SourceUpdate::CrewStatus(Ok(status)) => {
                self.view.crew_status = status;
                self.status.record_success();
            },
            SourceUpdate::CrewStatus(Err(e)) => self.status.record_failure(e),
            SourceUpdate::CrewStats(Ok(stats)) => {
                self.stats = Some(stats);
                self.crew_stats.record_success();
            },
            SourceUpdate::CrewStats(Err(e)) => self.crew_stats.record_failure(e),
        }
        let after = self.connection();
        (before != after).then_some(after)
    }

    pub fn connection(&self) -> ConnectionState {
        if self.agents.succeeded || self.status.succeeded {
            ConnectionState::Connected
        } else if self.agents.failed && self.status.failed {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connecting
        }
    }

    /// The reconciled view, or `None` before any agents or status success.
    pub fn view(&self) -> Option<&UnifiedCrewView> {
        self.connection().is_connected().then_some(&self.view)
    }

    /// Last successfully polled crew status, `None` until the first success.
    pub fn crew_status(&self) -> Option<&CrewStatus> {
        self.status.succeeded.then_some(&self.view.crew_status)
    }

    /// Last successfully polled stats.
    pub fn stats(&self) -> Option<&CrewStats> {
        self.stats.as_ref()
    }

    pub fn last_error(&self, endpoint: Endpoint) -> Option<&CrewError> {
        self.health(endpoint).last_error.as_ref()
    }

    pub fn consecutive_failures(&self, endpoint: Endpoint) -> u32 {
        self.health(endpoint).consecutive_failures
    }

    fn health(&self, endpoint: Endpoint) -> &SourceHealth {
        match endpoint {
            Endpoint::Agents => &self.agents,
            Endpoint::CrewStatus => &self.status,
            Endpoint::CrewStats => &self.crew_stats,
        }
    }
}
