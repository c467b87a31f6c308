use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single agent as reported by the crew engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    /// Older engine builds report a working agent as `active`.
    #[serde(alias = "active")]
    Running,
    Completed,
    Error,
}

/// One agent of the crew. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: impl Into<String>, status: AgentStatus) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            status,
            goal: None,
        }
    }
}

/// Overall run state of the crew engine, independent of individual agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewRunState {
    /// A finished run (`completed` on the wire) leaves the engine idle.
    #[default]
    #[serde(alias = "completed")]
    Idle,
    Running,
    Error,
}

/// Response of `GET /crew/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewStatus {
    pub status: CrewRunState,
    #[serde(default, alias = "start_time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrewStatus {
    pub fn new(status: CrewRunState) -> Self {
        Self {
            status,
            start_time: None,
            error: None,
        }
    }
}

/// Response of `GET /crew/stats`. Reported by the engine, never computed locally.
///
/// Both the camelCase contract and the engine's snake_case field names are
/// accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewStats {
    #[serde(default, alias = "active_agents")]
    pub active_agents: u32,
    #[serde(default, alias = "completed_tasks")]
    pub completed_tasks: u32,
    /// Percentage in `0..=100`.
    #[serde(default, alias = "success_rate")]
    pub success_rate: f64,
    #[serde(default = "default_average_time", alias = "average_time")]
    pub average_time: String,
}

fn default_average_time() -> String {
    "0m".to_string()
}

impl Default for CrewStats {
    fn default() -> Self {
        Self {
            active_agents: 0,
            completed_tasks: 0,
            success_rate: 0.0,
            average_time: default_average_time(),
        }
    }
}

/// Operator command sent to the crew engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Start,
    Stop,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Start, CommandKind::Stop];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polled data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Agents,
    CrewStatus,
    CrewStats,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::Agents, Endpoint::CrewStatus, Endpoint::CrewStats];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::CrewStatus => "crew_status",
            Self::CrewStats => "crew_stats",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
