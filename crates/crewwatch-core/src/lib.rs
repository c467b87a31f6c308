pub mod control;
pub mod error;
pub mod gateway;
pub mod model;
pub mod notification;
pub mod reconciler;
pub mod snapshot;

pub use control::ControlState;
pub use error::CrewError;
pub use gateway::CrewGateway;
pub use model::{Agent, AgentStatus, CommandKind, CrewRunState, CrewStats, CrewStatus, Endpoint};
pub use notification::{Notification, NotificationSink, Severity};
pub use reconciler::{ConnectionState, Reconciler, SourceUpdate, UnifiedCrewView};
pub use snapshot::MonitorSnapshot;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::model::{Agent, AgentStatus, CrewRunState, CrewStats, CrewStatus};

    /// Create an agent with a generic role.
    pub fn make_agent(name: &str, status: AgentStatus) -> Agent {
        Agent::new(name, format!("{name} role"), status)
    }

    /// Create agents from `(name, status)` pairs, preserving order.
    pub fn make_agents(pairs: &[(&str, AgentStatus)]) -> Vec<Agent> {
        pairs.iter()
            .map(|(name, status)| make_agent(name, *status))
            .collect()
    }

    pub fn make_status(state: CrewRunState) -> CrewStatus {
        CrewStatus::new(state)
    }

    /// Stats as reported by an engine that has finished `completed` runs.
    pub fn make_stats(active: u32, completed: u32) -> CrewStats {
        CrewStats {
            active_agents: active,
            completed_tasks: completed,
            success_rate: if completed > 0 { 100.0 } else { 0.0 },
            average_time: "1m".to_string(),
        }
    }
}
