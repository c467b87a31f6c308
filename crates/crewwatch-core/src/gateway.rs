use std::future::Future;

use crate::error::CrewError;
use crate::model::{Agent, CommandKind, CrewStats, CrewStatus};

/// Typed request/response boundary to the crew engine.
///
/// Implementations own request timeouts and classify every failure into one
/// of `Timeout`, `NetworkUnreachable`, `ServerError` or `MalformedResponse`.
/// They never retry; retry policy belongs to the poller.
pub trait CrewGateway: Send + Sync + 'static {
    fn fetch_agents(&self) -> impl Future<Output = Result<Vec<Agent>, CrewError>> + Send;

    fn fetch_crew_status(&self) -> impl Future<Output = Result<CrewStatus, CrewError>> + Send;

    fn fetch_crew_stats(&self) -> impl Future<Output = Result<CrewStats, CrewError>> + Send;

    /// Resolve once the engine acknowledged `kind` with any 2xx status.
    fn send_command(&self, kind: CommandKind) -> impl Future<Output = Result<(), CrewError>> + Send;
}
