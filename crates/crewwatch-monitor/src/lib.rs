pub mod config;
pub mod dispatcher;
pub mod poller;
pub mod runtime;

pub use config::{ConfigError, MonitorConfig};
pub use dispatcher::{CommandOutcome, CommandResult};
pub use runtime::{CrewMonitor, MonitorHandle, MonitorSettings};
