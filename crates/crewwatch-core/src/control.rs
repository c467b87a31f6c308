use serde::Serialize;

use crate::model::{CommandKind, CrewRunState};

/// What the crew control shows.
///
/// Derived from the engine's reported run state. `Transitioning` is purely
/// local feedback while a command is in flight. `Unknown` until crew status
/// has been read at least once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    #[default]
    Unknown,
    Idle,
    Running,
    Transitioning,
    Error,
}

impl ControlState {
    pub fn derive(run_state: Option<CrewRunState>, command_in_flight: bool) -> Self {
        if command_in_flight {
            return Self::Transitioning;
        }
        match run_state {
            None => Self::Unknown,
            Some(CrewRunState::Idle) => Self::Idle,
            Some(CrewRunState::Running) => Self::Running,
            Some(CrewRunState::Error) => Self::Error,
        }
    }

    /// The command the control button issues, if it is enabled.
    pub fn primary_action(self) -> Option<CommandKind> {
        match self {
            Self::Running => Some(CommandKind::Stop),
            Self::Idle | Self::Error => Some(CommandKind::Start),
            Self::Transitioning | Self::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Crew Idle",
            Self::Running => "Crew Active",
            Self::Transitioning => "Working...",
            Self::Error => "Error",
            Self::Unknown => "Status Unknown",
        }
    }
}
