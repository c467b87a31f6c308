use crate::model::CommandKind;

/// Every failure the core can observe.
///
/// A gateway call fails with exactly one of the first four variants.
/// `CommandRejected` is produced by command dispatch only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrewError {
    #[error("request timed out")]
    Timeout,
    #[error("crew engine unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("crew engine returned HTTP {0}")]
    ServerError(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("{kind} command rejected: {reason}")]
    CommandRejected { kind: CommandKind, reason: String },
}

impl CrewError {
    /// Reclassify a gateway failure of `kind` for the operator.
    ///
    /// A 4xx answer means the engine understood the command and refused it
    /// (for example starting a crew that is already running).
    pub fn into_command_error(self, kind: CommandKind) -> Self {
        match self {
            Self::ServerError(code) if (400..500).contains(&code) => Self::CommandRejected {
                kind,
                reason: format!("engine answered HTTP {code}"),
            },
            other => other,
        }
    }

    /// Short label used in structured logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NetworkUnreachable(_) => "network_unreachable",
            Self::ServerError(_) => "server_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::CommandRejected { .. } => "command_rejected",
        }
    }
}
