use std::collections::HashMap;

use tokio::sync::oneshot;

use crewwatch_core::error::CrewError;
use crewwatch_core::model::{CommandKind, Endpoint};
use crewwatch_core::notification::{Notification, Severity};

/// How a `start`/`stop` call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The engine acknowledged the command.
    Acknowledged,
    /// A command of the same kind was already outstanding; nothing was sent.
    Coalesced,
}

impl CommandOutcome {
    pub fn is_acknowledged(self) -> bool {
        self == Self::Acknowledged
    }
}

pub type CommandResult = Result<CommandOutcome, CrewError>;
pub type CommandReply = oneshot::Sender<CommandResult>;

/// Effects of a finished command, applied by the monitor in order:
/// forced polls, then the notification, then the reply.
#[derive(Debug)]
pub struct CommandCompletion {
    pub kind: CommandKind,
    pub force_polls: &'static [Endpoint],
    pub message: String,
    pub severity: Severity,
    pub result: CommandResult,
    pub reply: Option<CommandReply>,
}

/// Endpoints refreshed right after `kind` is acknowledged.
pub fn refresh_after(kind: CommandKind) -> &'static [Endpoint] {
    match kind {
        CommandKind::Start => &[Endpoint::CrewStatus, Endpoint::Agents],
        CommandKind::Stop => &[Endpoint::CrewStatus],
    }
}

/// Enforces at most one outstanding command per kind.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    pending: HashMap<CommandKind, Option<CommandReply>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a command. Returns false, and answers `reply` with
    /// [`CommandOutcome::Coalesced`], when one of the same kind is outstanding.
    pub fn begin(&mut self, kind: CommandKind, reply: Option<CommandReply>) -> bool {
        if self.pending.contains_key(&kind) {
            if let Some(reply) = reply {
                let _ = reply.send(Ok(CommandOutcome::Coalesced));
            }
            return false;
        }
        self.pending.insert(kind, reply);
        true
    }

    pub fn finish(&mut self, kind: CommandKind, result: Result<(), CrewError>) -> CommandCompletion {
        let reply = self.pending.remove(&kind).flatten();
        match result {
            Ok(()) => {
                let (message, severity) = Notification::command_succeeded(kind);
                CommandCompletion {
                    kind,
                    force_polls: refresh_after(kind),
                    message,
                    severity,
                    result: Ok(CommandOutcome::Acknowledged),
                    reply,
                }
            },
            Err(e) => {
                let error = e.into_command_error(kind);
                let (message, severity) = Notification::command_failed(kind, &error);
                CommandCompletion {
                    kind,
                    force_polls: &[],
                    message,
                    severity,
                    result: Err(error),
                    reply,
                }
            },
        }
    }

    pub fn is_in_flight(&self, kind: CommandKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Outstanding commands in a stable order.
    pub fn in_flight(&self) -> Vec<CommandKind> {
        CommandKind::ALL
            .into_iter()
            .filter(|k| self.pending.contains_key(k))
            .collect()
    }
}
