use serde::Serialize;

use crate::control::ControlState;
use crate::model::{CommandKind, CrewStats};
use crate::notification::{Notification, NotificationSink};
use crate::reconciler::{ConnectionState, Reconciler, UnifiedCrewView};

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub view: Option<UnifiedCrewView>,
    pub stats: Option<CrewStats>,
    pub connection: ConnectionState,
    pub control: ControlState,
    pub notification: Option<Notification>,
    pub commands_in_flight: Vec<CommandKind>,
}

impl MonitorSnapshot {
    pub fn capture(
        reconciler: &Reconciler,
        notifications: &NotificationSink,
        commands_in_flight: Vec<CommandKind>,
    ) -> Self {
        let view = reconciler.view().cloned();
        let run_state = reconciler.crew_status().map(|s| s.status);
        Self {
            control: ControlState::derive(run_state, !commands_in_flight.is_empty()),
            stats: reconciler.stats().cloned(),
            connection: reconciler.connection(),
            notification: notifications.visible().cloned(),
            commands_in_flight,
            view,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn overall_progress_percent(&self) -> f64 {
        self.view
            .as_ref()
            .map_or(0.0, |v| v.overall_progress_percent)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::model::{CrewRunState, CrewStatus};
    use crate::notification::Severity;
    use crate::reconciler::SourceUpdate;

    #[test]
    fn empty_snapshot_is_not_connected() {
        let snap = MonitorSnapshot::capture(&Reconciler::new(), &NotificationSink::default(), vec![]);
        assert!(!snap.is_connected());
        assert!(snap.view.is_none());
        assert_eq!(snap.control, ControlState::Unknown);
        assert_eq!(snap.overall_progress_percent(), 0.0);
    }

    #[test]
    fn agents_alone_leave_control_unknown() {
        let mut reconciler = Reconciler::new();
        reconciler.apply(SourceUpdate::Agents(Ok(vec![])));
        let snap = MonitorSnapshot::capture(&reconciler, &NotificationSink::default(), vec![]);
        assert!(snap.is_connected());
        assert_eq!(snap.control, ControlState::Unknown);
        assert_eq!(snap.control.primary_action(), None);

        reconciler.apply(SourceUpdate::CrewStatus(Ok(CrewStatus::new(CrewRunState::Idle))));
        let snap = MonitorSnapshot::capture(&reconciler, &NotificationSink::default(), vec![]);
        assert_eq!(snap.control, ControlState::Idle);
    }

    #[test]
    fn capture_reflects_state() {
        let mut reconciler = Reconciler::new();
        reconciler.apply(SourceUpdate::CrewStatus(Ok(CrewStatus::new(
            CrewRunState::Running,
        ))));
        let mut sink = NotificationSink::default();
        sink.publish("ok".to_string(), Severity::Success, Instant::now());

        let snap = MonitorSnapshot::capture(&reconciler, &sink, vec![]);
        assert!(snap.is_connected());
        assert_eq!(snap.control, ControlState::Running);
        assert_eq!(snap.notification.as_ref().unwrap().message, "ok");

        let busy = MonitorSnapshot::capture(&reconciler, &sink, vec![CommandKind::Stop]);
        assert_eq!(busy.control, ControlState::Transitioning);
    }
}
