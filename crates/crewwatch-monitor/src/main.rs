use tracing_subscriber::EnvFilter;

use crewwatch_core::snapshot::MonitorSnapshot;
use crewwatch_http::HttpGateway;
use crewwatch_monitor::{CrewMonitor, MonitorConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = MonitorConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    let gateway = match HttpGateway::new(config.gateway()) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!("Failed to build engine client: {e}");
            std::process::exit(1);
        },
    };
    tracing::info!(base_url = %gateway.base_url(), "Crewwatch monitor starting");

    let handle = CrewMonitor::spawn(gateway, config.settings());
    let mut snapshots = handle.subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                report(&snapshot);
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down");
                break;
            },
        }
    }

    handle.shutdown().await;
}

fn report(snapshot: &MonitorSnapshot) {
    match &snapshot.view {
        Some(view) => tracing::info!(
            connection = ?snapshot.connection,
            control = snapshot.control.label(),
            action = ?snapshot.control.primary_action(),
            agents = view.counts.total(),
            running = view.counts.running,
            completed = view.counts.completed,
            progress_pct = view.overall_progress_percent,
            "Crew updated"
        ),
        None => tracing::info!(connection = ?snapshot.connection, "Waiting for crew engine"),
    }
    if let Some(stats) = &snapshot.stats {
        tracing::debug!(
            active_agents = stats.active_agents,
            completed_tasks = stats.completed_tasks,
            success_rate = stats.success_rate,
            average_time = %stats.average_time,
            "Crew stats"
        );
    }
    if let Some(notification) = &snapshot.notification {
        tracing::info!(severity = ?notification.severity, "{}", notification.message);
    }
}
