use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

use crewwatch_http::{HttpGateway, HttpGatewayConfig};
use crewwatch_monitor::{CrewMonitor, MonitorHandle, MonitorSettings};

/// Mutable state behind the fake crew engine.
#[derive(Debug, Default)]
pub struct EngineState {
    pub running: bool,
    pub agents: Vec<(String, String)>,
    pub start_requests: usize,
    pub stop_requests: usize,
}

type Shared = Arc<Mutex<EngineState>>;

/// A minimal crew engine speaking the HTTP contract, bound to an ephemeral port.
pub struct FakeEngine {
    pub addr: SocketAddr,
    pub state: Shared,
    _server: tokio::task::JoinHandle<()>,
}

impl FakeEngine {
    /// An idle crew with the given `(name, status)` agents.
    pub async fn new(agents: &[(&str, &str)]) -> Self {
        let state: Shared = Arc::new(Mutex::new(EngineState {
            agents: agents
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string()))
                .collect(),
            ..EngineState::default()
        }));

        let app = Router::new()
            .route("/agents", get(self::agents))
            .route("/crew/status", get(status))
            .route("/crew/stats", get(stats))
            .route("/crew/start", post(start))
            .route("/crew/stop", post(stop))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Overwrite one agent's reported status.
    pub fn set_agent_status(&self, name: &str, status: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(agent) = state.agents.iter_mut().find(|(n, _)| n == name) {
            agent.1 = status.to_string();
        }
    }

    pub fn start_requests(&self) -> usize {
        self.state.lock().unwrap().start_requests
    }

    pub fn stop_requests(&self) -> usize {
        self.state.lock().unwrap().stop_requests
    }

    /// Spawn a monitor against this engine with short poll intervals.
    pub fn monitor(&self) -> MonitorHandle {
        let gateway = HttpGateway::new(HttpGatewayConfig {
            base_url: self.base_url(),
            request_timeout: Duration::from_secs(2),
            ..HttpGatewayConfig::default()
        })
        .unwrap();
        CrewMonitor::spawn(gateway, fast_settings())
    }
}

pub fn fast_settings() -> MonitorSettings {
    MonitorSettings {
        agents_interval: Duration::from_millis(50),
        status_interval: Duration::from_millis(50),
        stats_interval: Duration::from_millis(100),
        notification_ttl: Duration::from_secs(6),
    }
}

/// Wait until `pred` holds for the latest snapshot, or panic after 5s.
pub async fn wait_for(
    handle: &MonitorHandle,
    what: &str,
    pred: impl Fn(&crewwatch_core::MonitorSnapshot) -> bool,
) {
    let mut rx = handle.subscribe();
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return;
            }
            if rx.changed().await.is_err() {
                panic!("monitor stopped while waiting for {what}");
            }
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {what}");
}

async fn agents(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let agents: Vec<Value> = state
        .agents
        .iter()
        .map(|(name, status)| json!({"name": name, "role": "Worker", "status": status}))
        .collect();
    Json(Value::Array(agents))
}

async fn status(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let status = if state.running { "running" } else { "idle" };
    Json(json!({"status": status, "startTime": null, "error": null}))
}

async fn stats(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let active = if state.running { state.agents.len() } else { 0 };
    Json(json!({
        "active_agents": active,
        "completed_tasks": state.stop_requests,
        "success_rate": 100,
        "average_time": "0m"
    }))
}

async fn start(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.start_requests += 1;
    if state.running {
        return rejected("Crew is already running");
    }
    state.running = true;
    for agent in state.agents.iter_mut() {
        agent.1 = "running".to_string();
    }
    Json(json!({"status": "started"})).into_response()
}

async fn stop(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.stop_requests += 1;
    if !state.running {
        return rejected("Crew is not running");
    }
    state.running = false;
    Json(json!({"status": "stopped"})).into_response()
}

fn rejected(detail: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"detail": detail}))).into_response()
}
