use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::json;

use crewwatch_core::error::CrewError;
use crewwatch_core::gateway::CrewGateway;
use crewwatch_core::model::{AgentStatus, CommandKind, CrewRunState};
use crewwatch_http::{HttpGateway, HttpGatewayConfig};

/// Serve `app` on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    format!("http://{addr}")
}

fn gateway(base_url: &str, timeout: Duration) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig {
        base_url: base_url.to_string(),
        request_timeout: timeout,
        ..HttpGatewayConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_all_sources() {
    let app = Router::new()
        .route(
            "/agents",
            get(|| async {
                axum::Json(json!([
                    {"name": "collector", "role": "Data Collector", "status": "completed"},
                    {"name": "analyst", "role": "Analyst", "status": "running"}
                ]))
            }),
        )
        .route(
            "/crew/status",
            get(|| async {
                axum::Json(json!({"status": "running", "startTime": "2026-01-01 09:00:00", "error": null}))
            }),
        )
        .route(
            "/crew/stats",
            get(|| async {
                axum::Json(json!({
                    "active_agents": 2,
                    "completed_tasks": 1,
                    "success_rate": 100,
                    "average_time": "3m"
                }))
            }),
        );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_secs(5));

    let agents = gw.fetch_agents().await.unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].name, "collector");
    assert_eq!(agents[1].status, AgentStatus::Running);

    let status = gw.fetch_crew_status().await.unwrap();
    assert_eq!(status.status, CrewRunState::Running);
    assert_eq!(status.start_time.as_deref(), Some("2026-01-01 09:00:00"));

    let stats = gw.fetch_crew_stats().await.unwrap();
    assert_eq!(stats.active_agents, 2);
    assert_eq!(stats.average_time, "3m");
}

#[tokio::test]
async fn server_error_is_classified() {
    let app = Router::new().route(
        "/crew/status",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_secs(5));

    let err = gw.fetch_crew_status().await.unwrap_err();
    assert_eq!(err, CrewError::ServerError(500));
}

#[tokio::test]
async fn missing_route_is_server_error() {
    let base = serve(Router::new()).await;
    let gw = gateway(&base, Duration::from_secs(5));

    let err = gw.fetch_agents().await.unwrap_err();
    assert_eq!(err, CrewError::ServerError(404));
}

#[tokio::test]
async fn malformed_body_is_classified() {
    let app = Router::new()
        .route("/agents", get(|| async { "<html>not json</html>" }))
        .route(
            "/crew/status",
            get(|| async { axum::Json(json!({"status": "exploded"})) }),
        );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_secs(5));

    assert!(matches!(
        gw.fetch_agents().await.unwrap_err(),
        CrewError::MalformedResponse(_)
    ));
    assert!(matches!(
        gw.fetch_crew_status().await.unwrap_err(),
        CrewError::MalformedResponse(_)
    ));
}

#[tokio::test]
async fn slow_engine_times_out() {
    let app = Router::new().route(
        "/agents",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            axum::Json(json!([]))
        }),
    );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_millis(100));

    let err = gw.fetch_agents().await.unwrap_err();
    assert_eq!(err, CrewError::Timeout);
}

#[tokio::test]
async fn slow_command_times_out() {
    let app = Router::new().route(
        "/crew/start",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            axum::Json(json!({"status": "started"}))
        }),
    );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_millis(100));

    let err = gw.send_command(CommandKind::Start).await.unwrap_err();
    assert_eq!(err, CrewError::Timeout);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gw = gateway(&format!("http://{addr}"), Duration::from_secs(5));
    let err = gw.fetch_crew_stats().await.unwrap_err();
    assert!(
        matches!(err, CrewError::NetworkUnreachable(_)),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn commands_post_to_engine() {
    let app = Router::new()
        .route(
            "/crew/start",
            post(|| async { axum::Json(json!({"status": "started"})) }),
        )
        .route(
            "/crew/stop",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({"detail": "Crew is not running"})),
                )
            }),
        );
    let base = serve(app).await;
    let gw = gateway(&base, Duration::from_secs(5));

    gw.send_command(CommandKind::Start).await.unwrap();
    let err = gw.send_command(CommandKind::Stop).await.unwrap_err();
    assert_eq!(err, CrewError::ServerError(400));
}
