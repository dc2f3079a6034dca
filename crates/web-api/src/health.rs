//! 健康检查接口（公开，不经过访问控制）

use std::sync::Arc;

use application::{HealthOptions, HealthReport, HealthReporter};
use axum::{extract::Query, extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct HealthQuery {
    #[serde(default)]
    detailed: bool,
}

pub fn health_routes(reporter: Arc<HealthReporter>) -> Router {
    Router::new()
        .route("/health", get(health).post(forced_health))
        .with_state(reporter)
}

fn respond(report: HealthReport) -> (StatusCode, Json<HealthReport>) {
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

async fn health(
    State(reporter): State<Arc<HealthReporter>>,
    Query(query): Query<HealthQuery>,
) -> (StatusCode, Json<HealthReport>) {
    let report = reporter
        .check(HealthOptions {
            detailed: query.detailed,
            forced: false,
        })
        .await;
    respond(report)
}

/// 强制验证：重新获取连接并 ping 后再执行探测查询
async fn forced_health(
    State(reporter): State<Arc<HealthReporter>>,
    Query(query): Query<HealthQuery>,
) -> (StatusCode, Json<HealthReport>) {
    let report = reporter
        .check(HealthOptions {
            detailed: query.detailed,
            forced: true,
        })
        .await;
    tracing::info!(healthy = report.is_healthy(), "forced health check");
    respond(report)
}
