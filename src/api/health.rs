use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;

use crate::controller::{AppState, SchedulerState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    scheduler: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_tick_age_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(last_tick_age_ms: Option<u64>) -> Self {
        Self {
            status: "healthy".to_string(),
            last_tick_age_ms,
            error: None,
        }
    }

    fn unhealthy(error: String, last_tick_age_ms: Option<u64>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            last_tick_age_ms,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The scheduler is healthy while running and ticking within a few intervals
async fn check_scheduler(state: &AppState) -> ComponentHealth {
    let status = state.scheduler.status().await;
    let age_ms = status
        .last_run
        .map(|t| (Utc::now() - t).num_milliseconds().max(0) as u64);
    let stale_after_ms = state.cfg.simulation.interval_ms.saturating_mul(5);

    match state.scheduler.state() {
        SchedulerState::Running => match age_ms {
            Some(age) if age > stale_after_ms => {
                ComponentHealth::unhealthy(format!("no tick for {} ms", age), age_ms)
            }
            _ => ComponentHealth::healthy(age_ms),
        },
        SchedulerState::Idle => ComponentHealth::unhealthy("scheduler not started".into(), age_ms),
        SchedulerState::Stopped => ComponentHealth::unhealthy("scheduler stopped".into(), age_ms),
    }
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let scheduler = check_scheduler(&state).await;
    let all_healthy = scheduler.is_healthy();

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        checks: HealthChecks { scheduler },
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// GET /health/ready - Ready once the scheduler is running
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.scheduler.state() {
        SchedulerState::Running => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health/live - Returns 200 if the process is running
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
