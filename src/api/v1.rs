use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{error::ApiError, live, response::ApiResponse},
    controller::{AppState, SchedulerState, TaskStatus},
    domain::{Reading, SensorDefinition},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sensors", get(list_sensors))
        .route("/sensors/:id", get(get_sensor))
        .route("/readings", get(get_readings))
        .route("/readings/live", get(live::live_readings))
        .route("/simulation/reset", post(reset_simulation))
        .route("/simulation/status", get(simulation_status))
        .with_state(state)
}

/// GET /api/v1/sensors - configured sensor definitions, in order
pub async fn list_sensors(
    State(st): State<AppState>,
) -> Json<ApiResponse<Vec<SensorDefinition>>> {
    let sensors = st.engine.sensors().to_vec();
    let count = sensors.len();
    Json(ApiResponse::success(sensors).with_count(count))
}

/// GET /api/v1/sensors/:id - one definition plus its latest reading
pub async fn get_sensor(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SensorDetail>>, ApiError> {
    let definition = st
        .engine
        .sensors()
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("sensor {}", id)))?;
    let latest = st
        .engine
        .last_batch()
        .iter()
        .find(|r| r.sensor_id == id)
        .cloned();

    Ok(Json(ApiResponse::success(SensorDetail { definition, latest })))
}

#[derive(Debug, Serialize)]
pub struct SensorDetail {
    pub definition: SensorDefinition,
    pub latest: Option<Reading>,
}

/// GET /api/v1/readings - most recent batch (empty before the first tick)
pub async fn get_readings(State(st): State<AppState>) -> Json<ApiResponse<Vec<Reading>>> {
    let batch = st.engine.last_batch().to_vec();
    let count = batch.len();
    Json(ApiResponse::success(batch).with_count(count))
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: String,
    pub message: String,
}

/// POST /api/v1/simulation/reset - restart every sensor near its midpoint
pub async fn reset_simulation(
    State(st): State<AppState>,
    query: Result<Query<ResetQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ResetResponse>>, ApiError> {
    let Query(q) = query?;
    match q.seed {
        Some(seed) => st.engine.reset_with_seed(seed),
        None => st.engine.reset(),
    }
    Ok(Json(ApiResponse::success(ResetResponse {
        status: "success".to_string(),
        message: "simulation reset".to_string(),
    })))
}

#[derive(Debug, Serialize)]
pub struct SimulationStatus {
    pub scheduler: SchedulerState,
    pub interval_ms: u64,
    pub seeded: bool,
    pub ticks: u64,
    pub sinks: Vec<&'static str>,
    pub task: TaskStatus,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /api/v1/simulation/status - scheduler and tick loop state
pub async fn simulation_status(
    State(st): State<AppState>,
) -> Json<ApiResponse<SimulationStatus>> {
    let status = SimulationStatus {
        scheduler: st.scheduler.state(),
        interval_ms: st.cfg.simulation.interval_ms,
        seeded: st.cfg.simulation.seed.is_some(),
        ticks: st.engine.tick_count(),
        sinks: st.engine.sinks().names(),
        task: st.scheduler.status().await,
        uptime_seconds: st.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(ApiResponse::success(status))
}
