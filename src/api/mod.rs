pub mod error;
pub mod health;
pub mod live;
pub mod response;
pub mod v1;

use axum::{routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;

use crate::{config::Config, controller::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let health = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .with_state(state.clone());

    let mut router = Router::new()
        .nest("/api/v1", v1::router(state))
        .merge(health);

    if cfg.server.enable_cors {
        use tower_http::cors::AllowOrigin;
        match cfg.server.cors_origin.parse::<axum::http::HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(AllowOrigin::exact(origin))
                    .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                    .allow_headers([axum::http::header::CONTENT_TYPE]);
                router = router.layer(cors);
            }
            Err(_) => warn!(origin = %cfg.server.cors_origin, "invalid CORS origin, CORS disabled"),
        }
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}
