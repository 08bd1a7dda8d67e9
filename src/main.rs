use anyhow::Result;
use sensor_simulator::config::Config;
use sensor_simulator::telemetry::{self, init_tracing};
use sensor_simulator::{api, controller};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    let app_state = controller::AppState::new(cfg.clone())?;
    let app = api::router(app_state.clone(), &cfg);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "Server binding to 0.0.0.0 - the reset endpoint will be reachable from the network"
        );
    }

    info!(
        %addr,
        sensors = cfg.sensors.len(),
        interval_ms = cfg.simulation.interval_ms,
        "starting sensor simulator"
    );

    controller::spawn_controller_tasks(&app_state)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(controller::stop_on_signal(
            app_state.scheduler.clone(),
            telemetry::shutdown_signal(),
        ))
        .await?;

    // Ticking already stopped with the signal; wait for an in-flight tick.
    app_state.scheduler.shutdown().await;
    info!("shutdown complete");
    Ok(())
}
