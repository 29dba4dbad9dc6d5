use crate::cli::SandboxArgs;
use crate::infra::{load_directory, AppState, SandboxState};
use crate::routes::{sandbox_router, with_operational_routes};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use guarantor_intake::config::AppConfig;
use guarantor_intake::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, mut args: SandboxArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let directory = load_directory(args.zip_csv.as_deref())?;
    info!(zip_codes = directory.len(), "ZIP directory loaded");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_operational_routes(sandbox_router(SandboxState::new(directory)))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "guarantor intake sandbox ready");

    axum::serve(listener, app).await?;
    Ok(())
}
