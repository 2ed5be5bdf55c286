use crate::cli::ServeArgs;
use crate::infra::{seed_demo_users, AppState};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use schemz::config::AppConfig;
use schemz::error::AppError;
use schemz::telemetry;
use schemz::workflows::{InMemoryDocumentStore, WorkflowServices};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryDocumentStore::new());
    if config.store.seed_demo_data {
        let seeded = seed_demo_users(&store)?;
        info!(users = seeded, "seeded demo users into the document store");
    }
    let services = Arc::new(WorkflowServices::new(store));

    let app = with_workflow_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "scheme workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
