use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_academic_routes;
use academia::academics::{ActivityLog, CatalogImporter, EventBus, InMemoryAcademicStore};
use academia::config::AppConfig;
use academia::error::AppError;
use academia::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
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

    let store = Arc::new(InMemoryAcademicStore::new());
    if let Some(path) = args.catalog.take() {
        let summary = CatalogImporter::from_path(&path, store.as_ref())?;
        info!(path = %path.display(), spaces = summary.spaces_created, "curriculum loaded");
    }

    let activity = Arc::new(ActivityLog::default());
    let events = EventBus::new().with_subscriber(activity.clone());
    let service = build_service(store.clone(), config.academics.clone(), events);
    service.check_schema()?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store,
        activity,
    };

    let app = with_academic_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "academic records service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
