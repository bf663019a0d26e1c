use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_data, AppState, InMemoryRecordStore, InMemoryReminderSender, LocalArtifactStore,
};
use crate::routes::with_compliance_routes;
use crate::scheduler;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staycompliant::config::AppConfig;
use staycompliant::error::AppError;
use staycompliant::telemetry;
use staycompliant::workflows::compliance::{
    Clock, ComplianceService, ReminderSweep, SystemClock,
};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryRecordStore::default());
    let artifacts = Arc::new(LocalArtifactStore);
    let sender = Arc::new(InMemoryReminderSender::default());
    let clock = Arc::new(SystemClock);

    if args.seed_demo {
        seed_demo_data(&store, clock.today());
        info!("seeded demo properties, bookings, and permits");
    }

    let compliance_service = Arc::new(ComplianceService::new(
        store.clone(),
        artifacts,
        clock.clone(),
    ));
    let sweep = Arc::new(ReminderSweep::new(
        store,
        sender,
        clock,
        config.reminders.clone(),
    ));

    let _sweep_scheduler = scheduler::start(sweep)
        .await
        .map_err(|err| AppError::Scheduler(Box::new(err)))?;

    let app = with_compliance_routes(compliance_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "compliance tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
