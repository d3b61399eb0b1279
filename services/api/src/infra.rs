use academia::academics::{
    AcademicPolicy, AcademicService, ActivityLog, EventBus, InMemoryAcademicStore,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type MemoryService = AcademicService<InMemoryAcademicStore, InMemoryAcademicStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<InMemoryAcademicStore>,
    pub(crate) activity: Arc<ActivityLog>,
}

/// One store serves both records and correlativity rules.
pub(crate) fn build_service(
    store: Arc<InMemoryAcademicStore>,
    policy: AcademicPolicy,
    events: EventBus,
) -> Arc<MemoryService> {
    Arc::new(AcademicService::new(store.clone(), store, policy).with_events(events))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
