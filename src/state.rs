use crate::config::TrackerConfig;
use crate::store::{MetricsStore, TelemetryStore};

#[derive(Clone)]
pub struct AppState {
    pub config: TrackerConfig,
    pub metrics: MetricsStore,
    pub telemetry: TelemetryStore,
}
