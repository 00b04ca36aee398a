use crate::config::TrackerConfig;
use crate::db;
use crate::state::AppState;
use crate::store::{MetricsStore, TelemetryStore};

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        metrics_database_url: "postgresql://postgres@localhost/postgres".to_string(),
    }
}

pub fn test_state() -> AppState {
    let config = test_config();
    let telemetry_pool = db::connect_lazy(&config.database_url).expect("connect_lazy");
    let metrics_pool = db::connect_lazy(&config.metrics_database_url).expect("connect_lazy");

    AppState {
        config,
        metrics: MetricsStore::new(metrics_pool),
        telemetry: TelemetryStore::new(telemetry_pool),
    }
}
