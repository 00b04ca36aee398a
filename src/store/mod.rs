pub mod metrics;
pub mod telemetry;

pub use metrics::MetricsStore;
pub use telemetry::TelemetryStore;
