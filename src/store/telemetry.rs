use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::events::{DateRange, Message, MessageKind};

/// Last recorded report for a unit, valid GPS fixes only.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, utoipa::ToSchema)]
pub struct UnitFix {
    pub ts: DateTime<Utc>,
    pub message: String,
    pub lat: f64,
    pub lat_loc: String,
    pub long: f64,
    pub long_loc: String,
    pub ground_speed: f64,
    pub track: f64,
    pub satellites: i32,
    pub altitude: f64,
    pub charge: f64,
    pub charging: bool,
}

/// Read side of the report log: discrete unit reports carrying position and
/// ignition transition messages.
#[derive(Clone)]
pub struct TelemetryStore {
    pool: PgPool,
}

impl TelemetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ignition messages of one kind for the unit, most recent first. The
    /// reconstruction core compares timestamps and does not rely on this
    /// order.
    pub async fn messages(
        &self,
        unit_id: &str,
        kind: MessageKind,
        range: DateRange,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT ts
            FROM unit_reports
            WHERE ts BETWEEN $2 AND $3
              AND unit_id LIKE '%' || $1
              AND gps_signal = 'F'
              AND message = $4
            ORDER BY ts DESC
            "#,
        )
        .bind(unit_id)
        .bind(range.start)
        .bind(range.end)
        .bind(kind.message_text())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(utc,)| Message { utc, kind })
            .collect())
    }

    /// Most recent valid-signal report for the unit, if any.
    pub async fn latest_fix(&self, unit_id: &str) -> Result<Option<UnitFix>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT ts, message, lat, lat_loc, long, long_loc,
                   ground_speed, track, satellites, altitude, charge, charging
            FROM unit_reports
            WHERE unit_id LIKE '%' || $1
              AND gps_signal = 'F'
            ORDER BY ts DESC
            LIMIT 1
            "#,
        )
        .bind(unit_id)
        .fetch_optional(&self.pool)
        .await
    }
}
