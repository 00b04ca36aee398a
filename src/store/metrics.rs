use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::events::{DateRange, Granularity, TimeBucket};

/// Read side of the time-series store: per-unit engine-duration and speed
/// samples in the `unit_metrics` hypertable. Units are matched by IMEI
/// suffix, the way the report log stores them.
#[derive(Clone)]
pub struct MetricsStore {
    pool: PgPool,
}

impl MetricsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sums of the engine-active seconds per bucket over the range,
    /// gap-filled so buckets without samples are present with a null sum.
    pub async fn duration_sums(
        &self,
        unit_id: &str,
        granularity: Granularity,
        time_zone: &str,
        range: DateRange,
    ) -> Result<Vec<TimeBucket>, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct BucketRow {
            bucket: DateTime<Utc>,
            total: Option<f64>,
        }

        let rows: Vec<BucketRow> = sqlx::query_as(
            r#"
            SELECT
              time_bucket_gapfill(make_interval(secs => $2), ts, $3, $4, $5) as bucket,
              sum(value) as total
            FROM unit_metrics
            WHERE metric = 'engine_seconds'
              AND unit_id LIKE '%' || $1
              AND ts > $4 AND ts < $5
            GROUP BY bucket
            ORDER BY bucket ASC
            "#,
        )
        .bind(unit_id)
        .bind(granularity.seconds())
        .bind(time_zone)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TimeBucket {
                time: row.bucket,
                sum: row.total,
            })
            .collect())
    }

    /// Traveled distance over the range as the trapezoidal time integral of
    /// the per-hour speed signal, divided by 3600 to normalize units. `None`
    /// when the range holds no samples. The time zone does not affect the
    /// integral; it is accepted for parity with `duration_sums`.
    pub async fn distance(
        &self,
        unit_id: &str,
        _time_zone: &str,
        range: DateRange,
    ) -> Result<Option<f64>, sqlx::Error> {
        let distance: Option<f64> = sqlx::query_scalar(
            r#"
            WITH samples AS (
              SELECT
                ts,
                value,
                lag(ts) OVER w as prev_ts,
                lag(value) OVER w as prev_value
              FROM unit_metrics
              WHERE metric = 'speed'
                AND unit_id LIKE '%' || $1
                AND ts > $2 AND ts < $3
              WINDOW w AS (ORDER BY ts)
            )
            SELECT sum(extract(epoch FROM ts - prev_ts) * (value + prev_value) / 2.0) / 3600.0
            FROM samples
            WHERE prev_ts IS NOT NULL
            "#,
        )
        .bind(unit_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(distance)
    }
}
