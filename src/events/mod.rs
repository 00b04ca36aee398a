pub mod containment;
pub mod matching;
pub mod range;
pub mod segment;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::{MetricsStore, TelemetryStore};

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("only received {supplied} '{value}'; both start and end must be given")]
    InvalidRange {
        supplied: &'static str,
        value: String,
    },
    #[error("invalid date '{0}'; expected an RFC 3339 timestamp or a YYYY-MM-DD date")]
    InvalidDateFormat(String),
    #[error("store fetch failed: {0}")]
    StoreFetch(#[from] sqlx::Error),
}

/// Bucket width for the duration-sum series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minute,
    Hour,
    Day,
}

impl Granularity {
    pub fn parse(period: &str) -> Option<Self> {
        match period {
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            _ => None,
        }
    }

    pub(crate) fn seconds(self) -> f64 {
        match self {
            Self::Minute => 60.0,
            Self::Hour => 3600.0,
            Self::Day => 86_400.0,
        }
    }
}

/// One aggregation bucket of engine-active seconds. `sum` is null for
/// gap-filled buckets with no samples.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct TimeBucket {
    pub time: DateTime<Utc>,
    pub sum: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub enum MessageKind {
    #[serde(rename = "ACCStart")]
    Start,
    #[serde(rename = "ACCStop")]
    Stop,
}

impl MessageKind {
    /// Literal message text in the report log.
    pub(crate) fn message_text(self) -> &'static str {
        match self {
            Self::Start => "ACCStart",
            Self::Stop => "ACCStop",
        }
    }
}

/// A discrete ignition transition read from the report log.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct Message {
    pub utc: DateTime<Utc>,
    #[serde(rename = "message")]
    pub kind: MessageKind,
}

/// A reconstructed continuous period of engine activity.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct Episode {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub engine_run_start: Option<DateTime<Utc>>,
    pub engine_run_stop: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
}

impl Episode {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            engine_run_start: None,
            engine_run_stop: None,
            distance: None,
        }
    }
}

/// Absolute, resolved query window.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct Reconstruction {
    pub range: DateRange,
    pub events: Vec<Episode>,
    pub unmatched_start_messages: Vec<Message>,
    pub unmatched_stop_messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconstructOptions {
    pub include_messages: bool,
    pub include_distance: bool,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            include_messages: true,
            include_distance: true,
        }
    }
}

/// Reconstructs driving events for a unit over the requested window.
///
/// The duration-sum and message reads are issued jointly; a failure in any of
/// them fails the whole reconstruction. Distance annotation is not
/// best-effort either: once requested, a failed lookup aborts the request.
pub async fn reconstruct(
    metrics: &MetricsStore,
    telemetry: &TelemetryStore,
    unit_id: &str,
    time_zone: &str,
    start: Option<&str>,
    end: Option<&str>,
    options: ReconstructOptions,
) -> Result<Reconstruction, EventsError> {
    let range = range::resolve(start, end)?;
    reconstruct_range(metrics, telemetry, unit_id, time_zone, range, options).await
}

/// As [`reconstruct`], for an already-resolved range.
pub async fn reconstruct_range(
    metrics: &MetricsStore,
    telemetry: &TelemetryStore,
    unit_id: &str,
    time_zone: &str,
    range: DateRange,
    options: ReconstructOptions,
) -> Result<Reconstruction, EventsError> {
    let (buckets, start_pool, stop_pool) = if options.include_messages {
        tokio::try_join!(
            metrics.duration_sums(unit_id, Granularity::Minute, time_zone, range),
            telemetry.messages(unit_id, MessageKind::Start, range),
            telemetry.messages(unit_id, MessageKind::Stop, range),
        )?
    } else {
        let buckets = metrics
            .duration_sums(unit_id, Granularity::Minute, time_zone, range)
            .await?;
        (buckets, Vec::new(), Vec::new())
    };

    let (mut events, unmatched_start_messages, unmatched_stop_messages) =
        assemble(&buckets, start_pool, stop_pool);

    if options.include_distance {
        annotate_distance(metrics, unit_id, time_zone, &mut events).await?;
    }

    Ok(Reconstruction {
        range,
        events,
        unmatched_start_messages,
        unmatched_stop_messages,
    })
}

/// Pure part of the reconstruction: segmentation followed by the two
/// matching passes. Operates on already-fetched data and cannot fail.
pub(crate) fn assemble(
    buckets: &[TimeBucket],
    start_pool: Vec<Message>,
    stop_pool: Vec<Message>,
) -> (Vec<Episode>, Vec<Message>, Vec<Message>) {
    let episodes = segment::segment_episodes(buckets);
    let (episodes, unmatched_start) =
        matching::attach_messages(episodes, start_pool, matching::Boundary::Start);
    let (episodes, unmatched_stop) =
        matching::attach_messages(episodes, stop_pool, matching::Boundary::Stop);
    (episodes, unmatched_start, unmatched_stop)
}

/// Looks up the traveled distance for each episode. Episodes whose window
/// holds no speed samples get a distance of 0.
async fn annotate_distance(
    metrics: &MetricsStore,
    unit_id: &str,
    time_zone: &str,
    episodes: &mut [Episode],
) -> Result<(), sqlx::Error> {
    let lookups = episodes.iter().map(|episode| {
        metrics.distance(
            unit_id,
            time_zone,
            DateRange {
                start: episode.start,
                end: episode.end,
            },
        )
    });
    let distances = futures::future::try_join_all(lookups).await?;

    for (episode, distance) in episodes.iter_mut().zip(distances) {
        episode.distance = Some(distance.unwrap_or(0.0));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 24, 12, minute, 0).unwrap()
    }

    fn bucket(minute: u32, sum: f64) -> TimeBucket {
        TimeBucket {
            time: ts(minute),
            sum: Some(sum),
        }
    }

    #[test]
    fn granularity_parses_known_periods_only() {
        assert_eq!(Granularity::parse("minute"), Some(Granularity::Minute));
        assert_eq!(Granularity::parse("hour"), Some(Granularity::Hour));
        assert_eq!(Granularity::parse("day"), Some(Granularity::Day));
        assert_eq!(Granularity::parse("week"), None);
        assert_eq!(Granularity::parse("Minute"), None);
    }

    #[test]
    fn assemble_attaches_both_boundary_messages() {
        let buckets = vec![bucket(0, 60.0), bucket(1, 60.0), bucket(2, 0.0)];
        let start_pool = vec![Message {
            utc: ts(0) - Duration::minutes(2),
            kind: MessageKind::Start,
        }];
        let stop_pool = vec![Message {
            utc: ts(2) + Duration::minutes(3),
            kind: MessageKind::Stop,
        }];

        let (events, unmatched_start, unmatched_stop) = assemble(&buckets, start_pool, stop_pool);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].engine_run_start, Some(ts(0) - Duration::minutes(2)));
        assert_eq!(events[0].engine_run_stop, Some(ts(2) + Duration::minutes(3)));
        assert!(unmatched_start.is_empty());
        assert!(unmatched_stop.is_empty());
        assert!(events[0].distance.is_none());
    }

    #[test]
    fn assemble_reports_leftover_messages() {
        let buckets = vec![bucket(0, 60.0), bucket(1, 60.0), bucket(2, 0.0)];
        let stray = Message {
            utc: ts(0) - Duration::minutes(45),
            kind: MessageKind::Start,
        };
        let (events, unmatched_start, unmatched_stop) =
            assemble(&buckets, vec![stray], Vec::new());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].engine_run_start, None);
        assert_eq!(unmatched_start, vec![stray]);
        assert!(unmatched_stop.is_empty());
    }

    #[test]
    fn assemble_with_empty_buckets_returns_pools_untouched() {
        let pool = vec![Message {
            utc: ts(5),
            kind: MessageKind::Start,
        }];
        let (events, unmatched_start, unmatched_stop) = assemble(&[], pool.clone(), Vec::new());

        assert!(events.is_empty());
        assert_eq!(unmatched_start, pool);
        assert!(unmatched_stop.is_empty());
    }

    #[test]
    fn message_kind_maps_to_report_log_text() {
        assert_eq!(MessageKind::Start.message_text(), "ACCStart");
        assert_eq!(MessageKind::Stop.message_text(), "ACCStop");
    }
}
