use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::{map_db_error, map_events_error};
use crate::events::{
    self, containment, DateRange, Granularity, Reconstruction, ReconstructOptions, TimeBucket,
};
use crate::ids::verify_unit_id;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct EventsQuery {
    /// Start of the window; RFC 3339 or YYYY-MM-DD. Both or neither of
    /// `from_utc`/`to_utc` must be given.
    from_utc: Option<String>,
    /// End of the window; a date-only value covers the whole end date.
    to_utc: Option<String>,
    #[serde(default = "default_time_zone")]
    time_zone: String,
    /// Match ignition messages to episode boundaries.
    #[serde(default = "default_true")]
    messages: bool,
    /// Annotate each episode with its traveled distance.
    #[serde(default = "default_true")]
    distance: bool,
}

#[utoipa::path(
    get,
    path = "/api/units/{id}/events",
    tag = "events",
    params(
        ("id" = String, Path, description = "Unit id (IMEI suffix)"),
        EventsQuery
    ),
    responses(
        (status = 200, description = "Reconstructed driving events", body = Reconstruction),
        (status = 400, description = "Invalid unit id or range"),
        (status = 500, description = "Store fetch failed")
    )
)]
pub(crate) async fn unit_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Reconstruction>, (StatusCode, String)> {
    if !verify_unit_id(&id) {
        return Err((StatusCode::BAD_REQUEST, "Invalid unit id".to_string()));
    }

    let options = ReconstructOptions {
        include_messages: query.messages,
        include_distance: query.distance,
    };
    let reconstruction = events::reconstruct(
        &state.metrics,
        &state.telemetry,
        &id,
        &query.time_zone,
        query.from_utc.as_deref(),
        query.to_utc.as_deref(),
        options,
    )
    .await
    .map_err(map_events_error)?;

    Ok(Json(reconstruction))
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct BucketsQuery {
    #[serde(default = "default_time_zone")]
    time_zone: String,
}

#[utoipa::path(
    get,
    path = "/api/units/{id}/events/{period}",
    tag = "events",
    params(
        ("id" = String, Path, description = "Unit id (IMEI suffix)"),
        ("period" = String, Path, description = "Bucket width: day, hour or minute"),
        BucketsQuery
    ),
    responses(
        (status = 200, description = "Raw duration-sum buckets over the default range", body = Vec<TimeBucket>),
        (status = 400, description = "Invalid unit id or period"),
        (status = 500, description = "Store fetch failed")
    )
)]
pub(crate) async fn unit_event_buckets(
    State(state): State<AppState>,
    Path((id, period)): Path<(String, String)>,
    Query(query): Query<BucketsQuery>,
) -> Result<Json<Vec<TimeBucket>>, (StatusCode, String)> {
    let Some(granularity) = Granularity::parse(&period) else {
        return Err((StatusCode::BAD_REQUEST, "Invalid time period".to_string()));
    };
    if !verify_unit_id(&id) {
        return Err((StatusCode::BAD_REQUEST, "Invalid unit id".to_string()));
    }

    let range = events::range::resolve(None, None).map_err(map_events_error)?;
    let buckets = state
        .metrics
        .duration_sums(&id, granularity, &query.time_zone, range)
        .await
        .map_err(map_db_error)?;

    Ok(Json(buckets))
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub(crate) struct RangeItem {
    from_utc: Option<String>,
    to_utc: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub(crate) struct RangesRequest {
    ranges: Vec<RangeItem>,
    #[serde(default = "default_time_zone")]
    time_zone: String,
    #[serde(default = "default_true")]
    messages: bool,
    #[serde(default = "default_true")]
    distance: bool,
}

#[utoipa::path(
    post,
    path = "/api/units/{id}/events",
    tag = "events",
    params(("id" = String, Path, description = "Unit id (IMEI suffix)")),
    request_body = RangesRequest,
    responses(
        (status = 200, description = "One reconstruction per requested range", body = Vec<Reconstruction>),
        (status = 400, description = "Invalid unit id, range set or range"),
        (status = 500, description = "Store fetch failed")
    )
)]
pub(crate) async fn unit_events_for_ranges(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RangesRequest>,
) -> Result<Json<Vec<Reconstruction>>, (StatusCode, String)> {
    if !verify_unit_id(&id) {
        return Err((StatusCode::BAD_REQUEST, "Invalid unit id".to_string()));
    }
    if request.ranges.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "POST body needs a set of ranges".to_string(),
        ));
    }

    let mut ranges = Vec::with_capacity(request.ranges.len());
    for item in &request.ranges {
        let range = events::range::resolve(item.from_utc.as_deref(), item.to_utc.as_deref())
            .map_err(map_events_error)?;
        ranges.push(range);
    }

    let mut sorted: Vec<DateRange> = ranges.clone();
    sorted.sort_by_key(|range| range.start);
    if sorted.windows(2).any(|pair| pair[1].start < pair[0].end) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Requested ranges must not overlap".to_string(),
        ));
    }

    let options = ReconstructOptions {
        include_messages: request.messages,
        include_distance: request.distance,
    };
    let lookups = ranges.iter().map(|range| {
        events::reconstruct_range(
            &state.metrics,
            &state.telemetry,
            &id,
            &request.time_zone,
            *range,
            options,
        )
    });
    let mut results = futures::future::try_join_all(lookups)
        .await
        .map_err(map_events_error)?;

    // Episodes are only returned when they fall inside one of the requested
    // ranges.
    for result in &mut results {
        result
            .events
            .retain(|episode| containment::episode_in_ranges(episode, &sorted));
    }

    Ok(Json(results))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/units/{id}/events",
            get(unit_events).post(unit_events_for_ranges),
        )
        .route("/units/{id}/events/{period}", get(unit_event_buckets))
}
