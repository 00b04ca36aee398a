use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tracker-server-rs",
        description = "GPS unit tracking API: reconstructs driving events from engine-duration metrics and ignition messages"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::units::get_unit,
        crate::routes::events::unit_events,
        crate::routes::events::unit_event_buckets,
        crate::routes::events::unit_events_for_ranges,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::events::RangeItem,
        crate::routes::events::RangesRequest,
        crate::store::telemetry::UnitFix,
        crate::events::TimeBucket,
        crate::events::MessageKind,
        crate::events::Message,
        crate::events::Episode,
        crate::events::DateRange,
        crate::events::Reconstruction,
    )),
    tags(
        (name = "units", description = "Unit lookups"),
        (name = "events", description = "Driving event reconstruction")
    )
)]
struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}
