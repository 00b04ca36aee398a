use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::map_db_error;
use crate::ids::verify_unit_id;
use crate::state::AppState;
use crate::store::telemetry::UnitFix;

#[utoipa::path(
    get,
    path = "/api/units/{id}",
    tag = "units",
    params(("id" = String, Path, description = "Unit id (IMEI suffix, more than 10 characters)")),
    responses(
        (status = 200, description = "Last recorded fix for the unit", body = UnitFix),
        (status = 400, description = "Invalid unit id"),
        (status = 404, description = "No reports for the unit")
    )
)]
pub(crate) async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UnitFix>, (StatusCode, String)> {
    if !verify_unit_id(&id) {
        return Err((StatusCode::BAD_REQUEST, "Invalid unit id".to_string()));
    }

    let fix = state.telemetry.latest_fix(&id).await.map_err(map_db_error)?;
    fix.map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No reports for unit".to_string()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/units/{id}", get(get_unit))
}
