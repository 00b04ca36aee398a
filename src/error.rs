use axum::http::StatusCode;

use crate::events::EventsError;

pub fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    let status = match &err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("22P02") => StatusCode::BAD_REQUEST, // invalid_text_representation
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!(error = %err, status = %status, "database error");

    let message = match status {
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::BAD_REQUEST => "Invalid request",
        _ => "Database error",
    };

    (status, message.to_string())
}

pub fn map_events_error(err: EventsError) -> (StatusCode, String) {
    match &err {
        EventsError::InvalidRange { .. } | EventsError::InvalidDateFormat(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        EventsError::StoreFetch(db_err) => {
            tracing::error!(error = %db_err, "store fetch failed during event reconstruction");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Store fetch failed".to_string(),
            )
        }
    }
}
