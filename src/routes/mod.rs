pub mod events;
pub mod health;
pub mod units;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(units::router())
                .merge(events::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
