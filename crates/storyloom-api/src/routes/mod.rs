//! Route modules.

pub mod generate;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Assembles every route. Layers are added by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api", generate::router())
}
