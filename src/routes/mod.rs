use axum::Router;

use crate::state::SharedState;

pub mod debug;
pub mod docs;
pub mod flashcards;
pub mod health;
pub mod matches;
pub mod sse;
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let mut api_router = health::router()
        .merge(matches::router())
        .merge(sse::router())
        .merge(flashcards::router())
        .merge(users::router());

    if state.config().expose_debug_routes {
        api_router = api_router.merge(debug::router());
    }

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
