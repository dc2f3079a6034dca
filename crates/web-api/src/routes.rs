use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::{auth::authorize, health::health_routes, resources::entity_routes, state::AppState};

pub fn router(state: AppState) -> Router {
    let AppState {
        repositories,
        health,
        gate,
    } = state;

    let entities = Router::new()
        .merge(entity_routes(repositories.caixa))
        .merge(entity_routes(repositories.cliente))
        .merge(entity_routes(repositories.fornecedor))
        .merge(entity_routes(repositories.turma))
        .merge(entity_routes(repositories.lancamento))
        .merge(entity_routes(repositories.horario))
        .layer(middleware::from_fn_with_state(gate, authorize));

    Router::new()
        .merge(entities)
        .merge(health_routes(health))
        .layer(TraceLayer::new_for_http())
}
