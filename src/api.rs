pub(crate) mod generate;
pub(crate) mod health;
pub(crate) mod metrics;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;

/// Route table. CORS is fully open by design: the service fronts a local
/// companion UI, not a hardened deployment.
pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate", get(generate::generate))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics::exporter))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
