mod health;
mod metrics;
mod predict;
mod random_dog;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(health::healthcheck))
        .route("/api/predict", post(predict::predict))
        .route("/api/random-dog", get(random_dog::random_dog))
        .route("/metrics", get(metrics::metrics_handler))
}
