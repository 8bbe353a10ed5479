use crate::{server::SharedState, upstream::RandomPhotoError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dogspot_api::{ErrorResponse, RandomDogResponse};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum RandomDogError {
    #[error("random image relay is not configured")]
    Misconfigured,
    #[error("could not fetch a random dog image")]
    Provider,
}

impl IntoResponse for RandomDogError {
    fn into_response(self) -> Response {
        let status = match self {
            RandomDogError::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            RandomDogError::Provider => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Fetches one random dog photo from the stock-photo provider, downloads
/// it server-side and returns it embedded with attribution. Provider
/// error details are logged, never forwarded.
#[instrument(skip(state))]
pub async fn random_dog(
    State(state): State<SharedState>,
) -> Result<Json<RandomDogResponse>, RandomDogError> {
    let started = Instant::now();
    state.metrics.record_request("random_dog");

    let (image, attribution) = state.unsplash.random_photo().await.map_err(|e| match e {
        RandomPhotoError::MissingAccessKey => RandomDogError::Misconfigured,
        other => {
            tracing::error!(error = %other, "random photo lookup failed");
            RandomDogError::Provider
        }
    })?;

    state
        .metrics
        .record_relay_duration(started.elapsed().as_millis() as u64, "random_dog");

    Ok(Json(RandomDogResponse { image, attribution }))
}
