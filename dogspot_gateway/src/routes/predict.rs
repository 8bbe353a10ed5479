use crate::{server::SharedState, upstream::UpstreamError};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dogspot_api::ErrorResponse;
use serde::Deserialize;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct PredictBody {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Error, Debug)]
pub enum PredictRelayError {
    #[error("missing `image` field")]
    MissingImage,
    #[error("prediction relay is not configured")]
    Misconfigured,
    #[error("could not reach the prediction service")]
    Unreachable,
    #[error("failed to build response: {0}")]
    HttpBuilder(String),
}

impl IntoResponse for PredictRelayError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictRelayError::MissingImage => StatusCode::BAD_REQUEST,
            PredictRelayError::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            PredictRelayError::Unreachable => StatusCode::BAD_GATEWAY,
            PredictRelayError::HttpBuilder(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

/// Relays a predict request upstream, injecting the service credential.
/// The upstream's status code and body pass through verbatim, success
/// and failure alike.
#[instrument(skip(state, body))]
pub async fn predict(
    State(state): State<SharedState>,
    Json(body): Json<PredictBody>,
) -> Result<Response, PredictRelayError> {
    let image = body.image.ok_or(PredictRelayError::MissingImage)?;

    let started = Instant::now();
    state.metrics.record_request("predict");

    let reply = state.inference.predict(&image).await.map_err(|e| match e {
        UpstreamError::MissingApiKey => PredictRelayError::Misconfigured,
        UpstreamError::Unreachable(detail) => {
            tracing::error!(%detail, "inference request failed");
            PredictRelayError::Unreachable
        }
    })?;

    state
        .metrics
        .record_relay_duration(started.elapsed().as_millis() as u64, "predict");

    let response = Response::builder()
        .status(reply.status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(reply.body))
        .map_err(|e| PredictRelayError::HttpBuilder(e.to_string()))?;

    Ok(response)
}
