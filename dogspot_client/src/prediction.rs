use crate::config::{ApiConfig, SubmissionMode};
use crate::error::ClientError;
use dogspot_api::{EncodedImage, PredictRequest, Prediction, PredictResponse};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::instrument;

/// Terminal outcome of one submission: a ranked, non-empty sequence of
/// predictions, or a single user-facing message. Nothing else crosses
/// this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionResult {
    Ranked(Vec<Prediction>),
    Failed(String),
}

pub struct PredictionClient {
    http: Client,
    base_url: String,
    mode: SubmissionMode,
    api_key: Option<String>,
}

impl PredictionClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        // The request timeout is the only bound on a submission; there
        // are no automatic retries, the caller decides whether to
        // resubmit.
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mode: config.mode.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Submits one encoded image for classification. Every failure mode
    /// is folded into the returned value.
    #[instrument(skip(self, image), fields(mode = self.mode.as_str()))]
    pub async fn predict(&self, image: &EncodedImage) -> PredictionResult {
        match self.submit(image).await {
            Ok(predictions) => PredictionResult::Ranked(predictions),
            Err(e) => PredictionResult::Failed(e.to_string()),
        }
    }

    async fn submit(&self, image: &EncodedImage) -> Result<Vec<Prediction>, ClientError> {
        let request = PredictRequest {
            image: image.clone(),
        };

        let builder = match self.mode {
            SubmissionMode::Direct => {
                let builder = self.http.post(format!("{}/predict", self.base_url));
                match &self.api_key {
                    Some(key) => builder.header("X-API-Key", key),
                    None => builder,
                }
            }
            // The relay injects the credential itself.
            SubmissionMode::Relay => self.http.post(format!("{}/api/predict", self.base_url)),
        };

        let response = builder.json(&request).send().await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }
        parse_predictions(&body)
    }
}

fn error_for_status(status: StatusCode, body: &[u8]) -> ClientError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::AuthFailed,
        _ => {
            let message = serde_json::from_slice::<PredictResponse>(body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_else(|| format!("HTTP error, status {}", status.as_u16()));
            ClientError::Api(message)
        }
    }
}

fn parse_predictions(body: &[u8]) -> Result<Vec<Prediction>, ClientError> {
    let parsed: PredictResponse = serde_json::from_slice(body)
        .map_err(|_| ClientError::Api("The service returned an unreadable response.".into()))?;

    // An error field wins over predictions, even on a 2xx.
    if let Some(error) = parsed.error {
        return Err(ClientError::Api(error));
    }

    match parsed.predictions {
        Some(predictions) if !predictions.is_empty() => Ok(predictions),
        _ => Err(ClientError::Api(
            "The service returned no predictions.".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    fn api_config(addr: SocketAddr, mode: SubmissionMode, api_key: Option<&str>) -> ApiConfig {
        ApiConfig {
            base_url: format!("http://{addr}"),
            mode,
            api_key: api_key.map(String::from),
            timeout_secs: 5,
        }
    }

    fn sample_image() -> EncodedImage {
        EncodedImage::from_bytes("image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0])
    }

    async fn spawn(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[test]
    fn status_429_maps_to_rate_limit_regardless_of_body() {
        let error = error_for_status(
            StatusCode::TOO_MANY_REQUESTS,
            br#"{"error":"some other text"}"#,
        );
        assert_eq!(
            error.to_string(),
            "Too many requests. Please try again later."
        );
    }

    #[test]
    fn status_401_and_403_map_to_auth_failure() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let error = error_for_status(status, b"");
            assert_eq!(error.to_string(), "Authentication failed.");
        }
    }

    #[test]
    fn other_failures_prefer_the_body_error_field() {
        let error = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, br#"{"error":"boom"}"#);
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn other_failures_fall_back_to_a_status_message() {
        let error = error_for_status(StatusCode::SERVICE_UNAVAILABLE, b"not json at all");
        assert_eq!(error.to_string(), "HTTP error, status 503");
    }

    #[test]
    fn a_body_error_field_beats_predictions() {
        let body = br#"{"predictions":[{"label":"beagle","confidence":0.4}],"error":"boom"}"#;
        let result = parse_predictions(body);
        assert!(matches!(result, Err(ClientError::Api(message)) if message == "boom"));
    }

    #[test]
    fn an_empty_prediction_list_is_an_api_error() {
        assert!(parse_predictions(br#"{"predictions":[]}"#).is_err());
        assert!(parse_predictions(br#"{}"#).is_err());
    }

    #[tokio::test]
    async fn a_successful_submission_yields_the_ranked_predictions() {
        async fn stub(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            if headers.get("x-api-key").map(|v| v.as_bytes()) != Some(b"test-key".as_ref()) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "authentication failed"})),
                );
            }
            let image = body.get("image").and_then(Value::as_str).unwrap_or("");
            if !image.starts_with("data:image/") {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad image"})));
            }
            (
                StatusCode::OK,
                Json(json!({
                    "predictions": [{"label": "golden-retriever", "confidence": 0.95}]
                })),
            )
        }
        let addr = spawn(Router::new().route("/predict", post(stub))).await;
        let client =
            PredictionClient::new(&api_config(addr, SubmissionMode::Direct, Some("test-key")))
                .unwrap();

        let result = client.predict(&sample_image()).await;

        assert_eq!(
            result,
            PredictionResult::Ranked(vec![Prediction {
                label: "golden-retriever".into(),
                confidence: 0.95,
            }])
        );
    }

    #[tokio::test]
    async fn relay_mode_posts_to_the_relay_path_without_a_credential() {
        async fn stub(headers: HeaderMap) -> (StatusCode, Json<Value>) {
            if headers.get("x-api-key").is_some() {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "unexpected credential"})),
                );
            }
            (
                StatusCode::OK,
                Json(json!({"predictions": [{"label": "beagle", "confidence": 0.5}]})),
            )
        }
        let addr = spawn(Router::new().route("/api/predict", post(stub))).await;
        let client = PredictionClient::new(&api_config(
            addr,
            SubmissionMode::Relay,
            Some("unused-key"),
        ))
        .unwrap();

        let result = client.predict(&sample_image()).await;

        assert!(matches!(result, PredictionResult::Ranked(_)));
    }

    #[tokio::test]
    async fn a_rate_limited_submission_fails_with_the_retry_message() {
        async fn stub() -> (StatusCode, Json<Value>) {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": "anything"})),
            )
        }
        let addr = spawn(Router::new().route("/predict", post(stub))).await;
        let client =
            PredictionClient::new(&api_config(addr, SubmissionMode::Direct, Some("k"))).unwrap();

        let result = client.predict(&sample_image()).await;

        assert_eq!(
            result,
            PredictionResult::Failed("Too many requests. Please try again later.".into())
        );
    }

    #[tokio::test]
    async fn an_unreachable_service_fails_with_a_network_message() {
        let client = PredictionClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:1".into(),
            mode: SubmissionMode::Direct,
            api_key: Some("k".into()),
            timeout_secs: 1,
        })
        .unwrap();

        let result = client.predict(&sample_image()).await;

        match result {
            PredictionResult::Failed(message) => {
                assert!(message.starts_with("Network error:"), "got: {message}")
            }
            other => panic!("expected a failure, got {other:?}"),
        }
    }
}
