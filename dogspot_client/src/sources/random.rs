use crate::error::ClientError;
use dogspot_api::{Attribution, EncodedImage, ErrorResponse, RandomDogResponse};

/// Fetches a random dog photo through the gateway. The stock-photo
/// provider is never contacted directly: its credential lives on the
/// gateway and the image arrives already embedded, so no second fetch
/// is needed for encoding.
pub async fn fetch(
    http: &reqwest::Client,
    gateway_base_url: &str,
) -> Result<(EncodedImage, Attribution), ClientError> {
    let response = http
        .get(format!(
            "{}/api/random-dog",
            gateway_base_url.trim_end_matches('/')
        ))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => format!("HTTP error, status {}", status.as_u16()),
        };
        return Err(ClientError::Api(message));
    }

    let body: RandomDogResponse = response
        .json()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    Ok((body.image, body.attribution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;

    async fn spawn(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn returns_the_embedded_image_and_attribution() {
        let addr = spawn(Router::new().route(
            "/api/random-dog",
            get(|| async {
                (
                    StatusCode::OK,
                    Json(json!({
                        "image": "data:image/jpeg;base64,AAECAw==",
                        "attribution": {
                            "photographer": "Jane Doe",
                            "photographerUrl": "https://unsplash.com/@jane",
                            "unsplashUrl": "https://unsplash.com/photos/abc"
                        }
                    })),
                )
            }),
        ))
        .await;

        let (image, attribution) = fetch(&reqwest::Client::new(), &format!("http://{addr}"))
            .await
            .unwrap();

        assert_eq!(image.media_type(), "image/jpeg");
        assert_eq!(image.decode().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(attribution.photographer.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn a_gateway_error_surfaces_its_message() {
        let addr = spawn(Router::new().route(
            "/api/random-dog",
            get(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "could not fetch a random dog image"})),
                )
            }),
        ))
        .await;

        let result = fetch(&reqwest::Client::new(), &format!("http://{addr}")).await;

        match result {
            Err(ClientError::Api(message)) => {
                assert_eq!(message, "could not fetch a random dog image")
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_bodyless_failure_gets_a_status_message() {
        let addr = spawn(
            Router::new().route("/api/random-dog", get(|| async { StatusCode::BAD_GATEWAY })),
        )
        .await;

        let result = fetch(&reqwest::Client::new(), &format!("http://{addr}")).await;

        match result {
            Err(ClientError::Api(message)) => assert_eq!(message, "HTTP error, status 502"),
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn an_unreachable_gateway_is_a_network_error() {
        let result = fetch(&reqwest::Client::new(), "http://127.0.0.1:1").await;

        assert!(matches!(result, Err(ClientError::Network(_))));
    }
}
