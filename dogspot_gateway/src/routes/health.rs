use axum::{response::IntoResponse, response::Json};
use dogspot_api::HealthResponse;

pub async fn healthcheck() -> impl IntoResponse {
    Json(HealthResponse {
        message: "Dog breed gateway is running".into(),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{inference_config, spawn_gateway, unsplash_config};
    use dogspot_api::HealthResponse;

    #[tokio::test]
    async fn healthcheck_reports_a_message() {
        let addr = spawn_gateway(
            inference_config("http://127.0.0.1:9", Some("secret")),
            unsplash_config("http://127.0.0.1:9", None),
        )
        .await;

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: HealthResponse = response.json().await.unwrap();
        assert!(!body.message.is_empty());
    }
}
