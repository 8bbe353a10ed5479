use crate::config::{InferenceConfig, UnsplashConfig};
use crate::routes::api_routes;
use crate::server::SharedState;
use crate::telemetry::Metrics;
use crate::upstream::{InferenceClient, UnsplashClient};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub async fn spawn_gateway(inference: InferenceConfig, unsplash: UnsplashConfig) -> SocketAddr {
    let state = SharedState {
        inference: Arc::new(InferenceClient::new(&inference).unwrap()),
        unsplash: Arc::new(UnsplashClient::new(&unsplash).unwrap()),
        metrics: Arc::new(Metrics::new()),
    };
    spawn(api_routes().with_state(state)).await
}

pub fn inference_config(base_url: &str, api_key: Option<&str>) -> InferenceConfig {
    InferenceConfig {
        base_url: base_url.to_string(),
        api_key: api_key.map(String::from),
        timeout_secs: 5,
    }
}

pub fn unsplash_config(base_url: &str, access_key: Option<&str>) -> UnsplashConfig {
    UnsplashConfig {
        base_url: base_url.to_string(),
        access_key: access_key.map(String::from),
        query: "dog".to_string(),
        timeout_secs: 5,
    }
}
