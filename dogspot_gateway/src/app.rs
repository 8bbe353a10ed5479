use crate::config::Config;
use crate::server::HttpServer;
use crate::upstream::{InferenceClient, UnsplashClient};

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let inference = Arc::new(InferenceClient::new(&config.inference)?);
    let unsplash = Arc::new(UnsplashClient::new(&config.unsplash)?);

    if config.inference.api_key.is_none() {
        tracing::warn!("no inference API key configured, predict relay will answer 500");
    }
    if config.unsplash.access_key.is_none() {
        tracing::warn!("no Unsplash access key configured, random-dog relay will answer 500");
    }

    let server = HttpServer::new(inference, unsplash, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
