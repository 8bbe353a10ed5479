use clap::{Parser, Subcommand};
use dogspot_client::{
    config,
    prediction::{PredictionClient, PredictionResult},
    sources,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dogspot_client", about = "Submit a dog photo for breed prediction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict on a locally stored photo
    Upload { path: PathBuf },
    /// Capture one frame from a camera and predict on it
    Camera {
        /// Capture device index, overriding the configured one
        #[arg(long)]
        device: Option<i32>,
    },
    /// Fetch a random dog photo through the gateway and predict on it
    Random,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::get_configuration().expect("failed to load config");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let http = reqwest::Client::new();

    let (image, attribution) = match cli.command {
        Command::Upload { path } => (sources::upload::load(&path).await?, None),
        Command::Camera { device } => {
            let index = device.unwrap_or(config.camera.device_index);
            let camera = sources::camera::Camera::open(index).await?;
            // Free the device before the network round trip, whether or
            // not the capture worked.
            let captured = camera.capture_encoded().await;
            camera.release().await?;
            (captured?, None)
        }
        Command::Random => {
            let (image, attribution) =
                sources::random::fetch(&http, &config.gateway.base_url).await?;
            (image, Some(attribution))
        }
    };

    if let Some(attribution) = &attribution {
        match (&attribution.photographer, &attribution.unsplash_url) {
            (Some(name), Some(url)) => println!("Photo by {name} on Unsplash ({url})"),
            (Some(name), None) => println!("Photo by {name}"),
            _ => {}
        }
    }

    let client = PredictionClient::new(&config.api)?;
    match client.predict(&image).await {
        PredictionResult::Ranked(predictions) => {
            for prediction in predictions {
                println!("{:>5.1}%  {}", prediction.confidence * 100.0, prediction.label);
            }
            Ok(())
        }
        PredictionResult::Failed(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}
