use crate::config::{InferenceConfig, UnsplashConfig};
use dogspot_api::{Attribution, EncodedImage};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("inference service API key is not configured")]
    MissingApiKey,
    #[error("failed to reach inference service: {0}")]
    Unreachable(String),
}

/// Forwards predict requests to the inference service with the service
/// credential attached.
pub struct InferenceClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Verbatim upstream status and body, handed back to the caller as-is.
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    #[instrument(skip(self, image))]
    pub async fn predict(&self, image: &str) -> Result<UpstreamReply, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey)?;

        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .header("X-API-Key", api_key)
            .json(&serde_json::json!({ "image": image }))
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        Ok(UpstreamReply {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Error, Debug)]
pub enum RandomPhotoError {
    #[error("image provider access key is not configured")]
    MissingAccessKey,
    #[error("image provider request failed: {0}")]
    Provider(String),
    #[error("image provider response had no usable image URL")]
    NoImageUrl,
    #[error("failed to download image: {0}")]
    Download(String),
}

/// Looks up a random photo by query and downloads it server-side, so the
/// provider credential and the image fetch both stay off the caller.
pub struct UnsplashClient {
    http: Client,
    base_url: String,
    access_key: Option<String>,
    query: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    #[serde(default)]
    urls: UnsplashUrls,
    #[serde(default)]
    links: UnsplashLinks,
    user: Option<UnsplashUser>,
}

#[derive(Debug, Default, Deserialize)]
struct UnsplashUrls {
    regular: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UnsplashLinks {
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: Option<String>,
    links: Option<UnsplashUserLinks>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: Option<String>,
}

impl UnsplashClient {
    pub fn new(config: &UnsplashConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            query: config.query.clone(),
        })
    }

    #[instrument(skip(self))]
    pub async fn random_photo(&self) -> Result<(EncodedImage, Attribution), RandomPhotoError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(RandomPhotoError::MissingAccessKey)?;

        let response = self
            .http
            .get(format!("{}/photos/random", self.base_url))
            .query(&[("query", self.query.as_str())])
            .header(header::AUTHORIZATION, format!("Client-ID {access_key}"))
            .send()
            .await
            .map_err(|e| RandomPhotoError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RandomPhotoError::Provider(format!(
                "status {}",
                response.status()
            )));
        }

        let photo: UnsplashPhoto = response
            .json()
            .await
            .map_err(|e| RandomPhotoError::Provider(e.to_string()))?;

        let image_url = photo
            .urls
            .regular
            .or(photo.urls.small)
            .ok_or(RandomPhotoError::NoImageUrl)?;

        let image = self.download_and_encode(&image_url).await?;

        let (photographer, photographer_url) = match photo.user {
            Some(user) => (user.name, user.links.and_then(|links| links.html)),
            None => (None, None),
        };
        let attribution = Attribution {
            photographer,
            photographer_url,
            unsplash_url: photo.links.html,
        };

        Ok((image, attribution))
    }

    async fn download_and_encode(&self, url: &str) -> Result<EncodedImage, RandomPhotoError> {
        let download = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RandomPhotoError::Download(e.to_string()))?;

        if !download.status().is_success() {
            return Err(RandomPhotoError::Download(format!(
                "status {}",
                download.status()
            )));
        }

        let media_type = download
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = download
            .bytes()
            .await
            .map_err(|e| RandomPhotoError::Download(e.to_string()))?;

        Ok(EncodedImage::from_bytes(&media_type, &bytes))
    }
}
