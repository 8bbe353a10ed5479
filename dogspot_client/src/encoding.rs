//! Binary-to-embedded-string conversion. Local files go through
//! [`crate::sources::upload`], which validates before encoding; this
//! module covers the raw byte and remote-URL paths.

use crate::error::ClientError;
use dogspot_api::EncodedImage;
use reqwest::header;

/// GETs `url`, reads the full body and embeds it under the response's
/// declared content type. Non-2xx responses and transport failures both
/// surface as network errors.
pub async fn fetch_and_encode(http: &reqwest::Client, url: &str) -> Result<EncodedImage, ClientError> {
    let response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Network(format!(
            "fetching {url} returned status {}",
            status.as_u16()
        )));
    }

    let media_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    Ok(EncodedImage::from_bytes(&media_type, &bytes))
}
