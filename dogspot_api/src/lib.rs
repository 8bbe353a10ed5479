//! Wire contract shared by the dogspot client and gateway: the embedded
//! image string and the JSON shapes of the prediction and random-dog
//! endpoints.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodedImageError {
    #[error("not an embedded image: missing `data:` scheme")]
    MissingScheme,
    #[error("not an embedded image: missing `;base64,` marker")]
    MissingMarker,
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// An image embedded as a `data:<media type>;base64,<payload>` string.
///
/// Built exactly once per acquired image and never mutated; decoding
/// always returns the original bytes under the original media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    media_type: String,
    payload: String,
}

impl EncodedImage {
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            payload: BASE64.encode(bytes),
        }
    }

    pub fn parse(s: &str) -> Result<Self, EncodedImageError> {
        let rest = s
            .strip_prefix("data:")
            .ok_or(EncodedImageError::MissingScheme)?;
        let (media_type, payload) = rest
            .split_once(";base64,")
            .ok_or(EncodedImageError::MissingMarker)?;
        // Reject garbage up front so a stored EncodedImage is always decodable.
        BASE64
            .decode(payload)
            .map_err(|e| EncodedImageError::InvalidPayload(e.to_string()))?;
        Ok(Self {
            media_type: media_type.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn decode(&self) -> Result<Vec<u8>, EncodedImageError> {
        BASE64
            .decode(&self.payload)
            .map_err(|e| EncodedImageError::InvalidPayload(e.to_string()))
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.media_type, self.payload)
    }
}

impl Serialize for EncodedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EncodedImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EncodedImage::parse(&s).map_err(de::Error::custom)
    }
}

/// One ranked breed guess. Labels are hyphen-delimited tokens; the
/// ordering of a response's predictions comes from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub image: EncodedImage,
}

/// Raw body of a predict response. A populated `error` field takes
/// precedence over `predictions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<Prediction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Photo credit for images obtained through the random-dog path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsplash_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomDogResponse {
    pub image: EncodedImage,
    pub attribution: Attribution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}
