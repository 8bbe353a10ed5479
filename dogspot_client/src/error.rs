use crate::sources::camera::CameraError;
use thiserror::Error;

/// Every failure the client can surface. Messages are the user-visible
/// text; callers print them as-is and never see stack traces or raw
/// provider bodies.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("The selected file is not an image.")]
    NotAnImage,
    #[error("Image is too large. The limit is 5 MiB.")]
    ImageTooLarge,
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed.")]
    AuthFailed,
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("{0}")]
    Api(String),
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}
