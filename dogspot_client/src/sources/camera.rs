use dogspot_api::EncodedImage;
use opencv::{core::Mat, core::Vector, imgcodecs, prelude::*, videoio};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    OpenCameraFailed(opencv::Error),
    #[error("Camera device {0} is not available")]
    DeviceUnavailable(i32),
    #[error("Failed to read frame: {0}")]
    ReadFrameFailed(opencv::Error),
    #[error("Camera returned an empty frame")]
    EmptyFrame,
    #[error("Failed to encode frame: {0}")]
    EncodeFrameFailed(opencv::Error),
    #[error("OpenCV error: {0}")]
    OpenCvError(opencv::Error),
}

impl From<opencv::Error> for CameraError {
    fn from(err: opencv::Error) -> Self {
        CameraError::OpenCvError(err)
    }
}

/// Exclusive handle on a capture device. Opening claims the device;
/// [`Camera::release`] must run on every exit path — successful capture,
/// failed capture, or cancellation — before another acquisition can
/// start.
#[derive(Debug)]
pub struct Camera {
    capture: Mutex<videoio::VideoCapture>,
}

impl Camera {
    pub async fn open(device_index: i32) -> Result<Self, CameraError> {
        let capture = videoio::VideoCapture::new(device_index, videoio::CAP_ANY)
            .map_err(CameraError::OpenCameraFailed)?;
        if !capture.is_opened()? {
            return Err(CameraError::DeviceUnavailable(device_index));
        }
        Ok(Self {
            capture: Mutex::new(capture),
        })
    }

    /// Reads one frame at the device's native resolution and serializes
    /// it straight to JPEG. No size or type validation happens here: the
    /// encoder controls both.
    pub async fn capture_encoded(&self) -> Result<EncodedImage, CameraError> {
        let mut cam = self.capture.lock().await;
        let mut frame = Mat::default();
        if !cam.read(&mut frame).map_err(CameraError::ReadFrameFailed)? || frame.empty() {
            return Err(CameraError::EmptyFrame);
        }
        let mut buf = Vector::<u8>::new();
        imgcodecs::imencode(".jpg", &frame, &mut buf, &Vector::new())
            .map_err(CameraError::EncodeFrameFailed)?;
        let bytes: Vec<u8> = buf.into();
        Ok(EncodedImage::from_bytes("image/jpeg", &bytes))
    }

    /// Stops the capture and frees the device. Idempotent: releasing an
    /// already-released capture is a no-op in the backend.
    pub async fn release(&self) -> Result<(), CameraError> {
        let mut cam = self.capture.lock().await;
        cam.release().map_err(CameraError::from)?;
        Ok(())
    }
}
