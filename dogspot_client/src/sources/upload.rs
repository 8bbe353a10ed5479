use crate::error::ClientError;
use dogspot_api::EncodedImage;
use std::path::Path;

/// Upper bound on accepted uploads. Checked against file metadata, so
/// oversized files are rejected before their bytes are read and long
/// before anything touches the network.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

pub async fn load(path: &Path) -> Result<EncodedImage, ClientError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_IMAGE_BYTES {
        return Err(ClientError::ImageTooLarge);
    }

    let bytes = tokio::fs::read(path).await?;
    let media_type = sniff_media_type(&bytes)
        .or_else(|| media_type_from_extension(path))
        .ok_or(ClientError::NotAnImage)?;

    Ok(EncodedImage::from_bytes(media_type, &bytes))
}

/// Magic-number sniffing for the image families the inference service
/// accepts. The extension is only consulted when the content is
/// inconclusive.
fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

fn media_type_from_extension(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn png_fixture() -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(32, 32, Rgb([180, 120, 40]));
        let mut bytes: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn a_text_file_is_not_an_image() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not pixels").unwrap();

        let result = load(file.path()).await;

        assert!(matches!(result, Err(ClientError::NotAnImage)));
    }

    #[tokio::test]
    async fn an_oversized_file_is_rejected_on_size_alone() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; (MAX_IMAGE_BYTES + 1) as usize])
            .unwrap();

        let result = load(file.path()).await;

        assert!(matches!(result, Err(ClientError::ImageTooLarge)));
    }

    #[tokio::test]
    async fn a_file_at_exactly_the_limit_is_accepted() {
        let mut png = png_fixture();
        let padding = MAX_IMAGE_BYTES as usize - png.len();
        png.extend(std::iter::repeat(0).take(padding));
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&png).unwrap();

        let result = load(file.path()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn a_valid_png_round_trips_byte_identically() {
        let png = png_fixture();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&png).unwrap();

        let image = load(file.path()).await.unwrap();

        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.decode().unwrap(), png);
    }

    #[tokio::test]
    async fn a_missing_file_is_an_io_error() {
        let result = load(Path::new("/definitely/not/here.png")).await;

        assert!(matches!(result, Err(ClientError::Io(_))));
    }

    #[test]
    fn sniffing_beats_the_extension() {
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0x00]), Some("image/jpeg"));
        assert_eq!(sniff_media_type(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_media_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_media_type(b"plain text"), None);
    }

    #[test]
    fn extension_fallback_covers_the_common_suffixes() {
        assert_eq!(
            media_type_from_extension(Path::new("dog.JPEG")),
            Some("image/jpeg")
        );
        assert_eq!(media_type_from_extension(Path::new("dog.txt")), None);
        assert_eq!(media_type_from_extension(Path::new("dog")), None);
    }
}
