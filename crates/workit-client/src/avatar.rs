//! Avatar uploads: raw image bytes to a `data:` URI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use workit_shared::ValidationError;

use crate::error::{ClientError, Result};

/// Check that `bytes` is a readable image and encode it as a data URI.
///
/// The size cap is enforced before any decoding. Decoding runs on the
/// blocking pool.
pub async fn to_data_uri(bytes: Vec<u8>, max_bytes: usize) -> Result<String> {
    if bytes.len() > max_bytes {
        return Err(ValidationError::ImageTooLarge {
            size: bytes.len(),
            max: max_bytes,
        }
        .into());
    }

    tokio::task::spawn_blocking(move || encode_blocking(&bytes))
        .await
        .map_err(|e| ClientError::Decode(format!("decode task failed: {e}")))?
}

fn encode_blocking(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes).map_err(|e| ClientError::Decode(e.to_string()))?;

    // Sniffing only reads the magic number; make sure the body decodes too.
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ClientError::Decode(e.to_string()))?;

    Ok(format!(
        "data:{};base64,{}",
        mime_type(format),
        STANDARD.encode(bytes)
    ))
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::png_bytes;

    #[tokio::test]
    async fn png_becomes_data_uri() {
        let png = png_bytes();
        let uri = to_data_uri(png.clone(), 1024 * 1024).await.unwrap();

        let encoded = uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), png);
    }

    #[tokio::test]
    async fn garbage_is_a_decode_error() {
        let err = to_data_uri(b"definitely not an image".to_vec(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn truncated_png_is_a_decode_error() {
        let mut png = png_bytes();
        png.truncate(20);
        let err = to_data_uri(png, 1024 * 1024).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_decoding() {
        let err = to_data_uri(vec![0u8; 64], 16).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::ImageTooLarge { size: 64, max: 16 })
        ));
    }
}
