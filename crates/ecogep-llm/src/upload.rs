//! Re-encoding of uploaded photos for transmission

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ecogep_core::error::{GepError, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// A photo re-encoded as base64 JPEG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Standard-alphabet base64 of the JPEG bytes, without a `data:` prefix
    pub base64: String,
    pub width: u32,
    pub height: u32,
    /// Size of the JPEG before base64 encoding
    pub jpeg_len: usize,
}

/// Decode an uploaded photo and re-encode it as base64 JPEG.
///
/// Alpha is dropped since JPEG cannot carry it. Bytes that do not decode as
/// an image are an [`GepError::InvalidImage`].
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| GepError::InvalidImage { reason: e.to_string() })?;

    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(|e| GepError::InvalidImage { reason: format!("JPEG re-encode failed: {}", e) })?;

    tracing::debug!(
        width = rgb.width(),
        height = rgb.height(),
        input_bytes = bytes.len(),
        jpeg_bytes = jpeg.len(),
        "Re-encoded upload as JPEG"
    );

    Ok(EncodedImage {
        base64: BASE64.encode(&jpeg),
        width: rgb.width(),
        height: rgb.height(),
        jpeg_len: jpeg.len(),
    })
}
