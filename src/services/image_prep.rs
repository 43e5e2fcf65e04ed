use base64::{engine::general_purpose, Engine};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, ImageReader,
    Limits,
};
use std::io::Cursor;
use thiserror::Error;

pub const JPEG_QUALITY: u8 = 75;

// Decode limits for untrusted uploads
const MAX_DECODE_SIDE: u32 = 12_000;
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

#[derive(Error, Debug)]
enum PrepError {
    #[error("data URL has no payload")]
    EmptyDataUrl,
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shrinks the photo so its longer side is at most `max_dimension` and
/// re-encodes it as JPEG, returning plain base64 (no data-URL header).
///
/// Never fails: if anything goes wrong the input is returned untouched and
/// the analysis proceeds with the original image.
pub fn precondition(image_base64: &str, max_dimension: u32) -> String {
    match try_precondition(image_base64, max_dimension) {
        Ok(resized) => {
            log::debug!(
                "🖼️ Image preconditioned: {} -> {} base64 bytes",
                image_base64.len(),
                resized.len()
            );
            resized
        }
        Err(e) => {
            log::warn!("⚠️ Image resize failed: {}, using original", e);
            image_base64.to_string()
        }
    }
}

fn try_precondition(image_base64: &str, max_dimension: u32) -> Result<String, PrepError> {
    let payload = strip_data_url(image_base64)?;

    // Telefonlardan satır kırılımlı base64 gelebiliyor
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(compact)?;

    let image = decode_image(&bytes)?;
    let (width, height) = image.dimensions();
    let image = match target_size(width, height, max_dimension) {
        Some((new_width, new_height)) => {
            log::debug!(
                "📐 Resizing {}x{} -> {}x{}",
                width,
                height,
                new_width,
                new_height
            );
            image.resize_exact(new_width, new_height, FilterType::Lanczos3)
        }
        None => image,
    };

    let jpeg = encode_jpeg(&image)?;
    Ok(general_purpose::STANDARD.encode(jpeg))
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PrepError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_SIDE);
    limits.max_image_height = Some(MAX_DECODE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);
    Ok(reader.decode()?)
}

fn strip_data_url(image_base64: &str) -> Result<&str, PrepError> {
    if image_base64.starts_with("data:") {
        image_base64
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or(PrepError::EmptyDataUrl)
    } else {
        Ok(image_base64)
    }
}

/// New size when the image exceeds `max_dimension`, None when it already fits.
pub fn target_size(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width.max(height) <= max_dimension {
        return None;
    }

    let scale = |short: u32, long: u32| {
        let scaled = u64::from(short) * u64::from(max_dimension) / u64::from(long);
        (scaled as u32).max(1)
    };

    if width > height {
        Some((max_dimension, scale(height, width)))
    } else {
        Some((scale(width, height), max_dimension))
    }
}

/// Wraps a payload for an `image_url` message part. Payloads that are
/// already data URLs pass through.
pub fn to_data_url(image_base64: &str) -> String {
    if image_base64.starts_with("data:") {
        return image_base64.to_string();
    }
    format!("data:{};base64,{}", sniff_mime(image_base64), image_base64)
}

// Base64 prefixes of the magic bytes; preconditioned payloads are always JPEG.
fn sniff_mime(image_base64: &str) -> &'static str {
    if image_base64.starts_with("iVBORw0KGgo") {
        "image/png"
    } else if image_base64.starts_with("R0lGOD") {
        "image/gif"
    } else if image_base64.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, PrepError> {
    // JPEG has no alpha or palette; always hand the encoder plain RGB8
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(buffer)
}
