use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;

/// Longer edge an image is downscaled to before captioning (spec.md
/// §4.12 step 3a).
pub const MAX_EDGE: u32 = 768;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unsupported or corrupt image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode arbitrary image bytes, convert to RGB, downscale so neither
/// edge exceeds `MAX_EDGE`, and re-encode as JPEG. HEIC/HEIF inputs are
/// accepted by extension at the enumeration stage but decode through
/// the same path here — if the underlying codec can't decode them this
/// returns `Decode` and the caller skips the file rather than treating
/// it as a fatal worker error.
pub fn normalize_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = (decoded.width(), decoded.height());
    let resized = if width.max(height) > MAX_EDGE {
        decoded.resize(MAX_EDGE, MAX_EDGE, FilterType::Lanczos3)
    } else {
        decoded
    };
    let rgb = resized.to_rgb8();

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(rgb).write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}
