use base64::Engine as _;
use image::error::{ImageError, LimitError, LimitErrorKind};
use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageResult, Limits};
use std::io::Cursor;
use std::path::Path;
use tracing::{instrument, trace};

/// Width every image is scaled to before it is sent to the model.
pub const MODEL_INPUT_WIDTH: u32 = 672;

/// Size of an image scaled to `target_width` with its aspect ratio kept.
pub fn target_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let scaled = f64::from(target_width) * f64::from(height) / f64::from(width.max(1));
    (target_width, (scaled.round() as u32).max(1))
}

/// Bytes per pixel of the float buffer the resampling filter works in.
const RESAMPLE_BYTES_PER_PIXEL: u64 = 16;

/// Fallback allocation budget when the decoder limits carry none.
const FALLBACK_MAX_ALLOC: u64 = 512 * 1024 * 1024;

/// Largest number of pixels a resize may produce, derived from the
/// decoder's default allocation limit.
pub fn max_resize_pixels() -> u64 {
    Limits::default().max_alloc.unwrap_or(FALLBACK_MAX_ALLOC) / RESAMPLE_BYTES_PER_PIXEL
}

/// Like [`target_dimensions`], but fails when resampling to that size would
/// need more than [`max_resize_pixels`] pixels.
///
/// The filter scales vertically first, so the intermediate buffer is as wide
/// as the source and as tall as the target.
pub fn checked_target_dimensions(
    width: u32,
    height: u32,
    target_width: u32,
) -> ImageResult<(u32, u32)> {
    let (tw, th) = target_dimensions(width, height, target_width);
    let pixels = u64::from(width.max(tw)) * u64::from(th);
    if pixels > max_resize_pixels() {
        return Err(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::DimensionError,
        )));
    }
    Ok((tw, th))
}

pub fn resize_to_width(img: &DynamicImage, target_width: u32) -> ImageResult<DynamicImage> {
    let (w, h) = checked_target_dimensions(img.width(), img.height(), target_width)?;
    Ok(img.resize_exact(w, h, FilterType::Lanczos3))
}

/// Encode as an RGB JPEG and return the bytes as standard base64.
///
/// Alpha and any other colour layout are dropped by the RGB conversion.
pub fn encode_jpeg_base64(img: &DynamicImage) -> ImageResult<String> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Jpeg)?;
    let bytes = buf.into_inner();
    trace!(size = bytes.len(), "encoded jpeg");
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Read and decode an image file; the format is sniffed from its content.
#[instrument(level = "debug")]
pub async fn load_image(path: &Path) -> ImageResult<DynamicImage> {
    let bytes = tokio::fs::read(path).await?;
    image::load_from_memory(&bytes)
}
