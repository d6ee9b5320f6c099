use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use tracing::{debug, warn};
use webp::{Encoder, WebPConfig};

use crate::error::ImageError;
use crate::upload::types::{ConvertOptions, ConvertedImage, FitMode, UploadFile};

const WEBP_CONTENT_TYPE: &str = "image/webp";
const MAX_EFFORT: u8 = 6;

/// Re-encode an uploaded image as WebP.
///
/// Non-image MIME types are always rejected. Any other failure returns the
/// original bytes under their original extension when
/// `fallback_to_original` is set, and an error otherwise.
pub fn convert_to_webp(
    file: &UploadFile,
    options: &ConvertOptions,
) -> Result<ConvertedImage, ImageError> {
    if !file.is_image() {
        return Err(ImageError::UnsupportedType {
            mime_type: file.content_type.clone(),
        });
    }

    match encode_webp(&file.bytes, options) {
        Ok(bytes) => {
            debug!(
                file = %file.file_name,
                before = file.bytes.len(),
                after = bytes.len(),
                "converted image to webp"
            );
            Ok(ConvertedImage {
                bytes,
                content_type: WEBP_CONTENT_TYPE.to_string(),
                extension: "webp".to_string(),
                converted: true,
            })
        }
        Err(err) if options.fallback_to_original => {
            warn!(file = %file.file_name, "webp conversion failed, keeping original: {err}");
            Ok(original(file))
        }
        Err(err) => Err(err),
    }
}

/// Run [`convert_to_webp`] on the blocking pool
pub async fn convert_in_background(
    file: UploadFile,
    options: ConvertOptions,
) -> Result<ConvertedImage, ImageError> {
    tokio::task::spawn_blocking(move || convert_to_webp(&file, &options))
        .await
        .map_err(|e| ImageError::Task(e.to_string()))?
}

fn original(file: &UploadFile) -> ConvertedImage {
    let extension = file
        .extension()
        .or_else(|| {
            image::guess_format(&file.bytes)
                .ok()
                .and_then(|format| format.extensions_str().first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string());

    ConvertedImage {
        bytes: file.bytes.clone(),
        content_type: file.content_type.clone(),
        extension,
        converted: false,
    }
}

fn encode_webp(bytes: &[u8], options: &ConvertOptions) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let img = resize(img, options);
    let rgba = img.to_rgba8();

    let mut config =
        WebPConfig::new().map_err(|_| ImageError::Encode("invalid encoder config".to_string()))?;
    config.quality = options.quality.clamp(0.0, 100.0);
    config.method = i32::from(options.effort.min(MAX_EFFORT));

    let encoded = Encoder::from_rgba(&rgba, rgba.width(), rgba.height())
        .encode_advanced(&config)
        .map_err(|e| ImageError::Encode(format!("{e:?}")))?;
    let output = encoded.to_vec();

    validate_webp(&output)?;
    Ok(output)
}

fn validate_webp(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidOutput("empty buffer".to_string()));
    }
    match image::guess_format(bytes) {
        Ok(ImageFormat::WebP) => Ok(()),
        Ok(other) => Err(ImageError::InvalidOutput(format!("expected webp, got {other:?}"))),
        Err(e) => Err(ImageError::InvalidOutput(e.to_string())),
    }
}

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator.max(1));
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

fn resize(img: DynamicImage, options: &ConvertOptions) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (target_w, target_h) = match (options.width, options.height) {
        (None, None) => return img,
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        // One side given: keep the aspect ratio
        (Some(w), None) => {
            let w = w.max(1);
            return img.resize_exact(w, scale(height, w, width), FilterType::Lanczos3);
        }
        (None, Some(h)) => {
            let h = h.max(1);
            return img.resize_exact(scale(width, h, height), h, FilterType::Lanczos3);
        }
    };

    match options.fit {
        FitMode::Fill => img.resize_exact(target_w, target_h, FilterType::Lanczos3),
        FitMode::Inside => img.resize(target_w, target_h, FilterType::Lanczos3),
        FitMode::Cover => img.resize_to_fill(target_w, target_h, FilterType::Lanczos3),
        FitMode::Outside => {
            let width_ratio = f64::from(target_w) / f64::from(width.max(1));
            let height_ratio = f64::from(target_h) / f64::from(height.max(1));
            let ratio = width_ratio.max(height_ratio);
            let new_w = ((f64::from(width) * ratio).round() as u32).max(target_w);
            let new_h = ((f64::from(height) * ratio).round() as u32).max(target_h);
            img.resize_exact(new_w, new_h, FilterType::Lanczos3)
        }
        FitMode::Contain => {
            let fitted = img.resize(target_w, target_h, FilterType::Lanczos3).to_rgba8();
            let mut canvas = RgbaImage::new(target_w, target_h);
            let x = i64::from((target_w - fitted.width()) / 2);
            let y = i64::from((target_h - fitted.height()) / 2);
            imageops::overlay(&mut canvas, &fitted, x, y);
            DynamicImage::ImageRgba8(canvas)
        }
    }
}
