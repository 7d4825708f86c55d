use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::error::{ImagingError, ImagingResult};
use crate::format::ImageFormat;

/// Encode `img` in the requested format at the given quality.
///
/// JPEG honors the quality knob directly. WebP is written with the pure-Rust
/// lossless encoder after quantizing the color channels according to the
/// quality, which keeps the quality/size tradeoff without libwebp bindings.
/// PNG and GIF have no continuous quality axis and ignore the knob.
pub fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> ImagingResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let quality = quality.clamp(1, 100);
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            let mut enc = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
            enc.encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| ImagingError::Encode("jpeg", e.to_string()))?;
        }
        ImageFormat::Png => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            let enc = PngEncoder::new(Cursor::new(&mut buffer));
            enc.write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| ImagingError::Encode("png", e.to_string()))?;
        }
        ImageFormat::Webp => {
            let quality = quality.clamp(1, 100);
            let mut rgba = img.to_rgba8();
            if quality < 100 {
                quantize_channels(rgba.as_mut(), quality);
            }
            let (width, height) = rgba.dimensions();
            let enc = WebPEncoder::new_lossless(Cursor::new(&mut buffer));
            enc.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| ImagingError::Encode("webp", e.to_string()))?;
        }
        ImageFormat::Gif => {
            img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Gif)
                .map_err(|e| ImagingError::Encode("gif", e.to_string()))?;
        }
    }
    Ok(buffer)
}

/// Posterize the RGB channels so lower qualities compress smaller under the
/// lossless WebP encoder. Alpha is left untouched.
fn quantize_channels(data: &mut [u8], quality: u8) {
    let levels = levels_from_quality(quality);
    let step = 255.0 / (f32::from(levels) - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Quadratic bias: fine palettes near quality 100, aggressively coarse ones
/// at the low end.
fn levels_from_quality(quality: u8) -> u16 {
    if quality >= 100 {
        return 256;
    }
    let normalized = f32::from(quality.max(1)) / 100.0;
    (2.0 + normalized * normalized * 254.0).round().clamp(2.0, 256.0) as u16
}
