use image::imageops::FilterType;
use image::{imageops, DynamicImage, GenericImageView};

use crate::anchor::Anchor;
use crate::color::parse_color;
use crate::encode::encode;
use crate::error::{ImagingError, ImagingResult};
use crate::fit::{bound_longest_side, resize_with_fit, FitMode};
use crate::format::ImageFormat;
use crate::text::render_text;

/// Working images are capped at this bound on their longer dimension before
/// re-encoding, except for operations that carry their own explicit target
/// size. Smaller inputs are never upscaled.
pub const MAX_BOUND: u32 = 1080;

/// One transformation request against a validated source image.
///
/// A closed set: the dispatcher matches exhaustively and there is no plugin
/// mechanism. Watermark bytes travel inside the descriptor so the transform
/// stays a pure function of its inputs.
#[derive(Debug, Clone)]
pub enum Operation {
    Compress {
        quality: u8,
    },
    ConvertWebp {
        quality: u8,
    },
    Resize {
        width: u32,
        height: Option<u32>,
        fit: FitMode,
    },
    Thumbnail {
        size: u32,
    },
    TextWatermark {
        text: String,
        font_size: u32,
        color: String,
        opacity: f32,
        anchor: Anchor,
        margin: u32,
    },
    ImageWatermark {
        watermark: Vec<u8>,
        opacity: f32,
        anchor: Anchor,
        margin: u32,
        scale: f32,
    },
}

impl Operation {
    /// Suffix appended to the logical base name for the output file.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::Compress { .. } => "compressed",
            Self::ConvertWebp { .. } => "webp",
            Self::Resize { .. } => "resized",
            Self::Thumbnail { .. } => "thumbnail",
            Self::TextWatermark { .. } | Self::ImageWatermark { .. } => "watermark",
        }
    }

    /// Encode target for this operation. Everything preserves the source
    /// format family except thumbnails (always JPEG bytes) and the WebP
    /// conversion.
    pub fn output_format(&self, source: ImageFormat) -> ImageFormat {
        match self {
            Self::Thumbnail { .. } => ImageFormat::Jpeg,
            Self::ConvertWebp { .. } => ImageFormat::Webp,
            _ => source,
        }
    }

    /// Extension used in the output filename. Follows the source extension
    /// even for thumbnails, whose bytes are JPEG regardless: the filename is
    /// a function of the logical input name, not the encode target.
    pub fn output_extension(&self, source: ImageFormat) -> &'static str {
        match self {
            Self::ConvertWebp { .. } => "webp",
            _ => source.extension(),
        }
    }
}

/// Decode `input`, apply `op`, and encode the result.
///
/// Returns the encoded bytes; the output format is
/// `op.output_format(source)`. Any decode or encode failure surfaces as an
/// `ImagingError` and no partial output escapes this function.
pub fn transform(input: &[u8], op: &Operation, source: ImageFormat) -> ImagingResult<Vec<u8>> {
    let img = image::load_from_memory(input).map_err(|e| ImagingError::Decode(e.to_string()))?;
    let out_format = op.output_format(source);

    let (result, quality) = match op {
        Operation::Compress { quality } => (bound_longest_side(img, MAX_BOUND), *quality),
        Operation::ConvertWebp { quality } => (bound_longest_side(img, MAX_BOUND), *quality),
        Operation::Resize { width, height, fit } => {
            (resize_with_fit(&img, *width, *height, *fit), 85)
        }
        Operation::Thumbnail { size } => {
            (img.resize_to_fill(*size, *size, FilterType::Lanczos3), 80)
        }
        Operation::TextWatermark {
            text,
            font_size,
            color,
            opacity,
            anchor,
            margin,
        } => {
            let overlay = render_text(text, *font_size, parse_color(color), *opacity);
            (composite(img, &overlay.into(), *anchor, *margin), 85)
        }
        Operation::ImageWatermark {
            watermark,
            opacity,
            anchor,
            margin,
            scale,
        } => {
            let overlay = prepare_image_watermark(watermark, *scale, *opacity)?;
            (composite(img, &overlay, *anchor, *margin), 85)
        }
    };

    encode(&result, out_format, quality)
}

/// Composite `overlay` onto `base` at the anchor's placement.
fn composite(base: DynamicImage, overlay: &DynamicImage, anchor: Anchor, margin: u32) -> DynamicImage {
    let mut canvas = base.to_rgba8();
    let (x, y) = anchor.placement(
        canvas.width(),
        canvas.height(),
        overlay.width(),
        overlay.height(),
        margin,
    );
    imageops::overlay(&mut canvas, &overlay.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

/// Decode the watermark image, resize it so its width is `scale * MAX_BOUND`
/// (aspect preserved, never upscaled past its own size requirements), and
/// fold `opacity` into its alpha channel.
fn prepare_image_watermark(bytes: &[u8], scale: f32, opacity: f32) -> ImagingResult<DynamicImage> {
    let wm = image::load_from_memory(bytes)
        .map_err(|e| ImagingError::WatermarkDecode(e.to_string()))?;

    let target_w = ((MAX_BOUND as f32 * scale.max(0.0)).round() as u32).max(1);
    let (w, h) = wm.dimensions();
    let target_h = ((f64::from(h) * f64::from(target_w) / f64::from(w)).round() as u32).max(1);
    let mut resized = wm.resize_exact(target_w, target_h, FilterType::Lanczos3).to_rgba8();

    let opacity = opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        for pixel in resized.pixels_mut() {
            pixel.0[3] = (f32::from(pixel.0[3]) * opacity).round() as u8;
        }
    }

    Ok(DynamicImage::ImageRgba8(resized))
}
