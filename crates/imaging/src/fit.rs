use std::str::FromStr;

use image::imageops::FilterType;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};

/// How a source image's aspect ratio is reconciled with a requested target
/// box: cover crops to fill, contain letterboxes, fill stretches, inside
/// shrinks to the bound, outside grows to the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    #[default]
    Cover,
    Contain,
    Fill,
    Inside,
    Outside,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "contain" => Ok(Self::Contain),
            "fill" => Ok(Self::Fill),
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            other => Err(format!(
                "unknown fit '{other}'. Expected cover, contain, fill, inside, or outside"
            )),
        }
    }
}

const FILTER: FilterType = FilterType::Lanczos3;

/// Resize `img` toward a `width` x `height` box under the given fit mode.
///
/// When no height is supplied the image is scaled to the exact width with
/// its aspect ratio preserved, regardless of fit mode.
pub fn resize_with_fit(
    img: &DynamicImage,
    width: u32,
    height: Option<u32>,
    fit: FitMode,
) -> DynamicImage {
    let (src_w, src_h) = img.dimensions();

    let Some(height) = height else {
        let h = scaled_dim(src_h, width, src_w);
        return img.resize_exact(width, h, FILTER);
    };

    match fit {
        FitMode::Cover => img.resize_to_fill(width, height, FILTER),
        FitMode::Fill => img.resize_exact(width, height, FILTER),
        FitMode::Inside => img.resize(width, height, FILTER),
        FitMode::Outside => {
            let scale = f64::max(
                f64::from(width) / f64::from(src_w),
                f64::from(height) / f64::from(src_h),
            );
            let w = ((f64::from(src_w) * scale).round() as u32).max(1);
            let h = ((f64::from(src_h) * scale).round() as u32).max(1);
            img.resize_exact(w, h, FILTER)
        }
        FitMode::Contain => {
            let scaled = img.resize(width, height, FILTER).to_rgba8();
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
            let x = i64::from((width - scaled.width()) / 2);
            let y = i64::from((height - scaled.height()) / 2);
            imageops::overlay(&mut canvas, &scaled, x, y);
            DynamicImage::ImageRgba8(canvas)
        }
    }
}

/// Constrain the longer dimension to `bound` pixels, never upscaling.
pub fn bound_longest_side(img: DynamicImage, bound: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w.max(h) <= bound {
        return img;
    }
    img.resize(bound, bound, FILTER)
}

fn scaled_dim(src: u32, target: u32, other_src: u32) -> u32 {
    ((f64::from(src) * f64::from(target) / f64::from(other_src)).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([120, 30, 60, 255])))
    }

    #[test]
    fn parse_accepts_all_five_modes() {
        for (name, mode) in [
            ("cover", FitMode::Cover),
            ("contain", FitMode::Contain),
            ("fill", FitMode::Fill),
            ("inside", FitMode::Inside),
            ("outside", FitMode::Outside),
        ] {
            assert_eq!(name.parse::<FitMode>().unwrap(), mode);
        }
        assert!("stretch".parse::<FitMode>().is_err());
    }

    #[test]
    fn width_only_preserves_aspect_ratio() {
        let out = resize_with_fit(&source(2000, 1000), 500, None, FitMode::Inside);
        assert_eq!(out.dimensions(), (500, 250));
    }

    #[test]
    fn fill_forces_exact_dimensions() {
        let out = resize_with_fit(&source(2000, 1000), 500, Some(500), FitMode::Fill);
        assert_eq!(out.dimensions(), (500, 500));
    }

    #[test]
    fn cover_crops_to_fill_the_box() {
        let out = resize_with_fit(&source(2000, 1000), 400, Some(400), FitMode::Cover);
        assert_eq!(out.dimensions(), (400, 400));
    }

    #[test]
    fn inside_stays_within_the_box() {
        let out = resize_with_fit(&source(2000, 1000), 500, Some(500), FitMode::Inside);
        let (w, h) = out.dimensions();
        assert!(w <= 500 && h <= 500);
        assert_eq!((w, h), (500, 250));
    }

    #[test]
    fn outside_covers_the_box_without_cropping() {
        let out = resize_with_fit(&source(2000, 1000), 500, Some(500), FitMode::Outside);
        let (w, h) = out.dimensions();
        assert!(w >= 500 && h >= 500);
        assert_eq!((w, h), (1000, 500));
    }

    #[test]
    fn contain_letterboxes_to_exact_box() {
        let out = resize_with_fit(&source(2000, 1000), 500, Some(500), FitMode::Contain);
        assert_eq!(out.dimensions(), (500, 500));
    }

    #[test]
    fn bound_never_upscales() {
        let small = bound_longest_side(source(640, 480), 1080);
        assert_eq!(small.dimensions(), (640, 480));

        let large = bound_longest_side(source(4000, 2000), 1080);
        let (w, h) = large.dimensions();
        assert_eq!(w.max(h), 1080);
        assert_eq!((w, h), (1080, 540));
    }
}
