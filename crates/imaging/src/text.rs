use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Render `text` into an RGBA overlay using the 8x8 bitmap font, scaled with
/// nearest-neighbor so a `font_size` of 24 yields 24px-tall glyphs. Glyphs
/// outside the basic set render as '?'. The overlay is transparent except
/// for the glyph pixels, whose alpha is `opacity` times the color's alpha.
pub fn render_text(text: &str, font_size: u32, color: Rgba<u8>, opacity: f32) -> RgbaImage {
    let scale = (font_size / 8).max(1);
    let glyph_gap = scale;
    let alpha = (opacity.clamp(0.0, 1.0) * f32::from(color.0[3])).round() as u8;
    let ink = Rgba([color.0[0], color.0[1], color.0[2], alpha]);

    let glyph_w = 8 * scale;
    let glyph_h = 8 * scale;
    let count = text.chars().count() as u32;
    let width = if count == 0 {
        1
    } else {
        count * glyph_w + (count - 1) * glyph_gap
    };
    let height = glyph_h.max(1);

    let mut overlay = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut cursor_x = 0u32;
    for ch in text.chars() {
        let glyph = BASIC_FONTS
            .get(ch)
            .unwrap_or_else(|| BASIC_FONTS.get('?').unwrap());
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..8u32 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                for dx in 0..scale {
                    for dy in 0..scale {
                        let x = cursor_x + col * scale + dx;
                        let y = row as u32 * scale + dy;
                        overlay.put_pixel(x, y, ink);
                    }
                }
            }
        }
        cursor_x += glyph_w + glyph_gap;
    }

    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_pixels(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn renders_visible_glyphs() {
        let overlay = render_text("Hi", 24, Rgba([255, 255, 255, 255]), 1.0);
        assert!(ink_pixels(&overlay) > 0);
        assert_eq!(overlay.height(), 24);
    }

    #[test]
    fn font_size_scales_the_overlay() {
        let small = render_text("A", 8, Rgba([255, 255, 255, 255]), 1.0);
        let large = render_text("A", 32, Rgba([255, 255, 255, 255]), 1.0);
        assert_eq!(small.height(), 8);
        assert_eq!(large.height(), 32);
        assert!(ink_pixels(&large) > ink_pixels(&small));
    }

    #[test]
    fn opacity_scales_glyph_alpha() {
        let overlay = render_text("A", 16, Rgba([255, 255, 255, 255]), 0.5);
        let max_alpha = overlay.pixels().map(|p| p.0[3]).max().unwrap();
        assert_eq!(max_alpha, 128);
    }

    #[test]
    fn empty_text_yields_empty_overlay() {
        let overlay = render_text("", 24, Rgba([255, 255, 255, 255]), 0.7);
        assert_eq!(ink_pixels(&overlay), 0);
    }
}
