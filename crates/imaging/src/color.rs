use image::Rgba;

/// Parse a caller-supplied color: a small set of CSS-style names or
/// `#rgb`/`#rrggbb` hex. Anything unrecognized falls back to white, the
/// documented default for text watermarks.
pub fn parse_color(value: &str) -> Rgba<u8> {
    let trimmed = value.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if let Some(rgb) = parse_hex(hex) {
            return rgb;
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "black" => Rgba([0, 0, 0, 255]),
        "red" => Rgba([255, 0, 0, 255]),
        "green" => Rgba([0, 128, 0, 255]),
        "blue" => Rgba([0, 0, 255, 255]),
        "yellow" => Rgba([255, 255, 0, 255]),
        "cyan" => Rgba([0, 255, 255, 255]),
        "magenta" => Rgba([255, 0, 255, 255]),
        "gray" | "grey" => Rgba([128, 128, 128, 255]),
        "orange" => Rgba([255, 165, 0, 255]),
        _ => Rgba([255, 255, 255, 255]),
    }
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    match hex.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (i, ch) in hex.chars().enumerate() {
                let v = ch.to_digit(16)? as u8;
                channels[i] = v * 16 + v;
            }
            Some(Rgba([channels[0], channels[1], channels[2], 255]))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba([r, g, b, 255]))
        }
        _ => None,
    }
}
