/// Named compositing positions for watermark placement.
///
/// Four corners offset by a margin, plus center. Unrecognized names fall
/// back to the bottom-right default rather than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Anchor {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "center" => Self::Center,
            _ => Self::BottomRight,
        }
    }

    /// Top-left coordinates for an `element_w` x `element_h` overlay inside a
    /// `container_w` x `container_h` canvas.
    ///
    /// Corner anchors sit `margin` pixels from their two edges; the opposite
    /// edges are unconstrained. Center places the overlay's top-left corner
    /// at the canvas midpoint and ignores the margin. Coordinates are
    /// clamped to zero when the overlay is larger than the canvas.
    pub fn placement(
        &self,
        container_w: u32,
        container_h: u32,
        element_w: u32,
        element_h: u32,
        margin: u32,
    ) -> (i64, i64) {
        let cw = i64::from(container_w);
        let ch = i64::from(container_h);
        let ew = i64::from(element_w);
        let eh = i64::from(element_h);
        let m = i64::from(margin);

        let (x, y) = match self {
            Self::TopLeft => (m, m),
            Self::TopRight => (cw - ew - m, m),
            Self::BottomLeft => (m, ch - eh - m),
            Self::BottomRight => (cw - ew - m, ch - eh - m),
            Self::Center => (cw / 2, ch / 2),
        };
        (x.max(0), y.max(0))
    }
}
