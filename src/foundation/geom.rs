use kurbo::Rect;

/// Four-sided padding box in pixels.
///
/// Always fully normalized by the time it reaches rendering; the
/// shorthand forms (uniform scalar, horizontal/vertical) live in the
/// configuration layer only.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct Padding {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Padding {
    pub fn uniform(value: u32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    /// Grow `rect` outward by this padding on all four sides.
    pub fn expand(self, rect: Rect) -> Rect {
        Rect::new(
            rect.x0 - f64::from(self.left),
            rect.y0 - f64::from(self.top),
            rect.x1 + f64::from(self.right),
            rect.y1 + f64::from(self.bottom),
        )
    }
}
