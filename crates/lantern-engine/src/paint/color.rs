/// Straight-alpha RGBA colour with channels in `[0, 1]`.
///
/// Blending uses (SRC_ALPHA, ONE_MINUS_SRC_ALPHA), so colours are not premultiplied.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// From sRGB bytes, e.g. hex literals.
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Mean of the RGB channels.
    #[inline]
    pub fn luminance(self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Adds `delta` to every RGB channel, clamped to `[0, 1]`. Alpha is kept.
    #[inline]
    pub fn shifted(self, delta: f32) -> Self {
        Self {
            r: (self.r + delta).clamp(0.0, 1.0),
            g: (self.g + delta).clamp(0.0, 1.0),
            b: (self.b + delta).clamp(0.0, 1.0),
            a: self.a,
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_is_channel_mean() {
        assert!((Color::rgb(0.3, 0.6, 0.9).luminance() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn shifted_clamps_and_keeps_alpha() {
        let c = Color::rgba(0.9, 0.1, 0.5, 0.4).shifted(0.3);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 0.4).abs() < 1e-6);
        assert_eq!(c.a, 0.4);
        assert_eq!(Color::BLACK.shifted(-0.3), Color::BLACK);
    }

    #[test]
    fn from_u8_normalizes() {
        assert_eq!(Color::from_u8(255, 0, 255, 255), Color::rgb(1.0, 0.0, 1.0));
    }
}
