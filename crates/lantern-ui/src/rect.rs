use glam::Vec2;

/// Axis-aligned rectangle in screen pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    #[inline]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self { origin: self.origin + Vec2::new(dx, dy), ..self }
    }

    /// Top-left corner that centres `inner` inside this rectangle.
    #[inline]
    pub fn centre_offset(self, inner: Vec2) -> Vec2 {
        self.origin + (self.size - inner) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(100.0, 100.0, 300.0, 100.0).contains(Vec2::new(150.0, 150.0)));
    }

    #[test]
    fn contains_min_edge_not_max_edge() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(!rect.contains(Vec2::new(10.0, 5.0)));
        assert!(!rect.contains(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn empty_rect_contains_nothing() {
        let rect = r(5.0, 5.0, 0.0, 10.0);
        assert!(rect.is_empty());
        assert!(!rect.contains(Vec2::new(5.0, 6.0)));
    }

    // ── placement ─────────────────────────────────────────────────────────

    #[test]
    fn centre_offset_centres_inner_box() {
        let off = r(100.0, 100.0, 300.0, 100.0).centre_offset(Vec2::new(100.0, 20.0));
        assert_eq!(off, Vec2::new(200.0, 140.0));
    }

    #[test]
    fn translated_keeps_size() {
        let moved = r(1.0, 2.0, 3.0, 4.0).translated(0.0, -2.0);
        assert_eq!(moved, r(1.0, 0.0, 3.0, 4.0));
    }
}
