/// Axis-aligned box in world pixels. `x`/`y` is the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Collider {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Collider {
    /// A `width` x `height` box centred on `(center_x, center_y)`.
    pub fn new(width: i32, height: i32, center_x: i32, center_y: i32) -> Self {
        Self { x: center_x - width / 2, y: center_y - height / 2, width, height }
    }

    /// The same box re-centred on `(center_x, center_y)`.
    #[must_use]
    pub fn centered_at(self, center_x: i32, center_y: i32) -> Self {
        Self::new(self.width, self.height, center_x, center_y)
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True when the boxes overlap. Touching edges do not count.
    pub fn collides(&self, other: &Collider) -> bool {
        self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_centres_the_box() {
        let c = Collider::new(10, 20, 50, 50);
        assert_eq!((c.x, c.y), (45, 40));
        assert_eq!((c.right(), c.bottom()), (55, 60));
    }

    #[test]
    fn overlap_detection() {
        let a = Collider::new(10, 10, 0, 0);
        assert!(a.collides(&Collider::new(10, 10, 5, 5)));
        assert!(!a.collides(&Collider::new(10, 10, 20, 0)));
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let a = Collider { x: 0, y: 0, width: 10, height: 10 };
        let b = Collider { x: 10, y: 0, width: 10, height: 10 };
        assert!(!a.collides(&b));
    }

    #[test]
    fn recentring_keeps_size() {
        let c = Collider::new(8, 4, 0, 0).centered_at(100, 100);
        assert_eq!(c, Collider::new(8, 4, 100, 100));
    }
}
