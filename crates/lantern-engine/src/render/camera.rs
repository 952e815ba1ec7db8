use glam::{Mat4, Vec3};

/// Depth at which the camera sits in front of the scene.
pub const CAMERA_DEPTH: f32 = 10.0;

/// Two-dimensional camera tracking a world position.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Camera2D {
    pub x: f32,
    pub y: f32,
}

impl Camera2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(-self.x, -self.y, -CAMERA_DEPTH))
    }

    /// View used for screen-space UI: no camera offset.
    pub fn screen_view() -> Mat4 {
        Camera2D::default().view_matrix()
    }
}

/// Orthographic projection over `width` x `height` pixels with Y growing downward.
pub fn screen_projection(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, height, 0.0, -0.1, 10.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn view_moves_world_opposite_to_camera() {
        let v = Camera2D::new(100.0, 50.0).view_matrix();
        let p = v * Vec4::new(100.0, 50.0, 0.0, 1.0);
        assert_eq!(p, Vec4::new(0.0, 0.0, -CAMERA_DEPTH, 1.0));
    }

    #[test]
    fn projection_maps_top_left_to_ndc_corner() {
        let proj = screen_projection(800.0, 600.0);
        let view = Camera2D::screen_view();
        let tl = proj * view * Vec4::new(0.0, 0.0, 5.0, 1.0);
        let br = proj * view * Vec4::new(800.0, 600.0, 5.0, 1.0);
        assert!((tl.x + 1.0).abs() < 1e-5 && (tl.y - 1.0).abs() < 1e-5);
        assert!((br.x - 1.0).abs() < 1e-5 && (br.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn higher_layers_are_closer() {
        let proj = screen_projection(800.0, 600.0);
        let view = Camera2D::screen_view();
        let back = proj * view * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let front = proj * view * Vec4::new(0.0, 0.0, 9.0, 1.0);
        assert!(front.z < back.z);
        assert!((0.0..=1.0).contains(&back.z) && (0.0..=1.0).contains(&front.z));
    }
}
