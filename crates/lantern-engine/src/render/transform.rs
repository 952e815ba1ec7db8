use glam::{Mat4, Vec3};

/// Placement of a drawable.
///
/// `position.z` is a layering index: larger values draw in front.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self { position: Vec3::new(x, y, z), ..Self::default() }
    }

    /// `Scale · Translate · Rotate`.
    ///
    /// Scale is applied last, so it also scales the translation.
    pub fn model_matrix(&self) -> Mat4 {
        let rotate = Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z);
        Mat4::from_scale(self.scale) * Mat4::from_translation(self.position) * rotate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::default().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_moves_origin() {
        let m = Transform::at(10.0, 20.0, 3.0).model_matrix();
        assert_eq!(m * Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(10.0, 20.0, 3.0, 1.0));
    }

    #[test]
    fn scale_applies_to_translation() {
        let t = Transform { scale: Vec3::new(2.0, 2.0, 1.0), ..Transform::at(5.0, 1.0, 0.0) };
        let p = t.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vec4::new(12.0, 2.0, 0.0, 1.0));
    }

    #[test]
    fn rotation_happens_before_translation() {
        let t = Transform {
            rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            ..Transform::at(10.0, 0.0, 0.0)
        };
        let p = t.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }
}
