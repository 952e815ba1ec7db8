use glam::{Mat4, Vec3, Vec4};

/// Size of the light uniform arrays.
pub const MAX_LIGHTS: usize = 15;

/// Default attenuation coefficients (constant, linear, quadratic).
pub const DEFAULT_FALLOFF: Vec3 = Vec3::new(0.3, 4.0, 20.0);

/// Point light in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// RGB plus intensity in `w`.
    pub color: Vec4,
    pub falloff: Vec3,
}

impl Light {
    pub fn new(position: Vec3, rgb: Vec3, intensity: f32) -> Self {
        Self { position, color: rgb.extend(intensity), falloff: DEFAULT_FALLOFF }
    }

    pub fn with_falloff(mut self, falloff: Vec3) -> Self {
        self.falloff = falloff;
        self
    }

    /// Position in framebuffer pixels with the origin at the bottom-left corner.
    ///
    /// The light is carried through model, view and projection, mapped to the
    /// `target` pixel grid and flipped vertically. `z` keeps the world layer.
    pub fn framebuffer_position(&self, view: Mat4, projection: Mat4, target: (u32, u32)) -> Vec3 {
        let model = Mat4::from_translation(self.position);
        let clip = projection * view * model * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        let (w, h) = (target.0 as f32, target.1 as f32);
        let screen_x = (ndc.x + 1.0) * 0.5 * w;
        let screen_y = (1.0 - ndc.y) * 0.5 * h;
        Vec3::new(screen_x, h - screen_y, self.position.z)
    }
}

/// Light list flattened into fixed-size uniform arrays.
///
/// Always `MAX_LIGHTS` long; slots past the pushed lights are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LightUniforms {
    pub positions: Vec<[f32; 3]>,
    pub falloffs: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
}

impl LightUniforms {
    pub fn pack(lights: &[Light], view: Mat4, projection: Mat4, target: (u32, u32)) -> Self {
        let mut packed = Self {
            positions: vec![[0.0; 3]; MAX_LIGHTS],
            falloffs: vec![[0.0; 3]; MAX_LIGHTS],
            colors: vec![[0.0; 4]; MAX_LIGHTS],
        };

        for (slot, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            packed.positions[slot] = light.framebuffer_position(view, projection, target).to_array();
            packed.falloffs[slot] = light.falloff.to_array();
            packed.colors[slot] = light.color.to_array();
        }

        packed
    }
}
