use std::collections::HashMap;

use glam::Mat4;

use super::backend::{GpuBackend, ProgramId, UniformLocation, UniformValue};
use super::error::GpuError;

/// Index of a shader in the renderer's registry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub(crate) usize);

/// Uniform names shared by the built-in programs.
pub mod uniforms {
    pub const MODEL: &str = "u_model";
    pub const VIEW: &str = "u_view";
    pub const PROJECTION: &str = "u_projection";
    pub const COLOUR: &str = "u_colour";
    pub const RESOLUTION: &str = "u_resolution";
    pub const AMBIENT_LIGHT: &str = "ambient_light";
    pub const USE_NORMALS: &str = "use_normals";
    pub const LIGHT_POS: &str = "light_pos";
    pub const LIGHT_COLOUR: &str = "light_colour";
    pub const FALLOFF: &str = "falloff";
    pub const EXPOSURE: &str = "exposure";
}

/// A compiled program with a uniform-location cache.
///
/// Each name is resolved through the backend at most once; misses are cached too, so
/// writing to a uniform the program does not declare costs a single query.
#[derive(Debug)]
pub struct Shader {
    program: ProgramId,
    label: String,
    locations: HashMap<String, Option<UniformLocation>>,
}

impl Shader {
    pub fn compile<B: GpuBackend + ?Sized>(
        backend: &mut B,
        label: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, GpuError> {
        let program = backend.compile_program(label, vertex_src, fragment_src)?;
        log::debug!("compiled shader `{label}` as program {}", program.index());
        Ok(Self { program, label: label.to_string(), locations: HashMap::new() })
    }

    #[inline]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bind<B: GpuBackend + ?Sized>(&self, backend: &mut B) {
        backend.use_program(self.program);
    }

    pub fn location<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str) -> Option<UniformLocation> {
        if let Some(cached) = self.locations.get(name) {
            return *cached;
        }
        let location = backend.uniform_location(self.program, name);
        if location.is_none() {
            log::trace!("shader `{}` has no uniform `{name}`", self.label);
        }
        self.locations.insert(name.to_string(), location);
        location
    }

    pub fn set<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: UniformValue) {
        if let Some(location) = self.location(backend, name) {
            backend.set_uniform(self.program, location, &value);
        }
    }

    pub fn set_bool<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: bool) {
        self.set(backend, name, UniformValue::Int(value as i32));
    }

    pub fn set_float<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: f32) {
        self.set(backend, name, UniformValue::Float(value));
    }

    pub fn set_vec2<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: [f32; 2]) {
        self.set(backend, name, UniformValue::Vec2(value));
    }

    pub fn set_vec4<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: [f32; 4]) {
        self.set(backend, name, UniformValue::Vec4(value));
    }

    pub fn set_mat4<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: Mat4) {
        self.set(backend, name, UniformValue::Mat4(value.to_cols_array_2d()));
    }

    pub fn set_vec3_array<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: &[[f32; 3]]) {
        self.set(backend, name, UniformValue::Vec3Array(value.to_vec()));
    }

    pub fn set_vec4_array<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, name: &str, value: &[[f32; 4]]) {
        self.set(backend, name, UniformValue::Vec4Array(value.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingBackend;

    #[test]
    fn each_name_is_queried_once() {
        let mut gpu = RecordingBackend::new(800, 600);
        let mut shader = Shader::compile(&mut gpu, "object", "vs", "fs").unwrap();

        shader.set_float(&mut gpu, "exposure", 1.0);
        shader.set_float(&mut gpu, "exposure", 2.0);
        shader.set_float(&mut gpu, "exposure", 3.0);

        assert_eq!(gpu.location_queries(shader.program(), "exposure"), 1);
        assert_eq!(gpu.uniform(shader.program(), "exposure"), Some(&UniformValue::Float(3.0)));
    }

    #[test]
    fn missing_uniform_is_cached_as_miss() {
        let mut gpu = RecordingBackend::new(800, 600);
        gpu.declare_uniforms("post", &["exposure"]);
        let mut shader = Shader::compile(&mut gpu, "post", "vs", "fs").unwrap();

        shader.set_float(&mut gpu, "ambient_light", 1.0);
        shader.set_float(&mut gpu, "ambient_light", 1.0);

        assert_eq!(gpu.location_queries(shader.program(), "ambient_light"), 1);
        assert_eq!(gpu.uniform(shader.program(), "ambient_light"), None);
    }

    #[test]
    fn bool_is_written_as_int() {
        let mut gpu = RecordingBackend::new(800, 600);
        let mut shader = Shader::compile(&mut gpu, "object", "vs", "fs").unwrap();
        shader.set_bool(&mut gpu, "use_normals", true);
        assert_eq!(gpu.uniform(shader.program(), "use_normals"), Some(&UniformValue::Int(1)));
    }

    #[test]
    fn compile_failure_propagates() {
        let mut gpu = RecordingBackend::new(800, 600);
        gpu.reject_program("broken");
        let err = Shader::compile(&mut gpu, "broken", "vs", "fs").unwrap_err();
        assert!(matches!(err, GpuError::ShaderCompile { .. }));
    }
}
