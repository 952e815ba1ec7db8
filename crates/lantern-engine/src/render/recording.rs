//! A `GpuBackend` that records calls instead of touching a GPU.
//!
//! Used by tests across the workspace and handy for inspecting what a frame would
//! submit. Every call is appended to [`RecordingBackend::calls`]; draws carry a snapshot
//! of the pipeline state and of the bound program's uniforms.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::backend::{
    check_rgba_len, Clear, Framebuffer, FramebufferId, GpuBackend, ImageId, MeshId, ProgramId,
    RenderTarget, TextureUnit, UniformLocation, UniformValue,
};
use super::error::GpuError;
use super::mesh::Vertex;

/// State captured when a draw is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: Option<ProgramId>,
    pub target: RenderTarget,
    pub color: Option<ImageId>,
    pub normal: Option<ImageId>,
    pub mesh: Option<MeshId>,
    pub index_count: u32,
    pub depth_test: bool,
    pub blending: bool,
    pub viewport: (u32, u32, u32, u32),
    pub uniforms: BTreeMap<String, UniformValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileProgram { program: ProgramId, label: String },
    UseProgram(ProgramId),
    SetUniform { program: ProgramId, name: String, value: UniformValue },
    CreateMesh { mesh: MeshId, vertices: usize, indices: usize },
    DestroyMesh(MeshId),
    CreateImage { image: ImageId, width: u32, height: u32 },
    CreateFramebuffer(Framebuffer),
    BindTarget(RenderTarget),
    Viewport { x: u32, y: u32, width: u32, height: u32 },
    DepthTest(bool),
    Blending(bool),
    Clear(Clear),
    BindTexture { unit: TextureUnit, image: ImageId },
    BindMesh(MeshId),
    Draw(DrawRecord),
}

#[derive(Debug, Default)]
struct RecordedProgram {
    label: String,
    /// Restricts which uniform names resolve; `None` accepts any name.
    declared: Option<HashSet<String>>,
    names: Vec<String>,
    values: HashMap<String, UniformValue>,
    queries: HashMap<String, usize>,
}

pub struct RecordingBackend {
    calls: Vec<GpuCall>,
    programs: Vec<RecordedProgram>,
    declared: HashMap<String, HashSet<String>>,
    rejected: HashSet<String>,

    next_mesh: u32,
    next_image: u32,
    next_framebuffer: u32,

    screen: (u32, u32),
    target: RenderTarget,
    program: Option<ProgramId>,
    textures: [Option<ImageId>; 2],
    mesh: Option<MeshId>,
    depth_test: bool,
    blending: bool,
    viewport: (u32, u32, u32, u32),
}

impl RecordingBackend {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            calls: Vec::new(),
            programs: Vec::new(),
            declared: HashMap::new(),
            rejected: HashSet::new(),
            next_mesh: 0,
            next_image: 0,
            next_framebuffer: 0,
            screen: (screen_width, screen_height),
            target: RenderTarget::Screen,
            program: None,
            textures: [None; 2],
            mesh: None,
            depth_test: false,
            blending: false,
            viewport: (0, 0, screen_width, screen_height),
        }
    }

    /// Programs compiled later under `label` only resolve the listed uniforms.
    pub fn declare_uniforms(&mut self, label: &str, names: &[&str]) {
        self.declared
            .insert(label.to_string(), names.iter().map(|n| n.to_string()).collect());
    }

    /// Programs compiled later under `label` fail to compile.
    pub fn reject_program(&mut self, label: &str) {
        self.rejected.insert(label.to_string());
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen = (width, height);
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> Vec<&DrawRecord> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Draw(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn program_label(&self, program: ProgramId) -> Option<&str> {
        self.programs.get(program.0 as usize).map(|p| p.label.as_str())
    }

    /// Last value written to `name` in `program`.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<&UniformValue> {
        self.programs.get(program.0 as usize)?.values.get(name)
    }

    /// How many times `name` was resolved through `uniform_location`.
    pub fn location_queries(&self, program: ProgramId, name: &str) -> usize {
        self.programs
            .get(program.0 as usize)
            .and_then(|p| p.queries.get(name).copied())
            .unwrap_or(0)
    }

    fn current_uniforms(&self) -> BTreeMap<String, UniformValue> {
        self.program
            .and_then(|p| self.programs.get(p.0 as usize))
            .map(|p| p.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl GpuBackend for RecordingBackend {
    fn compile_program(&mut self, label: &str, _vertex_src: &str, _fragment_src: &str) -> Result<ProgramId, GpuError> {
        if self.rejected.contains(label) {
            return Err(GpuError::ShaderCompile {
                label: label.to_string(),
                message: "rejected by recording backend".to_string(),
            });
        }
        let program = ProgramId(self.programs.len() as u32);
        self.programs.push(RecordedProgram {
            label: label.to_string(),
            declared: self.declared.get(label).cloned(),
            ..RecordedProgram::default()
        });
        self.calls.push(GpuCall::CompileProgram { program, label: label.to_string() });
        Ok(program)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let p = self.programs.get_mut(program.0 as usize)?;
        *p.queries.entry(name.to_string()).or_insert(0) += 1;

        if let Some(declared) = &p.declared {
            if !declared.contains(name) {
                return None;
            }
        }
        let index = match p.names.iter().position(|n| n == name) {
            Some(i) => i,
            None => {
                p.names.push(name.to_string());
                p.names.len() - 1
            }
        };
        Some(UniformLocation(index as u32))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let Some(p) = self.programs.get_mut(program.0 as usize) else { return };
        let Some(name) = p.names.get(location.0 as usize).cloned() else { return };
        p.values.insert(name.clone(), value.clone());
        self.calls.push(GpuCall::SetUniform { program, name, value: value.clone() });
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshId {
        let mesh = MeshId(self.next_mesh);
        self.next_mesh += 1;
        self.calls.push(GpuCall::CreateMesh { mesh, vertices: vertices.len(), indices: indices.len() });
        mesh
    }

    fn destroy_mesh(&mut self, mesh: MeshId) {
        if self.mesh == Some(mesh) {
            self.mesh = None;
        }
        self.calls.push(GpuCall::DestroyMesh(mesh));
    }

    fn create_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<ImageId, GpuError> {
        check_rgba_len(width, height, rgba)?;
        let image = ImageId(self.next_image);
        self.next_image += 1;
        self.calls.push(GpuCall::CreateImage { image, width, height });
        Ok(image)
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> Framebuffer {
        let color = ImageId(self.next_image);
        self.next_image += 1;
        let fb = Framebuffer { id: FramebufferId(self.next_framebuffer), color, width, height };
        self.next_framebuffer += 1;
        self.calls.push(GpuCall::CreateFramebuffer(fb));
        fb
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.target = target;
        self.calls.push(GpuCall::BindTarget(target));
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.calls.push(GpuCall::Viewport { x, y, width, height });
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.calls.push(GpuCall::DepthTest(enabled));
    }

    fn set_blending(&mut self, enabled: bool) {
        self.blending = enabled;
        self.calls.push(GpuCall::Blending(enabled));
    }

    fn clear(&mut self, clear: Clear) {
        self.calls.push(GpuCall::Clear(clear));
    }

    fn bind_texture(&mut self, unit: TextureUnit, image: ImageId) {
        self.textures[unit.slot()] = Some(image);
        self.calls.push(GpuCall::BindTexture { unit, image });
    }

    fn bind_mesh(&mut self, mesh: MeshId) {
        self.mesh = Some(mesh);
        self.calls.push(GpuCall::BindMesh(mesh));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let record = DrawRecord {
            program: self.program,
            target: self.target,
            color: self.textures[0],
            normal: self.textures[1],
            mesh: self.mesh,
            index_count,
            depth_test: self.depth_test,
            blending: self.blending,
            viewport: self.viewport,
            uniforms: self.current_uniforms(),
        };
        self.calls.push(GpuCall::Draw(record));
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_captures_bound_state() {
        let mut gpu = RecordingBackend::new(640, 480);
        let program = gpu.compile_program("p", "", "").unwrap();
        let image = gpu.create_image(1, 1, &[255; 4]).unwrap();
        let mesh = gpu.create_mesh(&[], &[0, 1, 2]);

        gpu.use_program(program);
        gpu.bind_texture(TextureUnit::Color, image);
        gpu.bind_mesh(mesh);
        gpu.set_depth_test(true);
        gpu.draw_indexed(3);

        let draws = gpu.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, Some(program));
        assert_eq!(draws[0].color, Some(image));
        assert_eq!(draws[0].mesh, Some(mesh));
        assert!(draws[0].depth_test);
        assert_eq!(draws[0].target, RenderTarget::Screen);
    }

    #[test]
    fn destroyed_mesh_is_unbound() {
        let mut gpu = RecordingBackend::new(640, 480);
        let mesh = gpu.create_mesh(&[], &[0, 1, 2]);
        gpu.bind_mesh(mesh);
        gpu.destroy_mesh(mesh);
        gpu.draw_indexed(3);

        assert_eq!(gpu.calls().iter().filter(|c| **c == GpuCall::DestroyMesh(mesh)).count(), 1);
        assert_eq!(gpu.draws()[0].mesh, None);
    }

    #[test]
    fn framebuffer_colour_gets_its_own_image() {
        let mut gpu = RecordingBackend::new(640, 480);
        let a = gpu.create_image(1, 1, &[0; 4]).unwrap();
        let fb = gpu.create_framebuffer(320, 240);
        assert_ne!(fb.color, a);
        assert_eq!((fb.width, fb.height), (320, 240));
    }

    #[test]
    fn declared_uniforms_restrict_lookups() {
        let mut gpu = RecordingBackend::new(640, 480);
        gpu.declare_uniforms("post", &["exposure"]);
        let p = gpu.compile_program("post", "", "").unwrap();
        assert!(gpu.uniform_location(p, "exposure").is_some());
        assert!(gpu.uniform_location(p, "u_model").is_none());
        assert_eq!(gpu.location_queries(p, "u_model"), 1);
    }
}
