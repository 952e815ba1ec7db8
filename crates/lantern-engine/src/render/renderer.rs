use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec3};

use crate::paint::Color;

use super::backend::{Clear, Framebuffer, GpuBackend, RenderTarget, TextureUnit};
use super::camera::{screen_projection, Camera2D};
use super::error::GpuError;
use super::item::{RenderItem, Renderable};
use super::light::{Light, LightUniforms, MAX_LIGHTS};
use super::mesh::Mesh;
use super::queue::BatchQueue;
use super::shader::{uniforms, Shader, ShaderId};

/// Built-in textured, lit object program.
pub const OBJECT_SHADER: &str = include_str!("shaders/object.wgsl");
/// Built-in UI program: texture times tint.
pub const UI_SHADER: &str = include_str!("shaders/ui.wgsl");
/// Built-in post program: exposure scale. Its vertex stage can be paired with custom
/// post fragments.
pub const POST_SHADER: &str = include_str!("shaders/post.wgsl");

/// Registry name of the built-in post shader.
pub const DEFAULT_POST: &str = "default";

/// Renderer initialization parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Logical width of the render target and of the projection.
    pub width: u32,
    /// Logical height of the render target and of the projection.
    pub height: u32,
    /// Screen colour behind the post-processed scene.
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { width: 800, height: 600, clear_color: [0.0, 0.0, 0.0, 1.0] }
    }
}

#[derive(Debug, Default)]
struct Warnings {
    light_cap: bool,
    size_mismatch: bool,
    unknown_post: HashSet<String>,
}

/// Frame renderer: batched scene pass into an offscreen target, post-process pass to
/// the screen, then a UI pass on top.
///
/// Per frame: [`begin_scene`](Self::begin_scene), any number of pushes, then
/// [`render`](Self::render).
pub struct SceneRenderer<B: GpuBackend> {
    backend: B,
    config: RendererConfig,

    shaders: Vec<Shader>,
    names: HashMap<String, ShaderId>,
    object: ShaderId,
    ui: ShaderId,
    default_post: ShaderId,
    active_post: ShaderId,

    scene: BatchQueue,
    ui_queue: BatchQueue,
    lights: Vec<Light>,

    camera: Camera2D,
    ambient: Vec3,
    exposure: f32,
    projection: Mat4,

    target: Framebuffer,
    screen_quad: Mesh,
    frame_open: bool,
    warnings: Warnings,
}

impl<B: GpuBackend> SceneRenderer<B> {
    /// Compiles the built-in programs and allocates the offscreen target.
    pub fn new(mut backend: B, config: RendererConfig) -> Result<Self, GpuError> {
        let object = Shader::compile(&mut backend, "object", OBJECT_SHADER, OBJECT_SHADER)?;
        let ui = Shader::compile(&mut backend, "ui", UI_SHADER, UI_SHADER)?;
        let post = Shader::compile(&mut backend, DEFAULT_POST, POST_SHADER, POST_SHADER)?;

        let width = config.width.max(1);
        let height = config.height.max(1);
        let target = backend.create_framebuffer(width, height);
        let screen_quad = Mesh::screen_quad(&mut backend);
        log::info!("scene renderer ready ({width}x{height} render target)");

        let mut names = HashMap::new();
        names.insert(DEFAULT_POST.to_string(), ShaderId(2));

        Ok(Self {
            backend,
            config,
            shaders: vec![object, ui, post],
            names,
            object: ShaderId(0),
            ui: ShaderId(1),
            default_post: ShaderId(2),
            active_post: ShaderId(2),
            scene: BatchQueue::new(),
            ui_queue: BatchQueue::new(),
            lights: Vec::with_capacity(MAX_LIGHTS),
            camera: Camera2D::default(),
            ambient: Vec3::ONE,
            exposure: 1.0,
            projection: screen_projection(width as f32, height as f32),
            target,
            screen_quad,
            frame_open: false,
            warnings: Warnings::default(),
        })
    }

    // ── frame protocol ────────────────────────────────────────────────────

    /// Starts a frame: empties every queue and records the frame parameters.
    pub fn begin_scene(&mut self, camera: Camera2D, ambient: Vec3, exposure: f32) {
        self.scene.clear();
        self.ui_queue.clear();
        self.lights.clear();

        self.camera = camera;
        self.ambient = ambient;
        self.exposure = exposure;

        let shader = &mut self.shaders[self.object.0];
        shader.bind(&mut self.backend);
        shader.set_vec4(&mut self.backend, uniforms::AMBIENT_LIGHT, ambient.extend(1.0).to_array());

        self.frame_open = true;
    }

    pub fn push_item(&mut self, item: RenderItem) {
        self.assert_frame_open("push_item");
        self.scene.push(item);
    }

    /// Queues every item `renderable` produces.
    pub fn push<R: Renderable + ?Sized>(&mut self, renderable: &R) {
        for item in renderable.render_items() {
            self.push_item(item);
        }
    }

    /// Adds a light for this frame. Lights past `MAX_LIGHTS` are dropped.
    pub fn push_light(&mut self, light: Light) {
        self.assert_frame_open("push_light");
        if self.lights.len() >= MAX_LIGHTS {
            if !self.warnings.light_cap {
                log::debug!("light limit of {MAX_LIGHTS} reached; extra lights are ignored");
                self.warnings.light_cap = true;
            }
            return;
        }
        self.lights.push(light);
    }

    pub fn push_ui(&mut self, item: RenderItem) {
        self.assert_frame_open("push_ui");
        self.ui_queue.push(item);
    }

    pub fn push_ui_renderable<R: Renderable + ?Sized>(&mut self, renderable: &R) {
        for item in renderable.render_items() {
            self.push_ui(item);
        }
    }

    fn assert_frame_open(&self, op: &str) {
        assert!(self.frame_open, "SceneRenderer::{op} called before begin_scene");
    }

    // ── post-process ──────────────────────────────────────────────────────

    /// Compiles and registers a shader under `name`, replacing any previous entry.
    pub fn load_shader(&mut self, vertex_src: &str, fragment_src: &str, name: &str) -> Result<ShaderId, GpuError> {
        let shader = Shader::compile(&mut self.backend, name, vertex_src, fragment_src)?;
        let id = ShaderId(self.shaders.len());
        self.shaders.push(shader);
        if self.names.insert(name.to_string(), id).is_some() {
            log::debug!("shader `{name}` re-registered");
        }
        Ok(id)
    }

    /// Selects the post shader. Unknown names fall back to the built-in one.
    pub fn set_post_shader(&mut self, name: &str) {
        match self.names.get(name) {
            Some(&id) => self.active_post = id,
            None => {
                if self.warnings.unknown_post.insert(name.to_string()) {
                    log::warn!("unknown post shader `{name}`; using `{DEFAULT_POST}`");
                }
                self.active_post = self.default_post;
            }
        }
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    // ── render ────────────────────────────────────────────────────────────

    /// Draws the frame and closes it. Queues and lights are empty afterwards.
    pub fn render(&mut self) {
        self.scene_pass();
        self.post_pass();
        self.ui_pass();

        self.scene.clear();
        self.ui_queue.clear();
        self.lights.clear();
        self.frame_open = false;
    }

    fn scene_pass(&mut self) {
        let (w, h) = (self.target.width, self.target.height);
        let view = self.camera.view_matrix();

        let gpu = &mut self.backend;
        gpu.bind_target(RenderTarget::Offscreen(self.target.id));
        gpu.set_viewport(0, 0, w, h);
        gpu.set_depth_test(true);
        gpu.set_blending(true);
        gpu.clear(Clear::color_and_depth([0.0; 4]));

        let lights = LightUniforms::pack(&self.lights, view, self.projection, (w, h));

        // Every program drawing this frame gets the same lighting state.
        let mut programs = vec![self.object];
        for batch in self.scene.batches() {
            for id in batch.items.iter().filter_map(|i| i.shader) {
                if !programs.contains(&id) {
                    programs.push(id);
                }
            }
        }
        for id in &programs {
            let shader = &mut self.shaders[id.0];
            shader.bind(gpu);
            if *id != self.object {
                shader.set_vec4(gpu, uniforms::AMBIENT_LIGHT, self.ambient.extend(1.0).to_array());
            }
            shader.set_vec2(gpu, uniforms::RESOLUTION, [w as f32, h as f32]);
            shader.set_vec3_array(gpu, uniforms::LIGHT_POS, &lights.positions);
            shader.set_vec3_array(gpu, uniforms::FALLOFF, &lights.falloffs);
            shader.set_vec4_array(gpu, uniforms::LIGHT_COLOUR, &lights.colors);
        }

        let mut bound = *programs.last().unwrap_or(&self.object);
        for batch in self.scene.batches() {
            gpu.bind_texture(TextureUnit::Color, batch.image);
            for item in &batch.items {
                let id = item.shader.unwrap_or(self.object);
                let shader = &mut self.shaders[id.0];
                if id != bound {
                    shader.bind(gpu);
                    bound = id;
                }

                match item.normal_map {
                    Some(normal) => {
                        gpu.bind_texture(TextureUnit::Normal, normal.id);
                        shader.set_bool(gpu, uniforms::USE_NORMALS, true);
                    }
                    None => shader.set_bool(gpu, uniforms::USE_NORMALS, false),
                }
                shader.set_mat4(gpu, uniforms::MODEL, item.transform.model_matrix());
                shader.set_mat4(gpu, uniforms::VIEW, view);
                shader.set_mat4(gpu, uniforms::PROJECTION, self.projection);
                shader.set_vec4(gpu, uniforms::COLOUR, item.tint.unwrap_or(Color::WHITE).to_array());

                gpu.bind_mesh(item.mesh);
                gpu.draw_indexed(item.index_count);
            }
        }
    }

    fn post_pass(&mut self) {
        let gpu = &mut self.backend;
        gpu.bind_target(RenderTarget::Screen);
        gpu.set_depth_test(false);
        gpu.set_blending(false);
        gpu.clear(Clear::color(self.config.clear_color));

        let (sw, sh) = gpu.screen_size();
        if (sw, sh) != (self.target.width, self.target.height) && !self.warnings.size_mismatch {
            log::debug!(
                "screen is {sw}x{sh} but the render target is {}x{}; output is stretched",
                self.target.width,
                self.target.height
            );
            self.warnings.size_mismatch = true;
        }
        gpu.set_viewport(0, 0, sw, sh);

        let post = &mut self.shaders[self.active_post.0];
        post.bind(gpu);
        post.set_float(gpu, uniforms::EXPOSURE, self.exposure);
        post.set_vec2(gpu, uniforms::RESOLUTION, [self.target.width as f32, self.target.height as f32]);

        gpu.bind_texture(TextureUnit::Color, self.target.color);
        gpu.bind_mesh(self.screen_quad.id);
        gpu.draw_indexed(self.screen_quad.index_count);
    }

    fn ui_pass(&mut self) {
        let gpu = &mut self.backend;
        gpu.clear(Clear::depth());
        gpu.set_depth_test(false);
        gpu.set_blending(true);

        let view = Camera2D::screen_view();
        let mut bound = self.ui;
        self.shaders[self.ui.0].bind(gpu);

        // Painter's order: lower layers first, then batch order, then push order.
        let mut layers: Vec<f32> = self
            .ui_queue
            .batches()
            .iter()
            .flat_map(|b| b.items.iter().map(|i| i.transform.position.z))
            .collect();
        layers.sort_by(f32::total_cmp);
        layers.dedup();

        for layer in layers {
            for batch in self.ui_queue.batches() {
                let mut items = batch.items.iter().filter(|i| i.transform.position.z == layer).peekable();
                if items.peek().is_none() {
                    continue;
                }
                gpu.bind_texture(TextureUnit::Color, batch.image);
                for item in items {
                    let id = item.shader.unwrap_or(self.ui);
                    let shader = &mut self.shaders[id.0];
                    if id != bound {
                        shader.bind(gpu);
                        bound = id;
                    }
                    shader.set_mat4(gpu, uniforms::MODEL, item.transform.model_matrix());
                    shader.set_mat4(gpu, uniforms::VIEW, view);
                    shader.set_mat4(gpu, uniforms::PROJECTION, self.projection);
                    shader.set_vec4(gpu, uniforms::COLOUR, item.tint.unwrap_or(Color::WHITE).to_array());

                    gpu.bind_mesh(item.mesh);
                    gpu.draw_indexed(item.index_count);
                }
            }
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn shader(&self, id: ShaderId) -> &Shader {
        &self.shaders[id.0]
    }

    /// Looks up a shader registered with [`load_shader`](Self::load_shader).
    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.names.get(name).copied()
    }

    pub fn object_shader(&self) -> ShaderId {
        self.object
    }

    pub fn ui_shader(&self) -> ShaderId {
        self.ui
    }

    pub fn default_post_shader(&self) -> ShaderId {
        self.default_post
    }

    pub fn active_post_shader(&self) -> ShaderId {
        self.active_post
    }

    pub fn scene_queue(&self) -> &BatchQueue {
        &self.scene
    }

    pub fn ui_queue(&self) -> &BatchQueue {
        &self.ui_queue
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// The offscreen scene target.
    pub fn target(&self) -> Framebuffer {
        self.target
    }

    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }
}
