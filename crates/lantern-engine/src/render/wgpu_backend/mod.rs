//! `GpuBackend` implementation on top of wgpu.
//!
//! wgpu has no global bind state, so calls are recorded during the frame and replayed
//! by [`WgpuBackend::flush`] into render passes:
//! - binding a different target, or clearing after draws, starts a new pass
//! - clears become the pass load ops
//! - each draw snapshots its program's uniform block into a shared dynamic-offset buffer
//!
//! Pipelines are cached per (program, target format, depth test, blending).

mod reflect;

use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use super::backend::{
    check_rgba_len, Clear, Framebuffer, FramebufferId, GpuBackend, ImageId, MeshId, ProgramId,
    RenderTarget, TextureUnit, UniformLocation, UniformValue,
};
use super::error::GpuError;
use super::mesh::Vertex;
use reflect::{UniformBlock, FRAGMENT_ENTRY, VERTEX_ENTRY};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const IMAGE_SRGB_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const INITIAL_UNIFORM_CAPACITY: u64 = 64 * 1024;

// ── resources ─────────────────────────────────────────────────────────────

struct Program {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    block: UniformBlock,
    shadow: Vec<u8>,
    /// Uniform bind group and the arena generation it was built against.
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

/// Texture plus its two sampling views: colour unit samples sRGB, the normal unit
/// samples raw values.
struct GpuImage {
    _texture: wgpu::Texture,
    srgb: wgpu::TextureView,
    linear: wgpu::TextureView,
}

struct GpuFramebuffer {
    color: ImageId,
    depth: wgpu::TextureView,
    width: u32,
    height: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: ProgramId,
    format: wgpu::TextureFormat,
    depth_test: bool,
    blending: bool,
}

/// Per-frame uniform storage. Every draw appends its program's block at an aligned
/// offset; the whole range is uploaded once at flush.
struct UniformArena {
    buffer: wgpu::Buffer,
    capacity: u64,
    alignment: u64,
    staging: Vec<u8>,
    /// Bumped whenever `buffer` is replaced.
    generation: u64,
}

impl UniformArena {
    fn new(device: &wgpu::Device, alignment: u32) -> Self {
        Self {
            buffer: create_uniform_buffer(device, INITIAL_UNIFORM_CAPACITY),
            capacity: INITIAL_UNIFORM_CAPACITY,
            alignment: u64::from(alignment.max(1)),
            staging: Vec::new(),
            generation: 0,
        }
    }

    fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = align_up(self.staging.len() as u64, self.alignment);
        self.staging.resize(offset as usize, 0);
        self.staging.extend_from_slice(bytes);
        offset as u32
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = self.staging.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("growing uniform arena {} -> {capacity} bytes", self.capacity);
            self.buffer = create_uniform_buffer(device, capacity);
            self.capacity = capacity;
            self.generation += 1;
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
    }

    fn reset(&mut self) {
        self.staging.clear();
    }
}

fn create_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lantern uniform arena"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[inline]
fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

// ── recorded commands ─────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
struct DrawCall {
    program: ProgramId,
    textures: [ImageId; 2],
    mesh: MeshId,
    index_count: u32,
    depth_test: bool,
    blending: bool,
    viewport: (u32, u32, u32, u32),
    uniform_offset: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Command {
    Target(RenderTarget),
    Clear(Clear),
    Draw(DrawCall),
}

/// One render pass worth of work.
#[derive(Debug, Clone, PartialEq)]
struct PassPlan {
    target: RenderTarget,
    clear_color: Option<[f32; 4]>,
    clear_depth: bool,
    draws: Vec<DrawCall>,
}

impl PassPlan {
    fn new(target: RenderTarget) -> Self {
        Self { target, clear_color: None, clear_depth: false, draws: Vec::new() }
    }

    fn has_work(&self) -> bool {
        self.clear_color.is_some() || self.clear_depth || !self.draws.is_empty()
    }
}

/// Splits a recorded command stream into render passes.
fn plan_passes(commands: &[Command]) -> Vec<PassPlan> {
    let mut passes = Vec::new();
    let mut current = PassPlan::new(RenderTarget::Screen);

    for cmd in commands {
        match *cmd {
            Command::Target(target) => {
                if current.target != target {
                    let done = std::mem::replace(&mut current, PassPlan::new(target));
                    if done.has_work() {
                        passes.push(done);
                    }
                }
            }
            Command::Clear(clear) => {
                if !current.draws.is_empty() {
                    let target = current.target;
                    passes.push(std::mem::replace(&mut current, PassPlan::new(target)));
                }
                if let Some(color) = clear.color {
                    current.clear_color = Some(color);
                }
                current.clear_depth |= clear.depth;
            }
            Command::Draw(draw) => current.draws.push(draw),
        }
    }

    if current.has_work() {
        passes.push(current);
    }
    passes
}

/// Clips a viewport to the attachment size.
fn clamp_viewport(viewport: (u32, u32, u32, u32), size: (u32, u32)) -> (u32, u32, u32, u32) {
    let (x, y, w, h) = viewport;
    let x = x.min(size.0);
    let y = y.min(size.1);
    (x, y, w.min(size.0 - x), h.min(size.1 - y))
}

#[derive(Debug, Clone)]
struct BoundState {
    target: RenderTarget,
    program: Option<ProgramId>,
    textures: [Option<ImageId>; 2],
    mesh: Option<MeshId>,
    depth_test: bool,
    blending: bool,
    viewport: (u32, u32, u32, u32),
}

// ── backend ───────────────────────────────────────────────────────────────

/// wgpu-backed [`GpuBackend`].
///
/// Create once per window, then call [`flush`](Self::flush) every frame after the
/// renderer has issued its commands.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    screen: (u32, u32),
    screen_depth: wgpu::TextureView,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    programs: Vec<Program>,
    meshes: Vec<Option<GpuMesh>>,
    /// Meshes destroyed this frame, dropped once the frame is encoded.
    retired_meshes: Vec<MeshId>,
    images: Vec<GpuImage>,
    framebuffers: Vec<GpuFramebuffer>,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    texture_groups: HashMap<[ImageId; 2], wgpu::BindGroup>,
    uniforms: UniformArena,
    /// Images sampled by units nothing was bound to: white and a flat normal.
    fallback: [ImageId; 2],

    state: BoundState,
    commands: Vec<Command>,
    warned_incomplete_draw: bool,
}

impl WgpuBackend {
    /// `screen` is the surface size in physical pixels.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        screen: (u32, u32),
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lantern uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lantern texture bgl"),
            entries: &[texture_entry(0), sampler_entry(1), texture_entry(2), sampler_entry(3)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lantern pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        // Pixel art: no filtering, tiles wrap.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lantern sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let uniforms = UniformArena::new(&device, alignment);
        let screen = (screen.0.max(1), screen.1.max(1));
        let screen_depth = create_depth_view(&device, screen.0, screen.1, "lantern screen depth");

        let mut backend = Self {
            device,
            queue,
            surface_format,
            screen,
            screen_depth,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            programs: Vec::new(),
            meshes: Vec::new(),
            retired_meshes: Vec::new(),
            images: Vec::new(),
            framebuffers: Vec::new(),
            pipelines: HashMap::new(),
            texture_groups: HashMap::new(),
            uniforms,
            fallback: [ImageId(0), ImageId(0)],
            state: BoundState {
                target: RenderTarget::Screen,
                program: None,
                textures: [None; 2],
                mesh: None,
                depth_test: false,
                blending: false,
                viewport: (0, 0, screen.0, screen.1),
            },
            commands: Vec::new(),
            warned_incomplete_draw: false,
        };

        let white = backend.upload_image(1, 1, &[255, 255, 255, 255]);
        let flat_normal = backend.upload_image(1, 1, &[128, 128, 255, 255]);
        backend.fallback = [white, flat_normal];
        backend
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Tracks a surface resize. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.screen {
            return;
        }
        self.screen = (width, height);
        self.screen_depth = create_depth_view(&self.device, width, height, "lantern screen depth");
    }

    /// Replays the recorded frame into `encoder`. `surface_view` is the screen target.
    pub fn flush(&mut self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let commands = std::mem::take(&mut self.commands);

        for cmd in &commands {
            let Command::Draw(draw) = cmd else { continue };
            self.ensure_texture_group(draw.textures);
        }
        for pass in plan_passes(&commands) {
            let format = self.target_format(pass.target);
            for draw in &pass.draws {
                self.ensure_pipeline(PipelineKey {
                    program: draw.program,
                    format,
                    depth_test: draw.depth_test,
                    blending: draw.blending,
                });
            }
        }

        self.uniforms.upload(&self.device, &self.queue);
        for index in 0..self.programs.len() {
            self.ensure_uniform_group(index);
        }

        for pass in plan_passes(&commands) {
            self.encode_pass(encoder, surface_view, &pass);
        }

        self.uniforms.reset();
        for mesh in self.retired_meshes.drain(..) {
            if let Some(slot) = self.meshes.get_mut(mesh.0 as usize) {
                *slot = None;
            }
        }
        // Keep the allocation for next frame.
        self.commands = commands;
        self.commands.clear();
    }

    // ── lazy GPU objects ──────────────────────────────────────────────────

    fn target_format(&self, target: RenderTarget) -> wgpu::TextureFormat {
        match target {
            RenderTarget::Screen => self.surface_format,
            RenderTarget::Offscreen(_) => OFFSCREEN_FORMAT,
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(program) = self.programs.get(key.program.0 as usize) else { return };

        let blend = key.blending.then_some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&program.label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "built pipeline for `{}` ({:?}, depth={}, blend={})",
            program.label,
            key.format,
            key.depth_test,
            key.blending
        );
        self.pipelines.insert(key, pipeline);
    }

    fn ensure_texture_group(&mut self, textures: [ImageId; 2]) {
        if self.texture_groups.contains_key(&textures) {
            return;
        }
        let (Some(color), Some(normal)) = (
            self.images.get(textures[0].0 as usize),
            self.images.get(textures[1].0 as usize),
        ) else {
            return;
        };

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lantern texture bg"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&color.srgb) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&normal.linear) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(&self.sampler) },
            ],
        });
        self.texture_groups.insert(textures, group);
    }

    fn ensure_uniform_group(&mut self, index: usize) {
        let generation = self.uniforms.generation;
        let Some(program) = self.programs.get_mut(index) else { return };
        if matches!(program.bind_group, Some((g, _)) if g == generation) {
            return;
        }

        let size = NonZeroU64::new(u64::from(program.block.size));
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lantern uniform bg"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.uniforms.buffer,
                    offset: 0,
                    size,
                }),
            }],
        });
        program.bind_group = Some((generation, group));
    }

    fn upload_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> ImageId {
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lantern image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[IMAGE_SRGB_FORMAT],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let srgb = texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(IMAGE_SRGB_FORMAT),
            ..Default::default()
        });
        let linear = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.push_image(GpuImage { _texture: texture, srgb, linear })
    }

    fn push_image(&mut self, image: GpuImage) -> ImageId {
        let id = ImageId(self.images.len() as u32);
        self.images.push(image);
        id
    }

    // ── replay ────────────────────────────────────────────────────────────

    fn encode_pass(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView, pass: &PassPlan) {
        let (color_view, depth_view, size) = match pass.target {
            RenderTarget::Screen => (surface_view, &self.screen_depth, self.screen),
            RenderTarget::Offscreen(id) => {
                let Some(fb) = self.framebuffers.get(id.0 as usize) else { return };
                let Some(color) = self.images.get(fb.color.0 as usize) else { return };
                (&color.linear, &fb.depth, (fb.width, fb.height))
            }
        };

        let color_load = match pass.clear_color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = if pass.clear_depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lantern pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations { load: depth_load, store: wgpu::StoreOp::Store }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let format = self.target_format(pass.target);
        for draw in &pass.draws {
            let key = PipelineKey {
                program: draw.program,
                format,
                depth_test: draw.depth_test,
                blending: draw.blending,
            };
            let Some(pipeline) = self.pipelines.get(&key) else { continue };
            let Some(program) = self.programs.get(draw.program.0 as usize) else { continue };
            let Some((_, uniforms)) = program.bind_group.as_ref() else { continue };
            let Some(textures) = self.texture_groups.get(&draw.textures) else { continue };
            let Some(mesh) = self.meshes.get(draw.mesh.0 as usize).and_then(Option::as_ref) else { continue };

            let (x, y, w, h) = clamp_viewport(draw.viewport, size);
            if w == 0 || h == 0 {
                continue;
            }
            rpass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
            rpass.set_bind_group(1, textures, &[]);
            rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
            rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..draw.index_count.min(mesh.index_count), 0, 0..1);
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl GpuBackend for WgpuBackend {
    fn compile_program(&mut self, label: &str, vertex_src: &str, fragment_src: &str) -> Result<ProgramId, GpuError> {
        let shared = vertex_src == fragment_src;

        let (vertex_ir, vertex_block) = reflect::parse_module(label, vertex_src)?;
        reflect::require_entry(label, &vertex_ir, VERTEX_ENTRY, naga::ShaderStage::Vertex)?;

        let block = if shared {
            reflect::require_entry(label, &vertex_ir, FRAGMENT_ENTRY, naga::ShaderStage::Fragment)?;
            vertex_block
        } else {
            let (fragment_ir, fragment_block) = reflect::parse_module(label, fragment_src)?;
            reflect::require_entry(label, &fragment_ir, FRAGMENT_ENTRY, naga::ShaderStage::Fragment)?;
            reflect::merge_blocks(label, vertex_block, fragment_block)?
        };

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment = if shared {
            vertex.clone()
        } else {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
            })
        };

        let id = ProgramId(self.programs.len() as u32);
        log::debug!("program `{label}`: {} uniforms, {} byte block", block.fields.len(), block.size);
        self.programs.push(Program {
            label: label.to_string(),
            vertex,
            fragment,
            shadow: vec![0; block.size as usize],
            block,
            bind_group: None,
        });
        Ok(id)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(program.0 as usize)?;
        program.block.field_index(name).map(|i| UniformLocation(i as u32))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.state.program = Some(program);
    }

    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        let Some(program) = self.programs.get_mut(program.0 as usize) else { return };
        program.block.write(&mut program.shadow, location.0 as usize, value);
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshId {
        let vertices_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern mesh vbo"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern mesh ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(Some(GpuMesh {
            vertices: vertices_buf,
            indices: indices_buf,
            index_count: indices.len() as u32,
        }));
        id
    }

    fn destroy_mesh(&mut self, mesh: MeshId) {
        if self.state.mesh == Some(mesh) {
            self.state.mesh = None;
        }
        self.retired_meshes.push(mesh);
    }

    fn create_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<ImageId, GpuError> {
        check_rgba_len(width, height, rgba)?;
        Ok(self.upload_image(width, height, rgba))
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> Framebuffer {
        let (width, height) = (width.max(1), height.max(1));
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lantern framebuffer colour"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let srgb = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let linear = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let color = self.push_image(GpuImage { _texture: texture, srgb, linear });

        let depth = create_depth_view(&self.device, width, height, "lantern framebuffer depth");
        let id = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(GpuFramebuffer { color, depth, width, height });
        Framebuffer { id, color, width, height }
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.state.target = target;
        self.commands.push(Command::Target(target));
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.state.viewport = (x, y, width, height);
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_blending(&mut self, enabled: bool) {
        self.state.blending = enabled;
    }

    fn clear(&mut self, clear: Clear) {
        self.commands.push(Command::Clear(clear));
    }

    fn bind_texture(&mut self, unit: TextureUnit, image: ImageId) {
        self.state.textures[unit.slot()] = Some(image);
    }

    fn bind_mesh(&mut self, mesh: MeshId) {
        self.state.mesh = Some(mesh);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let (Some(program_id), Some(mesh)) = (self.state.program, self.state.mesh) else {
            if !self.warned_incomplete_draw {
                log::debug!("draw without a bound program or mesh; skipped");
                self.warned_incomplete_draw = true;
            }
            return;
        };
        let Some(program) = self.programs.get(program_id.0 as usize) else { return };

        let uniform_offset = self.uniforms.push(&program.shadow);
        let textures = [
            self.state.textures[0].unwrap_or(self.fallback[0]),
            self.state.textures[1].unwrap_or(self.fallback[1]),
        ];
        self.commands.push(Command::Draw(DrawCall {
            program: program_id,
            textures,
            mesh,
            index_count,
            depth_test: self.state.depth_test,
            blending: self.state.blending,
            viewport: self.state.viewport,
            uniform_offset,
        }));
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(program: u32) -> Command {
        Command::Draw(DrawCall {
            program: ProgramId(program),
            textures: [ImageId(0), ImageId(1)],
            mesh: MeshId(0),
            index_count: 6,
            depth_test: true,
            blending: true,
            viewport: (0, 0, 800, 600),
            uniform_offset: 0,
        })
    }

    #[test]
    fn frame_splits_into_scene_post_and_ui_passes() {
        let offscreen = RenderTarget::Offscreen(FramebufferId(0));
        let commands = [
            Command::Target(offscreen),
            Command::Clear(Clear::color_and_depth([0.0; 4])),
            draw(0),
            draw(0),
            Command::Target(RenderTarget::Screen),
            Command::Clear(Clear::color([0.1, 0.1, 0.1, 1.0])),
            draw(2),
            Command::Clear(Clear::depth()),
            draw(1),
        ];

        let passes = plan_passes(&commands);
        assert_eq!(passes.len(), 3);

        assert_eq!(passes[0].target, offscreen);
        assert_eq!(passes[0].clear_color, Some([0.0; 4]));
        assert!(passes[0].clear_depth);
        assert_eq!(passes[0].draws.len(), 2);

        assert_eq!(passes[1].target, RenderTarget::Screen);
        assert_eq!(passes[1].clear_color, Some([0.1, 0.1, 0.1, 1.0]));
        assert!(!passes[1].clear_depth);

        assert_eq!(passes[2].target, RenderTarget::Screen);
        assert_eq!(passes[2].clear_color, None);
        assert!(passes[2].clear_depth);
        assert_eq!(passes[2].draws.len(), 1);
    }

    #[test]
    fn clears_before_draws_merge() {
        let commands = [Command::Clear(Clear::color([1.0; 4])), Command::Clear(Clear::depth()), draw(0)];
        let passes = plan_passes(&commands);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].clear_color, Some([1.0; 4]));
        assert!(passes[0].clear_depth);
    }

    #[test]
    fn empty_target_switch_emits_no_pass() {
        let commands = [
            Command::Target(RenderTarget::Offscreen(FramebufferId(0))),
            Command::Target(RenderTarget::Screen),
            draw(0),
        ];
        let passes = plan_passes(&commands);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].target, RenderTarget::Screen);
    }

    #[test]
    fn viewport_is_clamped_to_attachment() {
        assert_eq!(clamp_viewport((0, 0, 1600, 1200), (800, 600)), (0, 0, 800, 600));
        assert_eq!(clamp_viewport((700, 0, 200, 100), (800, 600)), (700, 0, 100, 100));
        assert_eq!(clamp_viewport((900, 0, 10, 10), (800, 600)).2, 0);
    }

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(960, 256), 1024);
    }
}
