//! Lantern demo: a lit tile room, a few animated walkers, a normal-mapped crate and
//! an immediate-mode UI overlay.
//!
//! Controls: WASD moves, the light follows the mouse, the buttons switch the post
//! effect and change exposure.

mod art;

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use glam::{Vec2, Vec3};

use lantern_engine::core::{App, AppControl, FrameCtx, InitCtx};
use lantern_engine::device::GpuInit;
use lantern_engine::input::{Input, Key};
use lantern_engine::logging::{init_logging, LoggingConfig};
use lantern_engine::paint::Color;
use lantern_engine::physics::Collider;
use lantern_engine::render::{
    Camera2D, Light, RendererConfig, SceneRenderer, Sprite, TileLayer, Tilemap, WgpuBackend,
    DEFAULT_POST, POST_SHADER,
};
use lantern_engine::text::Font;
use lantern_engine::time::FpsTicker;
use lantern_engine::window::{Runtime, RuntimeConfig};
use lantern_ui::{DebugStats, Ui, UiStyle};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TITLE: &str = "lantern demo";

const EDGES_POST: &str = "edges";
const EDGES_FRAGMENT: &str = include_str!("shaders/post_edges.wgsl");

const MAP_COLS: u32 = 40;
const MAP_ROWS: u32 = 30;
const PLAYER_SPEED: f32 = 160.0;
const AMBIENT: Vec3 = Vec3::new(0.25, 0.25, 0.3);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: TITLE.to_string(),
        initial_size: winit::dpi::LogicalSize::new(WIDTH as f64, HEIGHT as f64),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Demo::default())
}

/// `LANTERN_FONT` first, then a few common system locations.
fn load_font() -> Result<Font> {
    if let Ok(path) = env::var("LANTERN_FONT") {
        return Font::load(&path).with_context(|| format!("LANTERN_FONT={path}"));
    }
    for candidate in FONT_CANDIDATES {
        if Path::new(candidate).is_file() {
            log::info!("using font {candidate}");
            return Ok(Font::load(candidate)?);
        }
    }
    bail!("no usable font found; set LANTERN_FONT to a .ttf file")
}

#[derive(Default)]
struct Demo {
    world: Option<World>,
}

struct Walker {
    sprite: Sprite,
    centre: Vec2,
    radius: f32,
    phase: f32,
}

struct World {
    renderer: SceneRenderer<WgpuBackend>,
    ui: Ui,
    font: Font,
    stats: DebugStats,
    fps: FpsTicker,

    map: Tilemap,
    player: Sprite,
    collider: Collider,
    walkers: Vec<Walker>,
    crate_sprite: Sprite,

    exposure: f32,
    edges: bool,
    toggle_held: bool,
    name: String,
}

impl App for Demo {
    fn init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()> {
        let config = RendererConfig { width: WIDTH, height: HEIGHT, ..RendererConfig::default() };
        let mut renderer = SceneRenderer::new(ctx.create_backend(), config).context("renderer setup")?;
        renderer
            .load_shader(POST_SHADER, EDGES_FRAGMENT, EDGES_POST)
            .context("edge shader")?;

        let ui = Ui::new(renderer.backend_mut(), UiStyle::default())?;
        let font = load_font()?;
        let world = World::build(renderer, ui, font)?;

        ctx.runtime.set_title(TITLE);
        self.world = Some(world);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(world) = self.world.as_mut() else {
            return AppControl::Exit;
        };
        if ctx.input.key_down(Key::Escape) {
            return AppControl::Exit;
        }

        world.update(ctx.input, ctx.time.dt, ctx.time.elapsed);
        let camera = world.camera();
        world.draw_scene(camera, ctx.input);
        world.draw_ui(ctx.input, ctx.time.dt);

        if let Some(sample) = world.fps.frame() {
            ctx.runtime.set_title(format!("{TITLE} - {:.0} fps", sample.fps));
            world.stats.add("fps", format!("{:.1}", sample.fps));
        }

        ctx.present(&mut world.renderer)
    }
}

impl World {
    fn build(mut renderer: SceneRenderer<WgpuBackend>, ui: Ui, font: Font) -> Result<Self> {
        let backend = renderer.backend_mut();

        let atlas = art::floor_atlas(backend)?;
        let (floor, walls) = room_layers();
        let map = Tilemap::new(backend, atlas, art::TILE, &[floor, walls.clone()], Some(walls));

        let frames = art::walker_frames(backend)?;
        let (map_w, map_h) = map.pixel_size();
        let start = Vec3::new(map_w as f32 / 2.0, map_h as f32 / 2.0, 2.0);
        let player = Sprite::animated(backend, 32.0, 32.0, start, &frames, 0.15).with_tint(Color::rgb(0.6, 0.9, 1.0));
        let collider = Collider::new(24, 24, start.x as i32, start.y as i32);

        let walkers = (0..3)
            .map(|i| {
                let centre = Vec2::new(300.0 + i as f32 * 320.0, 260.0 + (i % 2) as f32 * 400.0);
                Walker {
                    sprite: Sprite::animated(backend, 32.0, 32.0, centre.extend(2.0), &frames, 0.12 + i as f32 * 0.03),
                    centre,
                    radius: 60.0 + i as f32 * 20.0,
                    phase: i as f32 * 2.1,
                }
            })
            .collect();

        let (crate_tex, crate_normals) = art::crate_with_normals(backend)?;
        let crate_sprite = Sprite::new(backend, 48.0, 48.0, Vec3::new(start.x + 96.0, start.y, 2.0), crate_tex)
            .with_normal_map(crate_normals);

        let mut stats = DebugStats::new();
        stats.add("fps", "-");
        let fps = FpsTicker::start(Duration::from_secs(1)).context("fps ticker thread")?;

        Ok(Self {
            renderer,
            ui,
            font,
            stats,
            fps,
            map,
            player,
            collider,
            walkers,
            crate_sprite,
            exposure: 1.0,
            edges: false,
            toggle_held: false,
            name: String::new(),
        })
    }

    fn update(&mut self, input: &Input, dt: f32, elapsed: f32) {
        let mut dir = Vec2::ZERO;
        if input.key_down(Key::W) { dir.y -= 1.0; }
        if input.key_down(Key::S) { dir.y += 1.0; }
        if input.key_down(Key::A) { dir.x -= 1.0; }
        if input.key_down(Key::D) { dir.x += 1.0; }

        let step = dir.normalize_or_zero() * PLAYER_SPEED * dt;
        let pos = self.player.position();
        // Axes resolve separately so the player slides along walls.
        let mut next = Vec2::new(pos.x, pos.y);
        for axis in [Vec2::new(step.x, 0.0), Vec2::new(0.0, step.y)] {
            let candidate = next + axis;
            let moved = self.collider.centered_at(candidate.x as i32, candidate.y as i32);
            if !self.map.collides_collider(&moved) {
                next = candidate;
                self.collider = moved;
            }
        }
        self.player.set_position(next.x, next.y);
        if dir != Vec2::ZERO {
            self.player.advance(dt);
        }

        for w in &mut self.walkers {
            let t = elapsed * 0.8 + w.phase;
            let p = w.centre + Vec2::new(t.cos(), t.sin()) * w.radius;
            w.sprite.set_position(p.x, p.y);
            w.sprite.advance(dt);
        }
    }

    /// Keeps the player centred, clamped to the map.
    fn camera(&self) -> Camera2D {
        let (map_w, map_h) = self.map.pixel_size();
        let p = self.player.position();
        let x = (p.x - WIDTH as f32 / 2.0).clamp(0.0, (map_w - WIDTH) as f32);
        let y = (p.y - HEIGHT as f32 / 2.0).clamp(0.0, (map_h - HEIGHT) as f32);
        Camera2D::new(x, y)
    }

    fn draw_scene(&mut self, camera: Camera2D, input: &Input) {
        let r = &mut self.renderer;
        r.begin_scene(camera, AMBIENT, self.exposure);
        r.set_post_shader(if self.edges { EDGES_POST } else { DEFAULT_POST });

        r.push(&self.map);
        r.push(&self.crate_sprite);
        for w in &self.walkers {
            r.push(&w.sprite);
        }
        r.push(&self.player);

        let p = self.player.position();
        r.push_light(Light::new(Vec3::new(p.x, p.y, 1.0), Vec3::new(0.6, 0.8, 1.0), 0.8));
        for w in &self.walkers {
            let wp = w.sprite.position();
            r.push_light(Light::new(Vec3::new(wp.x, wp.y, 1.0), Vec3::new(1.0, 0.7, 0.3), 0.5));
        }
        if let Some(pointer) = input.pointer_position() {
            let world = pointer + Vec2::new(camera.x, camera.y);
            r.push_light(Light::new(world.extend(1.0), Vec3::new(1.0, 0.95, 0.8), 1.2));
        }

        self.stats.add("lights", r.lights().len());
        self.stats.add("exposure", format!("{:.2}", self.exposure));
    }

    fn draw_ui(&mut self, input: &Input, dt: f32) {
        let mut frame = self.ui.begin(&mut self.renderer, input, &mut self.font);

        let label = if self.edges { "Plain" } else { "Edges" };
        let pressed = frame.button(10.0, 10.0, 100.0, 30.0, label, 16, Color::rgb(0.2, 0.3, 0.6));
        if pressed && !self.toggle_held {
            self.edges = !self.edges;
        }
        self.toggle_held = pressed;

        if frame.button(120.0, 10.0, 30.0, 30.0, "-", 16, Color::rgb(0.3, 0.3, 0.3)) {
            self.exposure = (self.exposure - dt).max(0.1);
        }
        if frame.button(160.0, 10.0, 30.0, 30.0, "+", 16, Color::rgb(0.8, 0.8, 0.8)) {
            self.exposure = (self.exposure + dt).min(4.0);
        }

        frame.text_input("your name", 10.0, 50.0, 16, 16, &mut self.name);
        if !self.name.is_empty() {
            frame.label(&format!("hello, {}", self.name), 10.0, 84.0, 16, Color::rgb(1.0, 0.9, 0.6));
        }

        self.stats.draw(&mut frame, WIDTH as f32 - 150.0, 10.0, 14, Color::WHITE);
    }
}

/// Checkered floor with a wall border and a few pillars.
fn room_layers() -> (TileLayer, TileLayer) {
    let mut floor = TileLayer::new(MAP_COLS, MAP_ROWS);
    let mut walls = TileLayer::new(MAP_COLS, MAP_ROWS);

    for row in 0..MAP_ROWS {
        for col in 0..MAP_COLS {
            let tile = if (col + row) % 2 == 0 { art::FLOOR_LIGHT } else { art::FLOOR_DARK };
            let mossy = (col * 7 + row * 13) % 23 == 0;
            floor.set(col, row, Some(if mossy { art::MOSS } else { tile }));

            let border = col == 0 || row == 0 || col == MAP_COLS - 1 || row == MAP_ROWS - 1;
            let pillar = col % 8 == 4 && row % 7 == 3;
            if border || pillar {
                walls.set(col, row, Some(art::WALL));
            }
        }
    }

    (floor, walls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_has_solid_border_and_open_centre() {
        let (floor, walls) = room_layers();
        assert_eq!(floor.size(), (MAP_COLS, MAP_ROWS));
        assert_eq!(walls.get(0, 0), Some(art::WALL));
        assert_eq!(walls.get(MAP_COLS - 1, MAP_ROWS - 1), Some(art::WALL));
        assert_eq!(walls.get(MAP_COLS / 2, MAP_ROWS / 2), None);
        assert!(floor.get(MAP_COLS / 2, MAP_ROWS / 2).is_some());
    }

    #[test]
    fn edge_shader_pairs_with_post_vertex_stage() {
        assert!(EDGES_FRAGMENT.contains("fn fs_main"));
        assert!(!EDGES_FRAGMENT.contains("fn vs_main"));
        assert!(POST_SHADER.contains("fn vs_main"));
    }
}
