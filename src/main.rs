mod framework;
use kindling::backend::{FieldKind, RenderBackend};
use kindling::debug_panel::DebugPanel;
use kindling::headless::HeadlessBackend;
use kindling::render::{SurfaceState, WgpuBackend};
use kindling::scene::Scene;
use kindling::scene_params::{Demo, SceneParams};
use kindling::viewport::Viewport;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent};

gflags::define! {
    --config: &str = "scene_config.toml"
}
gflags::define! {
    /// One of cube, flame, flame_smoke. Empty uses the config file.
    --demo: &str = ""
}
gflags::define! {
    /// Seed for particle sampling, 0 draws one from the OS.
    --seed: u64 = 0
}
gflags::define! {
    /// Run this many frames without a window and exit.
    --headless_frames: u32 = 0
}

fn read_config_from_file(path: &str) -> anyhow::Result<SceneParams> {
    let params = std::fs::read_to_string(path)?.parse()?;
    Ok(params)
}

fn get_scene_config() -> SceneParams {
    let mut params = match read_config_from_file(CONFIG.flag) {
        Ok(params) => params,
        Err(e) => {
            error!("Failed to parse config file({}): {:?}", CONFIG.flag, e);
            kindling::scene_params::get_scene_config_from_default_file()
        }
    };
    if !DEMO.flag.is_empty() {
        match DEMO.flag.parse::<Demo>() {
            Ok(demo) => params.demo = demo,
            Err(e) => error!("Ignoring --demo: {:?}", e),
        }
    }
    params
}

// Logical size of a physical window extent.
fn logical_size(size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> (u32, u32) {
    let logical = size.to_logical::<f64>(scale_factor);
    (logical.width.round() as u32, logical.height.round() as u32)
}

fn make_rng() -> StdRng {
    match SEED.flag {
        0 => StdRng::from_entropy(),
        seed => StdRng::seed_from_u64(seed),
    }
}

struct App<B: RenderBackend> {
    scene: Scene<B>,
    panel: DebugPanel,
    scale_factor: f64,
}

impl<B: RenderBackend> App<B> {
    fn new(scene: Scene<B>, scale_factor: f64) -> Self {
        let panel = DebugPanel::new(scene.params());
        info!("Panel: {} (arrows to edit, H to hide)", panel.describe());
        App {
            scene,
            panel,
            scale_factor,
        }
    }

    fn regenerate(&mut self, kind: FieldKind, params: &SceneParams) {
        let result = match kind {
            FieldKind::Flame => self.scene.set_flame_params(params.flame),
            FieldKind::Smoke => self.scene.set_smoke_params(params.smoke),
        };
        if let Err(e) = result {
            error!("Keeping the previous {:?} field: {}", kind, e);
            self.panel.sync(self.scene.params());
        }
    }

    fn handle_key(&mut self, key: VirtualKeyCode, state: ElementState) {
        match (key, state) {
            (VirtualKeyCode::Up, ElementState::Pressed) => self.panel.select_previous(),
            (VirtualKeyCode::Down, ElementState::Pressed) => self.panel.select_next(),
            (VirtualKeyCode::Left, ElementState::Pressed) => {
                self.panel.adjust(-1);
            }
            (VirtualKeyCode::Right, ElementState::Pressed) => {
                self.panel.adjust(1);
            }
            (VirtualKeyCode::Left, ElementState::Released)
            | (VirtualKeyCode::Right, ElementState::Released) => {
                let params = *self.panel.params();
                for kind in self.panel.commit() {
                    self.regenerate(kind, &params);
                }
            }
            (VirtualKeyCode::H, ElementState::Pressed) => {
                self.panel.visible = !self.panel.visible;
            }
            _ => (),
        }
    }

    fn handle_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { input, .. } => {
                if let Some(key) = input.virtual_keycode {
                    self.handle_key(key, input.state);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => self
                .scene
                .controls_mut()
                .set_dragging(state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                let height = (self.scene.viewport().height as f64 * self.scale_factor) as u32;
                self.scene
                    .controls_mut()
                    .pointer_moved(position.x, position.y, height);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
                };
                self.scene.controls_mut().zoom(steps);
            }
            _ => (),
        }
    }
}

impl framework::Example for App<WgpuBackend> {
    fn init(gpu: framework::Gpu, window: &winit::window::Window) -> anyhow::Result<Self> {
        let params = get_scene_config();
        let scale_factor = window.scale_factor();
        let size = window.inner_size();
        let (width, height) = logical_size(size, scale_factor);
        let viewport = Viewport::new(width, height, scale_factor);
        let surface_state = SurfaceState::new(size.width, size.height, scale_factor);
        let backend =
            WgpuBackend::init(gpu.surface, gpu.device, gpu.queue, gpu.format, surface_state);
        let scene = Scene::new(params, backend, viewport, make_rng())?;
        Ok(App::new(scene, scale_factor))
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        self.scale_factor = scale_factor;
        self.scene
            .backend_mut()
            .set_surface_size(size.width, size.height);
        let (width, height) = logical_size(size, scale_factor);
        self.scene.resize(width, height, scale_factor);
    }

    fn update(&mut self, event: WindowEvent) {
        self.handle_event(event);
    }

    fn render(&mut self) {
        self.scene.frame();
    }

    fn shutdown(&mut self) {
        info!("Shutting down");
        self.scene.teardown();
    }
}

fn run_headless(frames: u32) -> anyhow::Result<()> {
    let params = get_scene_config();
    let viewport = Viewport::new(1280, 720, 1.0);
    let mut scene = Scene::new(params, HeadlessBackend::new(), viewport, make_rng())?;
    for _ in 0..frames {
        scene.frame();
    }
    info!(
        "Rendered {} headless frames of {:?} in {:.3}s with {} live fields",
        scene.backend().frames_rendered,
        params.demo,
        scene.clock().elapsed(),
        scene.backend().live_fields()
    );
    scene.teardown();
    Ok(())
}

fn main() {
    if let Err(e) = framework::init() {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
    let result = match HEADLESS_FRAMES.flag {
        0 => framework::run::<App<WgpuBackend>>("Kindling"),
        frames => run_headless(frames),
    };
    if let Err(e) = result {
        error!("{:?}", e);
        std::process::exit(1);
    }
}
