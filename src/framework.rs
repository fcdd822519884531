use anyhow::{anyhow, Context};
use winit::event::{self, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::Window;

gflags::define! {
    --log_filter: &str = "warn,kindling=info"
}
gflags::define! {
    -h, --help = false
}

// Parses flags and installs the logger. Call once at the top of main.
pub fn init() -> anyhow::Result<()> {
    gflags::parse();
    if HELP.flag {
        gflags::print_help_and_exit(0);
    }
    scrub_log::init_with_filter_string(LOG_FILTER.flag)
        .map_err(|e| anyhow!("Failed to initialize logging: {:?}", e))?;
    Ok(())
}

pub struct Gpu {
    pub surface: wgpu::Surface,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
}

// "Framework" for a windowed executable.
pub trait Example: 'static + Sized {
    fn init(gpu: Gpu, window: &Window) -> anyhow::Result<Self>;
    // Physical size of the window and its scale factor.
    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64);
    fn update(&mut self, event: WindowEvent);
    fn render(&mut self);
    fn shutdown(&mut self) {}
}

fn is_exit_request(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput {
            input:
                event::KeyboardInput {
                    virtual_keycode: Some(key),
                    state: event::ElementState::Pressed,
                    ..
                },
            ..
        } => matches!(key, event::VirtualKeyCode::Escape | event::VirtualKeyCode::Q),
        _ => false,
    }
}

async fn setup(window: &Window) -> anyhow::Result<Gpu> {
    let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
    let surface = unsafe { instance.create_surface(window) };
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .ok_or_else(|| anyhow!("No suitable GPU adapter found"))?;
    log::info!("Using adapter: {:?}", adapter.get_info());

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("Failed to create device")?;
    let format = surface
        .get_preferred_format(&adapter)
        .ok_or_else(|| anyhow!("Surface is incompatible with the adapter"))?;
    Ok(Gpu {
        surface,
        device,
        queue,
        format,
    })
}

async fn run_async<E: Example>(title: &str) -> anyhow::Result<()> {
    let event_loop = EventLoop::new();
    log::info!("Initializing the window...");
    let window = winit::window::WindowBuilder::new()
        .with_title(title)
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
        .build(&event_loop)
        .context("Failed to create window")?;
    let gpu = setup(&window).await?;

    log::info!("Initializing the example...");
    let mut example = E::init(gpu, &window)?;

    log::info!("Entering render loop...");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            event::Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => example.resize(size, window.scale_factor()),
            event::Event::WindowEvent {
                event:
                    WindowEvent::ScaleFactorChanged {
                        scale_factor,
                        new_inner_size,
                    },
                ..
            } => example.resize(*new_inner_size, scale_factor),
            event::Event::WindowEvent { event, .. } => {
                if is_exit_request(&event) {
                    *control_flow = ControlFlow::Exit;
                } else {
                    example.update(event);
                }
            }
            event::Event::MainEventsCleared => window.request_redraw(),
            event::Event::RedrawRequested(_) => example.render(),
            event::Event::LoopDestroyed => example.shutdown(),
            _ => (),
        }
    })
}

pub fn run<E: Example>(title: &str) -> anyhow::Result<()> {
    futures::executor::block_on(run_async::<E>(title))
}
