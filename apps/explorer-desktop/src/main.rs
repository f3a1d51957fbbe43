use anyhow::{Context, Result, anyhow};
use clap::Parser;
use explorer_assets::AssetLoader;
use explorer_input::{InputState, Key};
use explorer_render_wgpu::WgpuDevice;
use explorer_scene::{FrameHost, Game, SceneAssets, SceneConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "explorer-desktop", about = "Walk a small textured scene and collect boxes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory shader and texture paths are resolved against
    #[arg(long, default_value = "assets")]
    assets: PathBuf,
}

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}

/// Locked where supported, confined otherwise. The cursor is hidden while
/// grabbed.
fn apply_cursor_grab(window: &Window, grabbed: bool) {
    if grabbed {
        if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::Confined) {
                tracing::warn!("cursor grab unavailable: {e}");
            }
        }
    } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        tracing::warn!("failed to release cursor: {e}");
    }
    window.set_cursor_visible(!grabbed);
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: WgpuDevice,
}

/// Borrowed view of the app for one frame.
struct DesktopHost<'a> {
    window: &'a Window,
    gpu: &'a mut Gpu,
    input: &'a mut InputState,
    elapsed: f32,
    focused: bool,
}

impl FrameHost for DesktopHost<'_> {
    type Device = WgpuDevice;

    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn input(&self) -> &InputState {
        self.input
    }

    fn size(&self) -> (u32, u32) {
        (self.gpu.config.width, self.gpu.config.height)
    }

    fn set_cursor_grabbed(&mut self, grabbed: bool) {
        apply_cursor_grab(self.window, grabbed);
    }

    fn device(&mut self) -> &mut WgpuDevice {
        &mut self.gpu.device
    }

    fn swap_buffers(&mut self) {
        self.input.begin_frame();
        let gpu = &mut *self.gpu;
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(gpu.device.device(), &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        gpu.device.submit_frame(&view);
        output.present();
    }
}

struct ExplorerApp {
    config: SceneConfig,
    assets: SceneAssets,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    game: Option<Game>,
    input: InputState,
    focused: bool,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl ExplorerApp {
    fn new(config: SceneConfig, assets: SceneAssets) -> Self {
        Self {
            config,
            assets,
            window: None,
            gpu: None,
            game: None,
            input: InputState::new(),
            focused: true,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        // Hidden until the scene is on the GPU.
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_visible(false);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("explorer_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut device = WgpuDevice::new(device, queue, surface_format, config.width, config.height);
        let game = Game::new(
            &self.config,
            &self.assets,
            &mut device,
            (config.width, config.height),
        )?;

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        window.set_visible(true);
        apply_cursor_grab(&window, game.cursor_grabbed());
        self.last_frame = Instant::now();
        self.window = Some(window);
        self.gpu = Some(Gpu {
            surface,
            config,
            device,
        });
        self.game = Some(game);
        Ok(())
    }
}

impl ApplicationHandler for ExplorerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    self.input.release_all();
                } else if let (Some(window), Some(game)) = (&self.window, &self.game) {
                    apply_cursor_grab(window, game.cursor_grabbed());
                }
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(gpu), Some(game)) = (&mut self.gpu, &mut self.game) {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(gpu.device.device(), &gpu.config);
                    game.resize(&mut gpu.device, gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(code) {
                    self.input.key_event(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let elapsed = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;

                let (Some(window), Some(gpu), Some(game)) =
                    (&self.window, &mut self.gpu, &mut self.game)
                else {
                    return;
                };
                let mut host = DesktopHost {
                    window,
                    gpu,
                    input: &mut self.input,
                    elapsed,
                    focused: self.focused,
                };
                game.frame(&mut host);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.focused {
                self.input.mouse_motion(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let (Some(game), Some(gpu)) = (self.game.take(), &mut self.gpu) {
            game.teardown(&mut gpu.device);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("explorer-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::from_yaml_file(path)?,
        None => SceneConfig::default(),
    };
    let loader = AssetLoader::new(&cli.assets);
    let assets = SceneAssets::load(&config, &loader)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ExplorerApp::new(config, assets);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
