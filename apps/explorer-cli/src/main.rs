use anyhow::Context;
use clap::{Parser, Subcommand};
use explorer_assets::AssetLoader;
use explorer_common::ImageData;
use explorer_input::Key;
use explorer_render::{Command, RecordingDevice};
use explorer_scene::{FrameHost, Game, HeadlessHost, SceneAssets, SceneConfig};
use glam::Vec3;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "explorer-cli", about = "CLI tool for explorer scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a scene config and its assets, and build the scene without a GPU
    Validate {
        /// Scene config (YAML); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Asset root
        #[arg(long, default_value = "assets")]
        assets: PathBuf,
    },
    /// Walk forward for a number of frames, collect, and print the last frame
    Replay {
        /// Frames of forward movement at 60 Hz
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Scene config (YAML); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Asset root; solid placeholder textures when omitted
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Print the effective scene config as YAML
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::from_yaml_file(path)?,
        None => SceneConfig::default(),
    })
}

fn placeholder_assets(config: &SceneConfig) -> SceneAssets {
    let image = ImageData::solid(2, 2, [180, 180, 180, 255]);
    SceneAssets::from_parts(
        "placeholder vertex stage",
        "placeholder fragment stage",
        [
            config.textures.floor.clone(),
            config.textures.wall.clone(),
            config.textures.boxes.clone(),
        ]
        .into_iter()
        .map(|path| (path, image.clone())),
    )
}

struct ReplaySummary {
    camera: Vec3,
    collected: usize,
    boxes: usize,
    last_frame: String,
    released: usize,
    live: usize,
}

/// Hold W for `frames` frames, tap F once, then tear the scene down.
fn replay(
    config: &SceneConfig,
    assets: &SceneAssets,
    frames: u32,
) -> anyhow::Result<ReplaySummary> {
    let mut host = HeadlessHost::new(config.window.width, config.window.height);
    let size = host.size();
    let mut game = Game::new(config, assets, host.device(), size)?;
    game.attach(&mut host);
    tracing::info!(frames, boxes = game.scene().boxes.len(), "replay started");

    host.hold(Key::W);
    for _ in 0..frames {
        game.frame(&mut host);
    }
    host.release(Key::W);
    host.tap(Key::F);
    game.frame(&mut host);

    let boxes = game.scene().boxes.len();
    let collected = boxes - game.scene().remaining();
    let camera = game.camera().position;
    let last_frame = host.recording().describe_frame();
    tracing::debug!(collected, ?camera, "replay finished");

    game.teardown(host.device());
    let released = host.recording().destroyed().len();
    let live = host.recording().live_resources().len();
    tracing::info!(released, live, "replay torn down");

    Ok(ReplaySummary {
        camera,
        collected,
        boxes,
        last_frame,
        released,
        live,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("explorer-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", explorer_input::crate_info());
            println!("assets: {}", explorer_assets::crate_info());
            println!("render: {}", explorer_render::crate_info());
            println!("scene: {}", explorer_scene::crate_info());
        }
        Commands::Validate { config, assets } => {
            let config = load_config(config.as_deref())?;
            tracing::info!(assets = %assets.display(), "validating scene");
            let loader = AssetLoader::new(&assets);
            let scene_assets = SceneAssets::load(&config, &loader)
                .with_context(|| format!("loading assets from {}", assets.display()))?;

            for (path, image) in scene_assets.images() {
                println!("texture {path}: {}x{}", image.width(), image.height());
            }
            println!(
                "shaders: vertex {} bytes, fragment {} bytes",
                scene_assets.vertex_source.len(),
                scene_assets.fragment_source.len()
            );

            let mut device = RecordingDevice::new();
            let size = (config.window.width, config.window.height);
            let game = Game::new(&config, &scene_assets, &mut device, size)?;
            let textures = device
                .commands()
                .iter()
                .filter(|c| matches!(c, Command::CreateTexture { .. }))
                .count();
            println!(
                "OK: {} boxes, {} props, {} walls, {} distinct textures",
                game.scene().boxes.len(),
                game.scene().props.len(),
                game.scene().walls.len(),
                textures
            );
            game.teardown(&mut device);
            tracing::info!(
                released = device.destroyed().len(),
                "validation scene torn down"
            );
        }
        Commands::Replay {
            frames,
            config,
            assets,
        } => {
            let config = load_config(config.as_deref())?;
            let scene_assets = match &assets {
                Some(root) => SceneAssets::load(&config, &AssetLoader::new(root))?,
                None => placeholder_assets(&config),
            };
            println!("Replay: {frames} frames forward, then collect");
            let summary = replay(&config, &scene_assets, frames)?;
            let p = summary.camera;
            println!("Camera: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
            println!("Collected: {} / {}", summary.collected, summary.boxes);
            print!("{}", summary.last_frame);
            println!(
                "Teardown: {} resources released, {} live",
                summary.released, summary.live
            );
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_yaml_string()?);
        }
    }

    Ok(())
}
