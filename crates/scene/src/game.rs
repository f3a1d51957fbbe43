//! The frame loop: input to state, state to draw calls.

use crate::config::{ControlsConfig, SceneConfig};
use crate::error::SceneError;
use crate::host::FrameHost;
use crate::scene::Scene;
use explorer_assets::{AssetError, AssetLoader};
use explorer_common::ImageData;
use explorer_input::Key;
use explorer_render::uniforms::{U_LIGHT_DIR, U_LIGHT_ON, U_MODEL, U_PROJ, U_TEX, U_VIEW, U_VIEW_POS};
use explorer_render::{Camera, Direction, GpuResources, MeshData, MeshId, ProgramId, RenderDevice, TextureId};
use glam::Mat4;
use std::collections::BTreeMap;

/// Texture unit every surface group samples from.
pub const TEXTURE_UNIT: u32 = 0;

const MOVEMENT_KEYS: [(Key, Direction); 4] = [
    (Key::W, Direction::Forward),
    (Key::S, Direction::Backward),
    (Key::A, Direction::Left),
    (Key::D, Direction::Right),
];

/// CPU-side inputs to scene construction: shader text and decoded images,
/// keyed by their configured path.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub vertex_source: String,
    pub fragment_source: String,
    images: BTreeMap<String, ImageData>,
}

impl SceneAssets {
    /// Read both shader stages and decode each distinct texture path once.
    pub fn load(config: &SceneConfig, loader: &AssetLoader) -> Result<Self, AssetError> {
        let vertex_source = loader.load_text(&config.shaders.vertex)?;
        let fragment_source = loader.load_text(&config.shaders.fragment)?;
        let mut images = BTreeMap::new();
        for path in texture_paths(config) {
            if !images.contains_key(path) {
                images.insert(path.to_string(), loader.load_image(path)?);
            }
        }
        tracing::info!(textures = images.len(), root = %loader.root().display(), "scene assets loaded");
        Ok(Self {
            vertex_source,
            fragment_source,
            images,
        })
    }

    pub fn from_parts(
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
        images: impl IntoIterator<Item = (String, ImageData)>,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            images: images.into_iter().collect(),
        }
    }

    pub fn image(&self, path: &str) -> Option<&ImageData> {
        self.images.get(path)
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, &ImageData)> {
        self.images.iter().map(|(path, image)| (path.as_str(), image))
    }
}

fn texture_paths(config: &SceneConfig) -> [&str; 3] {
    [
        &config.textures.floor,
        &config.textures.wall,
        &config.textures.boxes,
    ]
}

/// GPU handles the render pass draws with.
#[derive(Debug, Clone, Copy)]
struct SceneHandles {
    program: ProgramId,
    floor_texture: TextureId,
    wall_texture: TextureId,
    box_texture: TextureId,
    floor_mesh: MeshId,
    wall_mesh: MeshId,
    cube_mesh: MeshId,
}

impl SceneHandles {
    fn create<D: RenderDevice + ?Sized>(
        config: &SceneConfig,
        assets: &SceneAssets,
        device: &mut D,
        registry: &mut GpuResources,
    ) -> Result<Self, SceneError> {
        let program = registry.program(device, &assets.vertex_source, &assets.fragment_source)?;

        let mut textures: BTreeMap<&str, TextureId> = BTreeMap::new();
        for path in texture_paths(config) {
            if textures.contains_key(path) {
                continue;
            }
            let image = assets
                .image(path)
                .ok_or_else(|| SceneError::MissingTexture(path.to_string()))?;
            textures.insert(path, registry.texture(device, image));
        }
        let texture = |path: &str| textures[path];

        Ok(Self {
            program,
            floor_texture: texture(&config.textures.floor),
            wall_texture: texture(&config.textures.wall),
            box_texture: texture(&config.textures.boxes),
            floor_mesh: registry.mesh(
                device,
                &MeshData::textured_quad_xz(config.floor.size, config.floor.height),
            ),
            wall_mesh: registry.mesh(
                device,
                &MeshData::quad_xy(config.walls.size, -config.walls.depth),
            ),
            cube_mesh: registry.mesh(device, &MeshData::cube(1.0)),
        })
    }
}

/// Scene state and GPU handles for one run.
#[derive(Debug)]
pub struct Game {
    camera: Camera,
    scene: Scene,
    controls: ControlsConfig,
    clear_color: [f32; 4],
    cursor_grabbed: bool,
    handles: SceneHandles,
    resources: GpuResources,
}

impl Game {
    /// Create every GPU resource the scene needs. On failure, whatever was
    /// already created is released before the error is returned.
    pub fn new<D: RenderDevice + ?Sized>(
        config: &SceneConfig,
        assets: &SceneAssets,
        device: &mut D,
        (width, height): (u32, u32),
    ) -> Result<Self, SceneError> {
        config.validate()?;
        let mut resources = GpuResources::new();
        let handles = match SceneHandles::create(config, assets, device, &mut resources) {
            Ok(handles) => handles,
            Err(err) => {
                resources.teardown(device);
                return Err(err);
            }
        };

        let mut camera = Camera::new(config.camera.position, 1.0).with_orientation(
            config.camera.yaw_degrees,
            config.camera.pitch_degrees,
        );
        camera.fov = config.camera.fov_degrees.to_radians();
        camera.resize(width, height);
        device.resize(width.max(1), height.max(1));

        let [r, g, b] = config.clear_color;
        let scene = Scene::from_config(config);
        tracing::info!(
            boxes = scene.boxes.len(),
            props = scene.props.len(),
            walls = scene.walls.len(),
            gpu_resources = resources.len(),
            "scene loaded"
        );

        Ok(Self {
            camera,
            scene,
            controls: config.controls.clone(),
            clear_color: [r, g, b, 1.0],
            cursor_grabbed: true,
            handles,
            resources,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn light_on(&self) -> bool {
        self.scene.light.on
    }

    pub fn cursor_grabbed(&self) -> bool {
        self.cursor_grabbed
    }

    /// Push the initial cursor mode to a freshly created host.
    pub fn attach<H: FrameHost + ?Sized>(&self, host: &mut H) {
        host.set_cursor_grabbed(self.cursor_grabbed);
    }

    /// One full frame: update, render, present.
    pub fn frame<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        self.update(host);
        self.render(host.device());
        host.swap_buffers();
    }

    pub fn update<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if !host.is_focused() {
            return;
        }
        let dt = host.elapsed().clamp(0.0, self.controls.max_frame_seconds);
        self.scene.spin =
            (self.scene.spin + self.controls.spin_degrees_per_second * dt).rem_euclid(360.0);

        let input = host.input();
        let toggle_cursor = input.is_key_pressed(Key::Escape);
        let toggle_light = input.is_key_pressed(Key::E);
        let collect = input.is_key_pressed(Key::F);
        let mouse = input.mouse_delta();
        let held = MOVEMENT_KEYS.map(|(key, dir)| (input.is_key_down(key), dir));

        if toggle_cursor {
            self.cursor_grabbed = !self.cursor_grabbed;
            host.set_cursor_grabbed(self.cursor_grabbed);
            tracing::info!(grabbed = self.cursor_grabbed, "cursor mode toggled");
        }

        if toggle_light {
            self.scene.light.toggle();
            tracing::info!(on = self.scene.light.on, "light toggled");
        }

        if self.cursor_grabbed && mouse != glam::Vec2::ZERO {
            let s = self.controls.sensitivity;
            self.camera.add_yaw_pitch(mouse.x * s, -mouse.y * s);
        }

        let step = self.controls.speed * dt;
        for (down, dir) in held {
            if down {
                self.camera.move_by(dir, step);
            }
        }

        if collect {
            self.collect_nearby();
        }
    }

    /// Collect every box within range of the camera. Returns how many.
    pub fn collect_nearby(&mut self) -> usize {
        let collected = self
            .scene
            .collect_within(self.camera.position, self.controls.collect_distance);
        if collected > 0 {
            tracing::info!(
                collected,
                remaining = self.scene.remaining(),
                "boxes collected"
            );
        } else {
            tracing::debug!("nothing in range to collect");
        }
        collected
    }

    /// Record the frame's draw calls. Per-frame uniforms go up once; each
    /// surface group binds its texture once and sets the model matrix before
    /// every draw.
    pub fn render<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        let res = &self.handles;
        device.begin_frame(self.clear_color);
        device.use_program(res.program);

        device.set_matrix4(U_VIEW, self.camera.view_matrix());
        device.set_matrix4(U_PROJ, self.camera.projection_matrix());
        device.set_vector3(U_VIEW_POS, self.camera.position);
        device.set_vector3(U_LIGHT_DIR, self.scene.light.direction());
        device.set_int(U_LIGHT_ON, self.scene.light.uniform_value());
        device.set_int(U_TEX, TEXTURE_UNIT as i32);

        device.bind_texture(res.floor_texture, TEXTURE_UNIT);
        device.set_matrix4(U_MODEL, Mat4::IDENTITY);
        device.draw_mesh(res.floor_mesh);

        device.bind_texture(res.wall_texture, TEXTURE_UNIT);
        for wall in &self.scene.walls {
            device.set_matrix4(U_MODEL, wall.model_matrix());
            device.draw_mesh(res.wall_mesh);
        }

        device.bind_texture(res.box_texture, TEXTURE_UNIT);
        for prop in &self.scene.props {
            device.set_matrix4(U_MODEL, prop.transform().model_matrix());
            device.draw_mesh(res.cube_mesh);
        }
        for transform in self.scene.visible_boxes() {
            device.set_matrix4(U_MODEL, transform.model_matrix());
            device.draw_mesh(res.cube_mesh);
        }
    }

    /// Framebuffer resized: only the projection aspect changes.
    pub fn resize<D: RenderDevice + ?Sized>(&mut self, device: &mut D, width: u32, height: u32) {
        self.camera.resize(width, height);
        device.resize(width.max(1), height.max(1));
        tracing::debug!(width, height, aspect = self.camera.aspect, "resized");
    }

    /// Release every GPU resource, newest first.
    pub fn teardown<D: RenderDevice + ?Sized>(mut self, device: &mut D) {
        self.resources.teardown(device);
        tracing::info!("scene torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoxPlacement;
    use crate::headless::HeadlessHost;
    use explorer_render::{Command, DrawCall, RecordingDevice, ResourceId, ShaderError, ShaderStage};
    use glam::Vec3;

    const TEX: &str = "textures/texture.png";

    fn assets() -> SceneAssets {
        SceneAssets::from_parts(
            "vertex",
            "fragment",
            [(TEX.to_string(), ImageData::solid(4, 4, [128, 128, 128, 255]))],
        )
    }

    fn single_box_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.controls.collect_distance = 2.0;
        config.props.clear();
        config.boxes = vec![BoxPlacement::at(0.0, 0.5, 0.0)];
        config
    }

    fn start(config: &SceneConfig) -> (Game, HeadlessHost) {
        let mut host = HeadlessHost::new(1280, 720);
        let size = host.size();
        let game = Game::new(config, &assets(), host.device(), size).unwrap();
        game.attach(&mut host);
        (game, host)
    }

    fn box_draws<'a>(draws: &[&'a DrawCall], at: Vec3) -> Vec<&'a DrawCall> {
        draws
            .iter()
            .copied()
            .filter(|d| (d.model().w_axis.truncate() - at).length() < 1e-4)
            .collect()
    }

    #[test]
    fn walk_up_and_collect_box() {
        let (mut game, mut host) = start(&single_box_config());
        let box_pos = Vec3::new(0.0, 0.5, 0.0);

        host.tap(Key::F);
        game.frame(&mut host);
        assert!(!game.scene().boxes[0].is_collected());
        assert_eq!(box_draws(&host.recording().frame_draws(), box_pos).len(), 1);

        host.set_elapsed(0.1);
        host.hold(Key::W);
        for _ in 0..5 {
            game.frame(&mut host);
        }
        host.release(Key::W);
        assert!((game.camera().position - Vec3::new(0.0, 1.5, 1.0)).length() < 1e-4);

        host.tap(Key::F);
        game.frame(&mut host);
        assert!(game.scene().boxes[0].is_collected());
        assert!(box_draws(&host.recording().frame_draws(), box_pos).is_empty());

        host.tap(Key::F);
        game.frame(&mut host);
        assert!(game.scene().boxes[0].is_collected());
    }

    #[test]
    fn light_toggle_round_trips_uniform() {
        let (mut game, mut host) = start(&SceneConfig::default());
        let light_on = |host: &HeadlessHost| host.recording().frame_draws()[0].uniforms.light_on;

        game.frame(&mut host);
        assert_eq!(light_on(&host), 1);
        host.tap(Key::E);
        game.frame(&mut host);
        assert_eq!(light_on(&host), 0);
        game.frame(&mut host);
        assert_eq!(light_on(&host), 0);
        host.tap(Key::E);
        game.frame(&mut host);
        assert_eq!(light_on(&host), 1);
    }

    #[test]
    fn escape_toggles_cursor_and_gates_mouse_look() {
        let (mut game, mut host) = start(&SceneConfig::default());
        assert!(host.cursor_grabbed());

        host.mouse_motion(10.0, -20.0);
        game.frame(&mut host);
        assert!((game.camera().yaw() - (-89.0)).abs() < 1e-5);
        assert!((game.camera().pitch() - 2.0).abs() < 1e-5);

        host.tap(Key::Escape);
        game.frame(&mut host);
        assert!(!host.cursor_grabbed());
        assert!(!game.cursor_grabbed());

        host.mouse_motion(50.0, 50.0);
        game.frame(&mut host);
        assert!((game.camera().yaw() - (-89.0)).abs() < 1e-5);

        host.tap(Key::Escape);
        game.frame(&mut host);
        assert!(host.cursor_grabbed());
    }

    #[test]
    fn held_escape_toggles_once() {
        let (mut game, mut host) = start(&SceneConfig::default());
        host.hold(Key::Escape);
        for _ in 0..3 {
            game.frame(&mut host);
        }
        assert!(!game.cursor_grabbed());
    }

    #[test]
    fn render_pass_order_and_bindings() {
        let (mut game, mut host) = start(&SceneConfig::default());
        game.frame(&mut host);

        let commands = host.recording().frame_commands();
        assert!(matches!(commands[0], Command::BeginFrame { .. }));
        assert!(matches!(commands[1], Command::UseProgram(_)));
        let first_bind = commands
            .iter()
            .position(|c| matches!(c, Command::BindTexture { .. }))
            .unwrap();
        let first_draw = commands
            .iter()
            .position(|c| matches!(c, Command::Draw(_)))
            .unwrap();
        assert!(first_bind < first_draw);

        let binds = commands
            .iter()
            .filter(|c| matches!(c, Command::BindTexture { .. }))
            .count();
        assert_eq!(binds, 3);

        let draws = host.recording().frame_draws();
        // floor + 4 walls + 2 props + 3 boxes
        assert_eq!(draws.len(), 10);
        assert!(draws.iter().all(|d| d.texture.is_some()));
        assert_eq!(draws[0].model(), Mat4::IDENTITY);
        assert_eq!(draws[0].index_count, 6);
        assert!(draws[5..].iter().all(|d| d.index_count == 36));

        let view = game.camera().view_matrix().to_cols_array_2d();
        assert!(draws.iter().all(|d| d.uniforms.view == view));
    }

    #[test]
    fn every_draw_gets_its_own_model_matrix() {
        let (mut game, mut host) = start(&SceneConfig::default());
        game.frame(&mut host);
        let commands = host.recording().frame_commands();
        let mut model_set = false;
        for command in commands {
            match command {
                Command::SetMatrix4 { name, .. } if name == U_MODEL => model_set = true,
                Command::Draw(_) => {
                    assert!(model_set, "draw issued without a fresh model matrix");
                    model_set = false;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn boxes_spin_props_do_not() {
        let (mut game, mut host) = start(&SceneConfig::default());
        host.set_elapsed(0.05);
        game.frame(&mut host);
        game.frame(&mut host);
        assert!((game.scene().spin - 6.0).abs() < 1e-4);

        let draws = host.recording().frame_draws();
        let prop = box_draws(&draws, Vec3::new(-2.0, 0.5, -2.0))[0];
        assert_eq!(prop.model().x_axis.truncate(), Vec3::X);
        let spinning = box_draws(&draws, Vec3::new(0.0, 0.5, 0.0))[0];
        let expected = Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0))
            * Mat4::from_rotation_y(6.0_f32.to_radians());
        assert!(spinning.model().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn spin_wraps_at_a_full_turn() {
        let mut config = SceneConfig::default();
        config.controls.spin_degrees_per_second = 350.0;
        let (mut game, mut host) = start(&config);
        host.set_elapsed(0.1);
        for _ in 0..20 {
            game.frame(&mut host);
            let spin = game.scene().spin;
            assert!((0.0..360.0).contains(&spin), "spin {spin} left [0, 360)");
        }
        assert!((game.scene().spin - 340.0).abs() < 1e-2);
    }

    #[test]
    fn movement_is_frame_rate_independent() {
        let config = SceneConfig::default();
        let (mut coarse, mut coarse_host) = start(&config);
        let (mut fine, mut fine_host) = start(&config);

        coarse_host.set_elapsed(0.1);
        coarse_host.hold(Key::D);
        coarse.frame(&mut coarse_host);

        fine_host.set_elapsed(0.01);
        fine_host.hold(Key::D);
        for _ in 0..10 {
            fine.frame(&mut fine_host);
        }
        let delta = coarse.camera().position - fine.camera().position;
        assert!(delta.length() < 1e-4);
        assert!((coarse.camera().position.x - 0.4).abs() < 1e-5);
    }

    #[test]
    fn long_frames_are_clamped() {
        let (mut game, mut host) = start(&SceneConfig::default());
        host.set_elapsed(5.0);
        host.hold(Key::W);
        game.frame(&mut host);
        assert!((game.camera().position.z - (3.0 - 0.4)).abs() < 1e-5);
    }

    #[test]
    fn unfocused_frames_skip_simulation_but_still_render() {
        let (mut game, mut host) = start(&SceneConfig::default());
        host.set_focused(false);
        host.hold(Key::W);
        host.tap(Key::E);
        game.frame(&mut host);
        assert_eq!(game.camera().position, Vec3::new(0.0, 1.5, 3.0));
        assert!(game.light_on());
        assert_eq!(game.scene().spin, 0.0);
        assert_eq!(host.frames_presented(), 1);
        assert!(!host.recording().frame_draws().is_empty());
    }

    #[test]
    fn resize_updates_projection_only() {
        let (mut game, mut host) = start(&SceneConfig::default());
        game.frame(&mut host);
        let before = host.recording().frame_draws()[0].uniforms;

        game.resize(host.device(), 600, 600);
        game.frame(&mut host);
        let after = host.recording().frame_draws()[0].uniforms;

        assert_eq!(game.camera().aspect, 1.0);
        assert_ne!(before.proj, after.proj);
        assert_eq!(before.view, after.view);
        assert_eq!(game.camera().position, Vec3::new(0.0, 1.5, 3.0));
    }

    #[test]
    fn shared_texture_path_uploads_once() {
        let mut host = HeadlessHost::new(64, 64);
        let game = Game::new(&SceneConfig::default(), &assets(), host.device(), (64, 64)).unwrap();
        let uploads = host
            .recording()
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::CreateTexture { .. }))
            .count();
        assert_eq!(uploads, 1);
        game.teardown(host.device());
    }

    #[test]
    fn teardown_releases_everything_in_reverse() {
        let (game, mut host) = start(&SceneConfig::default());
        let created: Vec<ResourceId> = host.recording().live_resources().into_iter().collect();
        assert_eq!(created.len(), 5);

        game.teardown(host.device());
        let destroyed = host.recording().destroyed();
        assert!(host.recording().live_resources().is_empty());
        // ids are allocated in creation order
        let mut expected = destroyed.clone();
        expected.sort_by_key(|id| std::cmp::Reverse(raw_id(*id)));
        assert_eq!(destroyed, expected);
    }

    fn raw_id(id: ResourceId) -> u32 {
        match id {
            ResourceId::Program(p) => p.0,
            ResourceId::Mesh(m) => m.0,
            ResourceId::Texture(t) => t.0,
        }
    }

    #[test]
    fn shader_failure_aborts_with_nothing_created() {
        let device = RecordingDevice::new().with_shader_failure(ShaderError::Compilation {
            stage: ShaderStage::Vertex,
            diagnostic: "unknown identifier".into(),
        });
        let mut host = HeadlessHost::with_device(device, 64, 64);
        let err = Game::new(&SceneConfig::default(), &assets(), host.device(), (64, 64)).unwrap_err();
        assert!(matches!(err, SceneError::Shader(ShaderError::Compilation { .. })));
        assert!(host.recording().live_resources().is_empty());
    }

    #[test]
    fn missing_texture_releases_the_program() {
        let mut host = HeadlessHost::new(64, 64);
        let assets = SceneAssets::from_parts("vertex", "fragment", Vec::new());
        let err = Game::new(&SceneConfig::default(), &assets, host.device(), (64, 64)).unwrap_err();
        assert!(matches!(err, SceneError::MissingTexture(_)));
        assert_eq!(host.recording().destroyed().len(), 1);
        assert!(host.recording().live_resources().is_empty());
    }

    #[test]
    fn assets_load_from_disk_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shaders")).unwrap();
        std::fs::create_dir_all(dir.path().join("textures")).unwrap();
        std::fs::write(dir.path().join("shaders/scene.vert.wgsl"), "vs").unwrap();
        std::fs::write(dir.path().join("shaders/scene.frag.wgsl"), "fs").unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]))
            .save(dir.path().join(TEX))
            .unwrap();

        let loader = AssetLoader::new(dir.path());
        let assets = SceneAssets::load(&SceneConfig::default(), &loader).unwrap();
        assert_eq!(assets.images().count(), 1);
        assert_eq!(assets.vertex_source, "vs");
        assert_eq!(assets.image(TEX).unwrap().width(), 2);

        std::fs::remove_file(dir.path().join("shaders/scene.frag.wgsl")).unwrap();
        let err = SceneAssets::load(&SceneConfig::default(), &loader).unwrap_err();
        assert!(matches!(err, AssetError::ResourceLoad { .. }));
    }
}
