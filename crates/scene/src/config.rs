//! Scene configuration. Every field has a default, so a YAML file only
//! needs the values it changes.

use crate::error::SceneError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub shaders: ShaderPaths,
    pub textures: TexturePaths,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub light: LightConfig,
    pub clear_color: [f32; 3],
    pub floor: FloorConfig,
    pub walls: WallConfig,
    /// Static boxes, always drawn, never collectible.
    pub props: Vec<BoxPlacement>,
    /// Collectible boxes, in render order.
    pub boxes: Vec<BoxPlacement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

/// Paths relative to the asset root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: String,
    pub fragment: String,
}

/// Texture per surface group. Groups may share a path; it is loaded once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TexturePaths {
    pub floor: String,
    pub wall: String,
    #[serde(rename = "box")]
    pub boxes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub fov_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    /// A box closer than this to the camera is collected on the collect key.
    pub collect_distance: f32,
    pub spin_degrees_per_second: f32,
    /// Upper bound on the frame time fed into movement and spin.
    pub max_frame_seconds: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub direction: Vec3,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    pub size: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub size: f32,
    /// Distance of the wall plane along -Z before rotation.
    pub depth: f32,
    /// One wall per entry, rotated about the vertical axis.
    pub rotations_degrees: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPlacement {
    pub position: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl BoxPlacement {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            scale: Vec3::ONE,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderPaths::default(),
            textures: TexturePaths::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            light: LightConfig::default(),
            clear_color: [0.1, 0.12, 0.15],
            floor: FloorConfig::default(),
            walls: WallConfig::default(),
            props: vec![BoxPlacement::at(-2.0, 0.5, -2.0), BoxPlacement::at(2.0, 0.5, -2.0)],
            boxes: vec![
                BoxPlacement::at(0.0, 0.5, 0.0),
                BoxPlacement::at(-3.0, 0.5, 1.5),
                BoxPlacement::at(3.0, 0.5, 1.5),
            ],
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Mini 3D Explorer".into(),
        }
    }
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: "shaders/scene.vert.wgsl".into(),
            fragment: "shaders/scene.frag.wgsl".into(),
        }
    }
}

impl Default for TexturePaths {
    fn default() -> Self {
        Self {
            floor: "textures/texture.png".into(),
            wall: "textures/texture.png".into(),
            boxes: "textures/texture.png".into(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 3.0),
            yaw_degrees: -90.0,
            pitch_degrees: 0.0,
            fov_degrees: 60.0,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            sensitivity: 0.1,
            collect_distance: 1.6,
            spin_degrees_per_second: 60.0,
            max_frame_seconds: 0.1,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.3, -1.0, -0.2),
            on: true,
        }
    }
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            height: 0.0,
        }
    }
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            depth: 5.0,
            rotations_degrees: vec![0.0, 90.0, 180.0, 270.0],
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SceneError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would make the scene degenerate.
    pub fn validate(&self) -> Result<(), SceneError> {
        let positive = [
            ("floor.size", self.floor.size),
            ("walls.size", self.walls.size),
            ("camera.fov_degrees", self.camera.fov_degrees),
            ("controls.collect_distance", self.controls.collect_distance),
            ("controls.max_frame_seconds", self.controls.max_frame_seconds),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(SceneError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let placements = self
            .props
            .iter()
            .enumerate()
            .map(|(i, p)| ("props", i, p))
            .chain(self.boxes.iter().enumerate().map(|(i, b)| ("boxes", i, b)));
        for (group, index, placement) in placements {
            let scale = placement.scale;
            if scale.is_nan() || scale.min_element() <= 0.0 {
                return Err(SceneError::InvalidConfig(format!(
                    "{group}[{index}].scale must be positive in every component, got {scale}"
                )));
            }
        }
        if self.camera.fov_degrees >= 180.0 {
            return Err(SceneError::InvalidConfig(format!(
                "camera.fov_degrees must be below 180, got {}",
                self.camera.fov_degrees
            )));
        }
        if self.light.direction.length_squared() == 0.0 {
            return Err(SceneError::InvalidConfig(
                "light.direction must be non-zero".into(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(SceneError::InvalidConfig(
                "window size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.camera.position, Vec3::new(0.0, 1.5, 3.0));
        assert_eq!(config.walls.rotations_degrees.len(), 4);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = SceneConfig::from_yaml_str(
            "controls:\n  collect_distance: 2.0\nboxes:\n  - position: [1.0, 0.5, 1.0]\n",
        )
        .unwrap();
        assert_eq!(config.controls.collect_distance, 2.0);
        assert_eq!(config.controls.speed, 4.0);
        assert_eq!(config.boxes.len(), 1);
        assert_eq!(config.boxes[0].scale, Vec3::ONE);
        assert_eq!(config.window.title, "Mini 3D Explorer");
    }

    #[test]
    fn box_texture_key_is_renamed() {
        let config = SceneConfig::from_yaml_str("textures:\n  box: textures/crate.png\n").unwrap();
        assert_eq!(config.textures.boxes, "textures/crate.png");
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert_eq!(SceneConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let err = SceneConfig::from_yaml_str("controls:\n  collect_distance: 0.0\n").unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));
        let err = SceneConfig::from_yaml_str("light:\n  direction: [0.0, 0.0, 0.0]\n").unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));
        let err = SceneConfig::from_yaml_str("camera: [not, a, map]\n").unwrap_err();
        assert!(matches!(err, SceneError::ConfigParse(_)));
    }

    #[test]
    fn box_scale_must_be_positive() {
        let flat = "boxes:\n  - position: [0.0, 0.5, 0.0]\n    scale: [1.0, 0.0, 1.0]\n";
        let err = SceneConfig::from_yaml_str(flat).unwrap_err();
        assert!(matches!(&err, SceneError::InvalidConfig(m) if m.contains("boxes[0].scale")));

        let mirrored = "props:\n  - position: [0.0, 0.5, 0.0]\n    scale: [-1.0, 1.0, 1.0]\n";
        let err = SceneConfig::from_yaml_str(mirrored).unwrap_err();
        assert!(matches!(&err, SceneError::InvalidConfig(m) if m.contains("props[0].scale")));

        let stretched = "boxes:\n  - position: [0.0, 0.5, 0.0]\n    scale: [4.0, 1.0, 1.0]\n";
        let config = SceneConfig::from_yaml_str(stretched).unwrap();
        assert_eq!(config.boxes[0].scale, Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::from_yaml_file(dir.path().join("scene.yaml")).unwrap_err();
        assert!(matches!(err, SceneError::ConfigRead { .. }));
    }

    #[test]
    fn shipped_scene_matches_defaults() {
        let text = include_str!("../../../assets/scene.yaml");
        assert_eq!(SceneConfig::from_yaml_str(text).unwrap(), SceneConfig::default());
    }
}
