use crate::config::{BoxPlacement, SceneConfig};
use explorer_common::Transform;
use glam::{Quat, Vec3};

/// A box in the scene. Once collected it stays collected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBox {
    pub position: Vec3,
    pub scale: Vec3,
    collected: bool,
}

impl PlacedBox {
    pub fn new(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Returns true only on the transition to collected.
    pub fn collect(&mut self) -> bool {
        !std::mem::replace(&mut self.collected, true)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position_scale(self.position, self.scale)
    }
}

impl From<BoxPlacement> for PlacedBox {
    fn from(p: BoxPlacement) -> Self {
        Self::new(p.position, p.scale)
    }
}

/// The single directional light of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    direction: Vec3,
    pub on: bool,
}

impl Light {
    /// `direction` is normalized; a zero vector falls back to straight down.
    pub fn new(direction: Vec3, on: bool) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            on,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn toggle(&mut self) {
        self.on = !self.on;
    }

    /// Value uploaded to the light-switch uniform.
    pub fn uniform_value(&self) -> i32 {
        i32::from(self.on)
    }
}

/// Everything placed in the world, in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub walls: Vec<Transform>,
    pub props: Vec<PlacedBox>,
    pub boxes: Vec<PlacedBox>,
    pub light: Light,
    /// Cosmetic rotation of uncollected boxes, in degrees.
    pub spin: f32,
}

impl Scene {
    pub fn from_config(config: &SceneConfig) -> Self {
        let walls = config
            .walls
            .rotations_degrees
            .iter()
            .map(|deg| Transform {
                rotation: Quat::from_rotation_y(deg.to_radians()),
                ..Transform::default()
            })
            .collect();
        Self {
            walls,
            props: config.props.iter().copied().map(PlacedBox::from).collect(),
            boxes: config.boxes.iter().copied().map(PlacedBox::from).collect(),
            light: Light::new(config.light.direction, config.light.on),
            spin: 0.0,
        }
    }

    /// Collect every uncollected box strictly closer than `threshold` to
    /// `point`. All qualifying boxes are collected at once, not only the
    /// nearest. Returns how many were newly collected.
    pub fn collect_within(&mut self, point: Vec3, threshold: f32) -> usize {
        self.boxes
            .iter_mut()
            .filter(|b| !b.is_collected() && b.position.distance(point) < threshold)
            .map(|b| b.collect())
            .filter(|&newly| newly)
            .count()
    }

    pub fn remaining(&self) -> usize {
        self.boxes.iter().filter(|b| !b.is_collected()).count()
    }

    /// Boxes still drawn, with the current spin applied.
    pub fn visible_boxes(&self) -> impl Iterator<Item = Transform> + '_ {
        let spin = self.spin.to_radians();
        self.boxes
            .iter()
            .filter(|b| !b.is_collected())
            .map(move |b| b.transform().with_yaw(spin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_boxes(positions: &[Vec3]) -> Scene {
        let config = SceneConfig {
            boxes: positions
                .iter()
                .map(|p| BoxPlacement::at(p.x, p.y, p.z))
                .collect(),
            ..SceneConfig::default()
        };
        Scene::from_config(&config)
    }

    #[test]
    fn collect_is_one_way() {
        let mut b = PlacedBox::new(Vec3::ZERO, Vec3::ONE);
        assert!(b.collect());
        assert!(!b.collect());
        assert!(b.is_collected());
    }

    #[test]
    fn collects_all_boxes_in_range() {
        let mut scene = scene_with_boxes(&[
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(5.0, 0.5, 0.0),
        ]);
        let n = scene.collect_within(Vec3::new(0.0, 1.0, 0.5), 2.0);
        assert_eq!(n, 2);
        assert!(scene.boxes[0].is_collected());
        assert!(scene.boxes[1].is_collected());
        assert!(!scene.boxes[2].is_collected());
        assert_eq!(scene.remaining(), 1);
    }

    #[test]
    fn threshold_is_strict() {
        let mut scene = scene_with_boxes(&[Vec3::new(2.0, 0.0, 0.0)]);
        assert_eq!(scene.collect_within(Vec3::ZERO, 2.0), 0);
        assert_eq!(scene.collect_within(Vec3::ZERO, 2.0001), 1);
    }

    #[test]
    fn repeated_collection_is_idempotent() {
        let mut scene = scene_with_boxes(&[Vec3::ZERO]);
        assert_eq!(scene.collect_within(Vec3::ZERO, 1.0), 1);
        assert_eq!(scene.collect_within(Vec3::ZERO, 1.0), 0);
        assert!(scene.boxes[0].is_collected());
    }

    #[test]
    fn light_direction_is_normalized() {
        let light = Light::new(Vec3::new(-0.3, -1.0, -0.2), true);
        assert!((light.direction().length() - 1.0).abs() < 1e-6);
        assert_eq!(Light::new(Vec3::ZERO, true).direction(), Vec3::NEG_Y);
    }

    #[test]
    fn light_toggle_twice_restores_value() {
        let mut light = Light::new(Vec3::NEG_Y, true);
        assert_eq!(light.uniform_value(), 1);
        light.toggle();
        assert_eq!(light.uniform_value(), 0);
        light.toggle();
        assert_eq!(light.uniform_value(), 1);
    }

    #[test]
    fn default_scene_layout() {
        let scene = Scene::from_config(&SceneConfig::default());
        assert_eq!(scene.walls.len(), 4);
        assert_eq!(scene.props.len(), 2);
        assert_eq!(scene.boxes.len(), 3);
        assert_eq!(scene.visible_boxes().count(), 3);
    }

    #[test]
    fn visible_boxes_skip_collected_and_apply_spin() {
        let mut scene = scene_with_boxes(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(9.0, 0.0, 0.0)]);
        scene.boxes[0].collect();
        scene.spin = 90.0;
        let visible: Vec<_> = scene.visible_boxes().collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].position, Vec3::new(9.0, 0.0, 0.0));
        let rotated = visible[0].rotation * Vec3::X;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }
}
