//! The star on top of the tree: three crossed octahedra inside a faint halo.

use glam::{Quat, Vec3};

use crate::easing::hex_color;
use crate::particle::{InstanceTransform, ParticleGeometry};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};

const POSITION: Vec3 = Vec3::new(0.0, 11.2, 0.0);
const CORE_COLOR: &str = "#FFD700";
const HALO_COLOR: &str = "#FFF8E7";
const HALO_OPACITY: f32 = 0.3;
const HALO_SCALE: f32 = 1.2;

const CORE_PARTS: [Vec3; 3] = [
    Vec3::new(0.3, 1.8, 0.3),
    Vec3::new(1.8, 0.3, 0.3),
    Vec3::new(0.5, 0.5, 0.5),
];
const HALO_PARTS: [Vec3; 3] = [
    Vec3::new(0.35, 1.9, 0.35),
    Vec3::new(1.9, 0.35, 0.35),
    Vec3::new(0.6, 0.6, 0.6),
];

#[derive(Debug)]
pub struct StarTopper {
    yaw: f32,
    pulse: f32,
}

impl Default for StarTopper {
    fn default() -> Self {
        Self::new()
    }
}

impl StarTopper {
    pub fn new() -> Self {
        Self { yaw: 0.0, pulse: 1.0 }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    fn parts(&self, parts: &[Vec3; 3], extra_scale: f32, color: [f32; 4]) -> Vec<InstanceTransform> {
        let rotation = Quat::from_rotation_y(self.yaw);
        parts
            .iter()
            .map(|part| InstanceTransform {
                position: POSITION,
                rotation,
                scale: *part * self.pulse * extra_scale,
                color,
            })
            .collect()
    }
}

impl GroupController for StarTopper {
    fn name(&self) -> &'static str {
        "star_topper"
    }

    fn count(&self) -> usize {
        1
    }

    fn update(&mut self, ctx: &FrameContext) {
        self.yaw += ctx.dt * 0.2;
        self.pulse = 1.0 + (ctx.time * 2.0).sin() * 0.05;
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        let octahedron = ParticleGeometry::Mesh { asset_id: "octahedron" };
        let mut halo_color = hex_color(HALO_COLOR);
        halo_color[3] = HALO_OPACITY;
        vec![
            GroupOutput::new(
                "star_core",
                octahedron.clone(),
                self.parts(&CORE_PARTS, 1.0, hex_color(CORE_COLOR)),
            ),
            GroupOutput::new("star_halo", octahedron, self.parts(&HALO_PARTS, HALO_SCALE, halo_color)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::test_support::context;
    use crate::scene_state::SceneState;

    #[test]
    fn test_spins_and_pulses_in_place() {
        let mut star = StarTopper::new();
        star.update(&context(SceneState::Chaos, std::f32::consts::FRAC_PI_4, 0.5));
        assert!((star.yaw() - 0.1).abs() < 1e-6);
        let out = star.outputs();
        let core = &out[0].instances;
        assert_eq!(core.len(), 3);
        assert_eq!(core[0].position, POSITION);
        // sin(pi/2) = 1: peak pulse.
        assert!((core[2].scale.x - 0.5 * 1.05).abs() < 1e-5);
        assert!((out[1].instances[0].color[3] - HALO_OPACITY).abs() < 1e-6);
    }
}
