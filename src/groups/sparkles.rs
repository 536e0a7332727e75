//! Inner sparkles filling the cone volume.

use glam::Vec3;
use rand::Rng;

use crate::generators::{cone_volume, SparkleCone};
use crate::particle::{InstanceTransform, ParticleGeometry, ParticleGroup};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::scene_state::SceneState;

const COLOR: [f32; 4] = [0.2, 1.0, 0.4, 0.8];
const POINT_SIZE: f32 = 2.0;

pub struct Sparkles {
    group: ParticleGroup,
    /// Random size factor in [0, 1) per instance.
    sizes: Vec<f32>,
    instances: Vec<InstanceTransform>,
}

impl Sparkles {
    pub fn new(count: usize, easing_rate: f32, initial: SceneState, rng: &mut impl Rng) -> Self {
        let (positions, sizes) = cone_volume(count, &SparkleCone::default(), rng);
        let mut sparkles = Self {
            group: ParticleGroup::new(positions, easing_rate, initial),
            sizes,
            instances: Vec::with_capacity(count),
        };
        sparkles.place(0.0);
        sparkles
    }

    fn place(&mut self, time: f32) {
        self.instances.clear();
        for (i, size) in self.sizes.iter().enumerate() {
            let mut position = self.group.rest_position(i, Vec3::ZERO);
            // Gentle float, in both states.
            position.y += (time + position.x).sin() * 0.2;
            self.instances.push(InstanceTransform {
                position,
                scale: Vec3::splat(1.0 + 2.0 * size),
                color: COLOR,
                ..Default::default()
            });
        }
    }
}

impl GroupController for Sparkles {
    fn name(&self) -> &'static str {
        "sparkles"
    }

    fn count(&self) -> usize {
        self.group.count()
    }

    fn progress(&self) -> f32 {
        self.group.progress()
    }

    fn update(&mut self, ctx: &FrameContext) {
        if self.group.is_empty() {
            return;
        }
        self.group.advance(ctx.state, ctx.dt);
        self.place(ctx.time);
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        vec![GroupOutput::new(
            self.name(),
            ParticleGeometry::Point { size: POINT_SIZE },
            self.instances.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::scene_rng;
    use crate::groups::test_support::context;

    #[test]
    fn test_float_stays_within_amplitude() {
        let mut rng = scene_rng(Some(9));
        let mut s = Sparkles::new(200, 1.5, SceneState::Formed, &mut rng);
        for step in 0..30 {
            s.update(&context(SceneState::Formed, step as f32 * 0.1, 0.1));
            for (t, formed) in s.instances.iter().zip(s.group.formed()) {
                assert!((t.position.x - formed.x).abs() < 1e-4);
                assert!((t.position.y - formed.y).abs() <= 0.2 + 1e-4);
            }
        }
    }

    #[test]
    fn test_sizes_scale_points() {
        let mut rng = scene_rng(Some(10));
        let s = Sparkles::new(50, 1.5, SceneState::Chaos, &mut rng);
        let points = s.outputs()[0].to_point_instances();
        assert!(points.iter().all(|p| p.size >= POINT_SIZE && p.size < POINT_SIZE * 3.0));
    }
}
