//! Tree body: a dense point cloud along the spiral cone.

use glam::Vec3;
use rand::Rng;

use crate::easing::hex_color;
use crate::generators::{foliage, SpiralCone};
use crate::particle::{InstanceTransform, ParticleGeometry, ParticleGroup};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::scene_state::SceneState;

const BASE_COLOR: &str = "#0D5C3B";
const TIP_COLOR: &str = "#4ADE80";
const DEEP_TINT: [f32; 3] = [0.0, 0.2, 0.1];
/// Share of points drawn in the darker variant.
const DEEP_SHARE: f32 = 0.1;
const POINT_SIZE: f32 = 3.0;

/// Breathing stops once progress passes this.
const BREATHING_CUTOFF: f32 = 0.9;

pub struct Foliage {
    group: ParticleGroup,
    colors: Vec<[f32; 4]>,
    instances: Vec<InstanceTransform>,
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        1.0,
    ]
}

/// Height gradient from base to tip; deep variants ignore height.
fn foliage_color(y: f32, deep: bool) -> [f32; 4] {
    let base = hex_color(BASE_COLOR);
    if deep {
        return mix(base, [DEEP_TINT[0], DEEP_TINT[1], DEEP_TINT[2], 1.0], 0.7);
    }
    mix(base, hex_color(TIP_COLOR), ((y + 6.0) / 14.0).clamp(0.0, 1.0))
}

impl Foliage {
    pub fn new(count: usize, easing_rate: f32, initial: SceneState, rng: &mut impl Rng) -> Self {
        let positions = foliage(count, &SpiralCone::default(), rng);
        let colors = positions
            .formed
            .iter()
            .map(|p| foliage_color(p.y, rng.random::<f32>() < DEEP_SHARE))
            .collect();
        let group = ParticleGroup::new(positions, easing_rate, initial);
        let mut foliage = Self {
            group,
            colors,
            instances: Vec::with_capacity(count),
        };
        foliage.place(0.0);
        foliage
    }

    fn place(&mut self, time: f32) {
        let ease = self.group.ease();
        let scatter = 1.0 - ease;
        let breathing = self.group.progress() < BREATHING_CUTOFF;
        self.instances.clear();
        for (i, color) in self.colors.iter().enumerate() {
            let mut p = self.group.rest_position(i, Vec3::ZERO);
            p.x += (time * 1.5 + p.y * 0.5).sin() * 0.05 * scatter;
            if breathing {
                p.y += (time + p.x).sin() * 0.1 * scatter;
                p.x += (time * 0.8 + p.z).cos() * 0.1 * scatter;
            }
            self.instances.push(InstanceTransform {
                position: p,
                color: *color,
                ..Default::default()
            });
        }
    }
}

impl GroupController for Foliage {
    fn name(&self) -> &'static str {
        "foliage"
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
