//! Backdrop layers: a slowly turning star field and drifting golden dust.
//!
//! Neither layer has a FORMED/CHAOS arrangement. The star field dims while
//! the tree is formed; the dust ignores the scene state entirely.

use glam::{Quat, Vec3};
use rand::Rng;

use crate::easing::approach;
use crate::generators::shell_field;
use crate::particle::{InstanceTransform, ParticleGeometry};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::scene_state::SceneState;

const STAR_INNER: f32 = 60.0;
const STAR_OUTER: f32 = 120.0;
const STAR_POINT_SIZE: f32 = 1.0;
const STAR_YAW_SPEED: f32 = 0.02;

const DUST_INNER: f32 = 25.0;
const DUST_OUTER: f32 = 35.0;
const DUST_POINT_SIZE: f32 = 0.1;
const DUST_COLOR: [f32; 3] = [1.0, 0.84, 0.0];

/// Group opacity the star field settles at in each state.
pub fn star_opacity_target(state: SceneState) -> f32 {
    match state {
        SceneState::Formed => 0.3,
        SceneState::Chaos => 1.0,
    }
}

pub struct StarField {
    positions: Vec<Vec3>,
    phases: Vec<f32>,
    /// Random size factor per star.
    sizes: Vec<f32>,
    opacity: f32,
    opacity_rate: f32,
    yaw: f32,
    instances: Vec<InstanceTransform>,
}

impl StarField {
    pub fn new(count: usize, opacity_rate: f32, initial: SceneState, rng: &mut impl Rng) -> Self {
        let (positions, phases) = shell_field(count, STAR_INNER, STAR_OUTER, rng);
        let sizes = (0..count).map(|_| rng.random()).collect();
        let mut stars = Self {
            positions,
            phases,
            sizes,
            opacity: star_opacity_target(initial),
            opacity_rate,
            yaw: 0.0,
            instances: Vec::with_capacity(count),
        };
        stars.place(0.0);
        stars
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    fn place(&mut self, time: f32) {
        let rotation = Quat::from_rotation_y(self.yaw);
        self.instances.clear();
        for ((p, phase), size) in self.positions.iter().zip(&self.phases).zip(&self.sizes) {
            let twinkle = 0.5 + 0.5 * (time * 2.0 + phase * 100.0).sin();
            self.instances.push(InstanceTransform {
                position: rotation * *p,
                scale: Vec3::splat(1.0 + 2.0 * size),
                color: [1.0, 1.0, 1.0, twinkle],
                ..Default::default()
            });
        }
    }
}

impl GroupController for StarField {
    fn name(&self) -> &'static str {
        "stars"
    }

    fn count(&self) -> usize {
        self.positions.len()
    }

    fn update(&mut self, ctx: &FrameContext) {
        if self.positions.is_empty() {
            return;
        }
        self.opacity = approach(self.opacity, star_opacity_target(ctx.state), self.opacity_rate, ctx.dt);
        self.yaw += STAR_YAW_SPEED * ctx.dt;
        self.place(ctx.time);
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        vec![GroupOutput::new(
            self.name(),
            ParticleGeometry::Point { size: STAR_POINT_SIZE },
            self.instances.clone(),
        )
        .with_opacity(self.opacity)]
    }
}

pub struct Dust {
    positions: Vec<Vec3>,
    /// Float speed in [0.1, 0.3).
    speeds: Vec<f32>,
    instances: Vec<InstanceTransform>,
}

impl Dust {
    pub fn new(count: usize, rng: &mut impl Rng) -> Self {
        let (positions, phases) = shell_field(count, DUST_INNER, DUST_OUTER, rng);
        let speeds = phases.iter().map(|u| 0.1 + u * 0.2).collect();
        let mut dust = Self {
            positions,
            speeds,
            instances: Vec::with_capacity(count),
        };
        dust.place(0.0);
        dust
    }

    fn place(&mut self, time: f32) {
        self.instances.clear();
        for (p, speed) in self.positions.iter().zip(&self.speeds) {
            let mut position = *p;
            position.y += (time * speed + p.x).sin() * 0.5;
            let alpha = (0.5 + 0.5 * (time * 3.0 + p.x * 10.0).sin()) * 0.4;
            self.instances.push(InstanceTransform {
                position,
                scale: Vec3::splat(3.0 * speed + 2.0),
                color: [DUST_COLOR[0], DUST_COLOR[1], DUST_COLOR[2], alpha],
                ..Default::default()
            });
        }
    }
}

impl GroupController for Dust {
    fn name(&self) -> &'static str {
        "dust"
    }

    fn count(&self) -> usize {
        self.positions.len()
    }

    fn update(&mut self, ctx: &FrameContext) {
        if !self.positions.is_empty() {
            self.place(ctx.time);
        }
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        vec![GroupOutput::new(
            self.name(),
            ParticleGeometry::Point { size: DUST_POINT_SIZE },
            self.instances.clone(),
        )]
    }
}
