//! Instanced ornaments hung along the spiral: balls, lights, snowflakes and
//! gingerbread figures.
//!
//! The variant is picked once at construction. It fixes the generator, the
//! look, the easing weight and whether instances keep floating once formed.

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::Serialize;

use crate::config::GroupCounts;
use crate::easing::{approach, hex_color};
use crate::generators::{snowflakes, spiral_band, GeneratedPositions, SpiralCone};
use crate::particle::{InstanceTransform, ParticleGeometry, ParticleGroup};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::scene_state::SceneState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrnamentKind {
    GoldBall,
    RedBall,
    Light,
    Snowflake,
    Gingerbread,
}

/// How formed instances behave once they have arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormedMotion {
    /// Tilt eases back to upright.
    Settle,
    /// Keep spinning and bobbing in place.
    Float,
}

impl OrnamentKind {
    pub const ALL: [OrnamentKind; 5] = [
        OrnamentKind::GoldBall,
        OrnamentKind::RedBall,
        OrnamentKind::Light,
        OrnamentKind::Snowflake,
        OrnamentKind::Gingerbread,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OrnamentKind::GoldBall => "gold_balls",
            OrnamentKind::RedBall => "red_balls",
            OrnamentKind::Light => "lights",
            OrnamentKind::Snowflake => "snowflakes",
            OrnamentKind::Gingerbread => "gingerbread",
        }
    }

    pub fn count(self, counts: &GroupCounts) -> usize {
        match self {
            OrnamentKind::GoldBall => counts.gold_balls,
            OrnamentKind::RedBall => counts.red_balls,
            OrnamentKind::Light => counts.lights,
            OrnamentKind::Snowflake => counts.snowflakes,
            OrnamentKind::Gingerbread => counts.gingerbread,
        }
    }

    fn color(self) -> &'static str {
        match self {
            OrnamentKind::GoldBall => "#E6C200",
            OrnamentKind::RedBall => "#C41E3A",
            OrnamentKind::Light => "#FDFBD3",
            OrnamentKind::Snowflake => "#FFFFFF",
            OrnamentKind::Gingerbread => "#8B4513",
        }
    }

    fn scale(self) -> f32 {
        match self {
            OrnamentKind::GoldBall => 0.35,
            OrnamentKind::RedBall => 0.4,
            OrnamentKind::Light => 0.08,
            OrnamentKind::Snowflake => 0.4,
            OrnamentKind::Gingerbread => 0.3,
        }
    }

    /// Heavier ornaments converge more slowly.
    pub fn weight(self) -> f32 {
        match self {
            OrnamentKind::GoldBall => 1.2,
            OrnamentKind::RedBall => 1.1,
            OrnamentKind::Light => 0.5,
            OrnamentKind::Snowflake => 0.6,
            OrnamentKind::Gingerbread => 1.5,
        }
    }

    fn asset_id(self) -> &'static str {
        match self {
            OrnamentKind::GoldBall | OrnamentKind::RedBall | OrnamentKind::Light => "sphere",
            OrnamentKind::Snowflake => "snowflake",
            OrnamentKind::Gingerbread => "gingerbread",
        }
    }

    fn formed_motion(self) -> FormedMotion {
        match self {
            OrnamentKind::Snowflake => FormedMotion::Float,
            _ => FormedMotion::Settle,
        }
    }

    fn generate(self, count: usize, rng: &mut impl Rng) -> GeneratedPositions {
        let cone = SpiralCone::default();
        match self {
            OrnamentKind::Snowflake => snowflakes(count, &cone, rng),
            _ => spiral_band(count, &cone, rng),
        }
    }
}

pub struct Ornaments {
    kind: OrnamentKind,
    motion: FormedMotion,
    color: [f32; 4],
    scale: f32,
    group: ParticleGroup,
    /// Euler XYZ angles carried across frames.
    rotations: Vec<Vec3>,
    instances: Vec<InstanceTransform>,
}

/// CHAOS drift added to each anchor; vanishes as the group forms.
fn chaos_drift(time: f32, index: usize) -> Vec3 {
    let a = time * 0.2 + index as f32 * 0.1;
    Vec3::new(a.sin() * 2.0, (a * 0.8).cos() * 1.5, (a * 1.2).sin() * 2.0)
}

impl Ornaments {
    pub fn new(kind: OrnamentKind, count: usize, initial: SceneState, rng: &mut impl Rng) -> Self {
        let positions = kind.generate(count, rng);
        let rotations = (0..count)
            .map(|_| Vec3::new(rng.random::<f32>() * PI, rng.random::<f32>() * PI, 0.0))
            .collect();
        let mut ornaments = Self {
            kind,
            motion: kind.formed_motion(),
            color: hex_color(kind.color()),
            scale: kind.scale(),
            group: ParticleGroup::new(positions, 2.0 / kind.weight(), initial),
            rotations,
            instances: Vec::with_capacity(count),
        };
        ornaments.place(0.0);
        ornaments
    }

    pub fn kind(&self) -> OrnamentKind {
        self.kind
    }

    fn rotate(&mut self, state: SceneState, dt: f32) {
        let rate = self.group.easing_rate();
        for r in &mut self.rotations {
            match (state, self.motion) {
                (SceneState::Chaos, _) => *r += Vec3::new(0.5, 0.3, 0.1) * dt,
                (SceneState::Formed, FormedMotion::Settle) => {
                    r.x = approach(r.x, 0.0, rate, dt);
                    r.z = approach(r.z, 0.0, rate, dt);
                }
                (SceneState::Formed, FormedMotion::Float) => {
                    r.z += 0.2 * dt;
                    r.x += 0.1 * dt;
                }
            }
        }
    }

    fn place(&mut self, time: f32) {
        let ease = self.group.ease();
        let floats = self.motion == FormedMotion::Float;
        self.instances.clear();
        for (i, r) in self.rotations.iter().enumerate() {
            let mut position = self.group.rest_position(i, chaos_drift(time, i));
            if floats {
                position.y += (time * 0.5 + i as f32).sin() * 0.5 * ease;
            }
            self.instances.push(InstanceTransform {
                position,
                rotation: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
                scale: Vec3::splat(self.scale),
                color: self.color,
            });
        }
    }
}

impl GroupController for Ornaments {
    fn name(&self) -> &'static str {
        self.kind.name()
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
        self.rotate(ctx.state, ctx.dt);
        self.place(ctx.time);
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        vec![GroupOutput::new(
            self.name(),
            ParticleGeometry::Mesh {
                asset_id: self.kind.asset_id(),
            },
            self.instances.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::scene_rng;
    use crate::groups::test_support::{context, max_distance};

    fn positions(o: &Ornaments) -> Vec<Vec3> {
        o.instances.iter().map(|t| t.position).collect()
    }

    #[test]
    fn test_rates_follow_weight() {
        let mut rng = scene_rng(Some(1));
        let gold = Ornaments::new(OrnamentKind::GoldBall, 4, SceneState::Chaos, &mut rng);
        let lights = Ornaments::new(OrnamentKind::Light, 4, SceneState::Chaos, &mut rng);
        assert!((gold.group.easing_rate() - 2.0 / 1.2).abs() < 1e-6);
        // Lighter ornaments arrive first.
        assert!(lights.group.easing_rate() > gold.group.easing_rate());
    }

    #[test]
    fn test_formed_balls_are_idempotent_and_upright() {
        let mut rng = scene_rng(Some(2));
        let mut o = Ornaments::new(OrnamentKind::RedBall, 100, SceneState::Chaos, &mut rng);
        let mut t = 0.0;
        for _ in 0..1200 {
            t += 1.0 / 60.0;
            o.update(&context(SceneState::Formed, t, 1.0 / 60.0));
        }
        let a = positions(&o);
        for _ in 0..10 {
            t += 1.0 / 60.0;
            o.update(&context(SceneState::Formed, t, 1.0 / 60.0));
        }
        assert!(max_distance(&a, &positions(&o)) < 1e-3);
        for r in &o.rotations {
            assert!(r.x.abs() < 1e-3 && r.z.abs() < 1e-3);
        }
    }

    #[test]
    fn test_snowflakes_keep_floating_when_formed() {
        let mut rng = scene_rng(Some(3));
        let mut o = Ornaments::new(OrnamentKind::Snowflake, 20, SceneState::Formed, &mut rng);
        o.update(&context(SceneState::Formed, 0.0, 1.0 / 60.0));
        let a = positions(&o);
        o.update(&context(SceneState::Formed, 1.5, 1.0 / 60.0));
        assert!(max_distance(&a, &positions(&o)) > 1e-3);
        assert!(max_distance(&positions(&o), o.group.formed()) <= 0.5 + 1e-4);
    }

    #[test]
    fn test_chaos_tumbles() {
        let mut rng = scene_rng(Some(4));
        let mut o = Ornaments::new(OrnamentKind::Gingerbread, 3, SceneState::Chaos, &mut rng);
        let before = o.rotations.clone();
        o.update(&context(SceneState::Chaos, 0.5, 0.5));
        for (a, b) in before.iter().zip(&o.rotations) {
            assert!((b.x - a.x - 0.25).abs() < 1e-5);
            assert!((b.y - a.y - 0.15).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_group_is_noop() {
        let mut rng = scene_rng(Some(5));
        let mut o = Ornaments::new(OrnamentKind::Light, 0, SceneState::Chaos, &mut rng);
        o.update(&context(SceneState::Formed, 1.0, 1.0));
        assert_eq!(o.count(), 0);
        assert!(o.outputs()[0].instances.is_empty());
    }
}
