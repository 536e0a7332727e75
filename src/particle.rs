//! Particle group types and core data structures.
//!
//! A group owns its two generated arrangements and a single progress scalar.
//! Motion is purely kinematic: each frame the progress eases toward the value
//! implied by the scene state and every instance is placed by blending its
//! CHAOS and FORMED points. No physics simulation happens here.

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::easing::{approach, smoothstep};
use crate::generators::GeneratedPositions;
use crate::scene_state::SceneState;

/// Progress value a group converges to in the given state.
///
/// Progress is the FORMED weight for every group: 0 = CHAOS, 1 = FORMED.
#[inline]
pub fn target_progress(state: SceneState) -> f32 {
    match state {
        SceneState::Chaos => 0.0,
        SceneState::Formed => 1.0,
    }
}

/// Geometry used to draw a group's instances.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParticleGeometry {
    /// Screen-space point sprite. Instance `scale.x` multiplies `size`.
    Point { size: f32 },
    /// Instanced mesh asset.
    Mesh {
        /// Asset ID the renderer resolves to shared geometry.
        asset_id: &'static str,
    },
}

/// Final per-instance transform handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// RGBA; alpha carries per-instance opacity.
    pub color: [f32; 4],
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Shared state of one particle group: generated arrangements plus progress.
#[derive(Clone, Debug)]
pub struct ParticleGroup {
    positions: GeneratedPositions,
    progress: f32,
    /// Convergence speed of `progress`, per second.
    easing_rate: f32,
}

impl ParticleGroup {
    /// Create a group already settled in `initial` so nothing animates on the first frame.
    pub fn new(positions: GeneratedPositions, easing_rate: f32, initial: SceneState) -> Self {
        debug_assert_eq!(positions.formed.len(), positions.chaos.len());
        Self {
            positions,
            progress: target_progress(initial),
            easing_rate,
        }
    }

    pub fn count(&self) -> usize {
        self.positions.formed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.formed.is_empty()
    }

    pub fn formed(&self) -> &[Vec3] {
        &self.positions.formed
    }

    pub fn chaos(&self) -> &[Vec3] {
        &self.positions.chaos
    }

    /// Raw linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn easing_rate(&self) -> f32 {
        self.easing_rate
    }

    /// Smoothstep-eased progress used for blending.
    pub fn ease(&self) -> f32 {
        smoothstep(self.progress)
    }

    /// Step progress toward the state target. Returns the new eased progress.
    pub fn advance(&mut self, state: SceneState, dt: f32) -> f32 {
        if !self.is_empty() {
            let next = approach(self.progress, target_progress(state), self.easing_rate, dt);
            self.progress = next.clamp(0.0, 1.0);
        }
        self.ease()
    }

    /// Whether progress is within `epsilon` of the target for `state`.
    pub fn is_settled(&self, state: SceneState, epsilon: f32) -> bool {
        (self.progress - target_progress(state)).abs() <= epsilon
    }

    /// Blended position of instance `index`, with the CHAOS anchor displaced by `chaos_offset`.
    #[inline]
    pub fn rest_position(&self, index: usize, chaos_offset: Vec3) -> Vec3 {
        let chaos = self.positions.chaos[index] + chaos_offset;
        chaos.lerp(self.positions.formed[index], self.ease())
    }

    /// Blended positions without any secondary motion.
    pub fn rest_positions(&self) -> Vec<Vec3> {
        (0..self.count())
            .map(|i| self.rest_position(i, Vec3::ZERO))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{scene_rng, spiral_band, SpiralCone};

    fn band(count: usize) -> ParticleGroup {
        let mut rng = scene_rng(Some(42));
        ParticleGroup::new(
            spiral_band(count, &SpiralCone::default(), &mut rng),
            1.5,
            SceneState::Chaos,
        )
    }

    #[test]
    fn test_group_starts_settled_in_initial_state() {
        let group = band(10);
        assert_eq!(group.progress(), 0.0);
        for (rest, chaos) in group.rest_positions().iter().zip(group.chaos()) {
            assert!(rest.distance(*chaos) < 1e-5);
        }
    }

    #[test]
    fn test_progress_converges_monotonically() {
        let mut group = band(10);
        let mut last = group.progress();
        for _ in 0..600 {
            group.advance(SceneState::Formed, 1.0 / 60.0);
            assert!(group.progress() >= last, "progress must not move backwards");
            assert!(group.progress() <= 1.0);
            last = group.progress();
        }
        assert!(group.is_settled(SceneState::Formed, 1e-3));

        for _ in 0..600 {
            group.advance(SceneState::Chaos, 1.0 / 60.0);
            assert!(group.progress() <= last);
            assert!(group.progress() >= 0.0);
            last = group.progress();
        }
        assert!(group.is_settled(SceneState::Chaos, 1e-3));
    }

    #[test]
    fn test_rest_positions_idempotent_once_settled() {
        let mut group = band(50);
        for _ in 0..2000 {
            group.advance(SceneState::Formed, 1.0 / 60.0);
        }
        let before = group.rest_positions();
        for _ in 0..10 {
            group.advance(SceneState::Formed, 1.0 / 60.0);
        }
        let after = group.rest_positions();
        for (a, b) in before.iter().zip(&after) {
            assert!(a.distance(*b) < 1e-4);
        }
    }

    #[test]
    fn test_empty_group_is_noop() {
        let mut group = ParticleGroup::new(GeneratedPositions::default(), 2.0, SceneState::Chaos);
        group.advance(SceneState::Formed, 1.0);
        assert_eq!(group.count(), 0);
        assert_eq!(group.progress(), 0.0);
        assert!(group.rest_positions().is_empty());
    }

    #[test]
    fn test_large_delta_saturates() {
        let mut group = band(3);
        group.advance(SceneState::Formed, 100.0);
        assert_eq!(group.progress(), 1.0);
        for (rest, formed) in group.rest_positions().iter().zip(group.formed()) {
            assert!(rest.distance(*formed) < 1e-4);
        }
    }
}
