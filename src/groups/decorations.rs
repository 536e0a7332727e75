//! Photo decorations spiralling around the tree, with the magnet
//! interaction that pulls a photo toward the camera when the hand cursor
//! points at it.
//!
//! The spiral is regenerated whenever the number of photos changes. With no
//! photos at all a fixed number of placeholders keeps the spiral populated.

use glam::{EulerRot, Mat3, Quat, Vec2, Vec3};
use rand::Rng;

use crate::config::MagnetConfig;
use crate::easing::{approach, approach_quat, approach_vec3};
use crate::generators::photo_spiral;
use crate::particle::{InstanceTransform, ParticleGeometry, ParticleGroup};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::persistence::PhotoRef;
use crate::router::HandCursor;
use crate::scene_state::SceneState;

/// Whether a projected point lies strictly inside the gate around the cursor.
pub fn within_gate(projected: Vec3, cursor: HandCursor, gate_radius: f32) -> bool {
    Vec2::new(projected.x - cursor.x, projected.y - cursor.y).length() < gate_radius
}

/// Rotation turning local +Z toward `target`, keeping +Y up where possible.
fn face_toward(from: Vec3, target: Vec3) -> Option<Quat> {
    let forward = (target - from).try_normalize()?;
    let right = Vec3::Y.cross(forward).try_normalize()?;
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)))
}

/// Orientation facing away from the trunk at the height of `formed`.
fn outward(formed: Vec3) -> Quat {
    face_toward(formed, Vec3::new(formed.x * 2.0, formed.y, formed.z * 2.0)).unwrap_or(Quat::IDENTITY)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DecorationPose {
    /// Pull away from the rest position, toward the camera.
    offset: Vec3,
    rotation: Quat,
    scale: f32,
}

pub struct Decorations {
    magnet: MagnetConfig,
    easing_rate: f32,
    placeholders: usize,
    photos: Vec<PhotoRef>,
    group: ParticleGroup,
    poses: Vec<DecorationPose>,
    captured: Vec<bool>,
    hovered: Option<usize>,
    instances: Vec<InstanceTransform>,
}

impl Decorations {
    pub fn new(
        photos: Vec<PhotoRef>,
        placeholders: usize,
        easing_rate: f32,
        magnet: MagnetConfig,
        initial: SceneState,
        rng: &mut impl Rng,
    ) -> Self {
        let mut decorations = Self {
            magnet,
            easing_rate,
            placeholders,
            photos: Vec::new(),
            group: ParticleGroup::new(Default::default(), easing_rate, initial),
            poses: Vec::new(),
            captured: Vec::new(),
            hovered: None,
            instances: Vec::new(),
        };
        decorations.regenerate(photos, initial, rng);
        decorations
    }

    fn slot_count(photo_count: usize, placeholders: usize) -> usize {
        if photo_count == 0 {
            placeholders
        } else {
            photo_count
        }
    }

    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    /// Replace the photo list. The spiral is rebuilt only when the number of
    /// slots changes; otherwise the new references reuse the old slots.
    pub fn set_photos(&mut self, photos: Vec<PhotoRef>, state: SceneState, rng: &mut impl Rng) {
        if Self::slot_count(photos.len(), self.placeholders) == self.group.count() {
            self.photos = photos;
            return;
        }
        self.regenerate(photos, state, rng);
    }

    fn regenerate(&mut self, photos: Vec<PhotoRef>, state: SceneState, rng: &mut impl Rng) {
        let count = Self::slot_count(photos.len(), self.placeholders);
        if photos.is_empty() {
            log::info!("No photos, showing {} placeholders", count);
        }
        self.group = ParticleGroup::new(photo_spiral(count, rng), self.easing_rate, state);
        let scale = match state {
            SceneState::Formed => self.magnet.idle_scale,
            SceneState::Chaos => self.magnet.scattered_scale,
        };
        self.poses = self
            .group
            .formed()
            .iter()
            .map(|f| DecorationPose {
                offset: Vec3::ZERO,
                rotation: outward(*f),
                scale,
            })
            .collect();
        self.captured = vec![false; count];
        self.hovered = None;
        self.photos = photos;
        self.place();
    }

    /// Mark the decoration under the mouse pointer, if any.
    pub fn set_hovered(&mut self, index: Option<usize>) {
        self.hovered = index.filter(|&i| i < self.group.count());
    }

    /// Indices currently inside the magnet gate.
    pub fn captured(&self) -> impl Iterator<Item = usize> + '_ {
        self.captured.iter().enumerate().filter(|(_, c)| **c).map(|(i, _)| i)
    }

    fn update_formed(&mut self, ctx: &FrameContext) {
        let m = &self.magnet;
        let dt = ctx.dt;
        for (i, pose) in self.poses.iter_mut().enumerate() {
            let formed = self.group.formed()[i];
            let rest = self.group.rest_position(i, Vec3::ZERO);
            let captured = ctx.cursor.active && within_gate(ctx.camera.project(formed), ctx.cursor, m.gate_radius);
            self.captured[i] = captured;

            let target_offset = if captured {
                pose.scale = approach(pose.scale, m.captured_scale, m.scale_rate, dt);
                (ctx.camera.position - rest).normalize_or_zero() * m.pull_distance
            } else {
                let idle = if self.hovered == Some(i) { m.hovered_scale } else { m.idle_scale };
                pose.scale = approach(pose.scale, idle, m.scale_rate, dt);
                pose.rotation = approach_quat(pose.rotation, outward(formed), m.turn_rate, dt);
                Vec3::ZERO
            };
            pose.offset = approach_vec3(pose.offset, target_offset, m.pull_rate, dt);
            if captured {
                if let Some(look) = face_toward(rest + pose.offset, ctx.camera.position) {
                    pose.rotation = look;
                }
            }
        }
    }

    fn update_chaos(&mut self, dt: f32) {
        let m = &self.magnet;
        let spin = Quat::from_euler(EulerRot::XYZ, 0.2 * dt, 0.1 * dt, 0.0);
        for pose in &mut self.poses {
            pose.offset = approach_vec3(pose.offset, Vec3::ZERO, m.pull_rate, dt);
            pose.scale = approach(pose.scale, m.scattered_scale, self.easing_rate, dt);
            pose.rotation = (pose.rotation * spin).normalize();
        }
        self.captured.iter_mut().for_each(|c| *c = false);
    }

    fn place(&mut self) {
        self.instances.clear();
        for (i, pose) in self.poses.iter().enumerate() {
            self.instances.push(InstanceTransform {
                position: self.group.rest_position(i, Vec3::ZERO) + pose.offset,
                rotation: pose.rotation,
                scale: Vec3::splat(pose.scale),
                ..Default::default()
            });
        }
    }
}

impl GroupController for Decorations {
    fn name(&self) -> &'static str {
        "decorations"
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
        match ctx.state {
            SceneState::Formed => self.update_formed(ctx),
            SceneState::Chaos => self.update_chaos(ctx.dt),
        }
        self.place();
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        let textures = (0..self.count()).map(|i| self.photos.get(i).cloned()).collect();
        let mut out = GroupOutput::new(
            self.name(),
            ParticleGeometry::Mesh { asset_id: "photo_frame" },
            self.instances.clone(),
        );
        out.textures = Some(textures);
        vec![out]
    }
}
