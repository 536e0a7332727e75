//! Procedural position generators.
//!
//! Every generator maps a particle count (plus group parameters) to two
//! fixed-size arrays: the FORMED arrangement and the CHAOS arrangement.
//! Randomness is injected so that a seeded [`StdRng`] reproduces the same
//! layout; the scene seeds from the OS when no seed is configured.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::easing::jitter;

/// Build the random source used by all generators.
pub fn scene_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// The two target arrangements for one group. Both arrays always hold
/// exactly `count` points.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GeneratedPositions {
    pub formed: Vec<Vec3>,
    pub chaos: Vec<Vec3>,
}

impl GeneratedPositions {
    fn with_capacity(count: usize) -> Self {
        Self {
            formed: Vec::with_capacity(count),
            chaos: Vec::with_capacity(count),
        }
    }

    pub fn len(&self) -> usize {
        self.formed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formed.is_empty()
    }

    fn push(&mut self, formed: Vec3, chaos: Vec3) {
        self.formed.push(formed);
        self.chaos.push(chaos);
    }
}

/// The multi-turn spiral cone shared by the tree body and the ornaments.
#[derive(Clone, Copy, Debug)]
pub struct SpiralCone {
    pub height: f32,
    pub base_radius: f32,
    pub turns: f32,
    pub y_offset: f32,
}

impl Default for SpiralCone {
    fn default() -> Self {
        Self {
            height: 15.0,
            base_radius: 7.0,
            turns: 20.0,
            y_offset: 2.0,
        }
    }
}

impl SpiralCone {
    /// Height at parameter `t` (0 = apex, 1 = base).
    fn height_at(&self, t: f32) -> f32 {
        (1.0 - t) * self.height - self.height / 2.0 + self.y_offset
    }

    fn angle_at(&self, t: f32) -> f32 {
        t * TAU * self.turns
    }

    /// Point on the spiral with the given radial and vertical offsets.
    fn point(&self, t: f32, radius_offset: f32, y_offset: f32, clamp_radius: bool) -> Vec3 {
        let mut r = t * self.base_radius + radius_offset;
        if clamp_radius {
            r = r.max(0.0);
        }
        let angle = self.angle_at(t);
        Vec3::new(angle.cos() * r, self.height_at(t) + y_offset, angle.sin() * r)
    }
}

/// Unit direction of `p` projected onto the ground plane. Points on the axis
/// fall back to a unit length of 1, i.e. a zero direction.
fn radial_direction(p: Vec3) -> Vec3 {
    let len = (p.x * p.x + p.z * p.z).sqrt();
    let len = if len > 0.0 { len } else { 1.0 };
    Vec3::new(p.x / len, 0.0, p.z / len)
}

/// Uniformly distributed point on a spherical shell with radius in `[inner, outer)`.
pub fn shell_point(rng: &mut impl Rng, inner: f32, outer: f32) -> Vec3 {
    let r = inner + rng.random::<f32>() * (outer - inner);
    let theta = rng.random::<f32>() * TAU;
    let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

fn cube_point(rng: &mut impl Rng, side: f32) -> Vec3 {
    Vec3::new(
        jitter(rng.random(), side),
        jitter(rng.random(), side),
        jitter(rng.random(), side),
    )
}

/// Tree body: a tight spiral from apex to base. The CHAOS arrangement is the
/// FORMED one plus a tiny jitter, so the body stays anchored when scattered.
pub fn foliage(count: usize, cone: &SpiralCone, rng: &mut impl Rng) -> GeneratedPositions {
    let mut out = GeneratedPositions::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let formed = cone.point(t, jitter(rng.random(), 0.75), jitter(rng.random(), 0.2), true);
        let chaos = formed
            + Vec3::new(
                jitter(rng.random(), 0.1),
                jitter(rng.random(), 0.1),
                jitter(rng.random(), 0.1),
            );
        out.push(formed, chaos);
    }
    out
}

/// Ornament band along the spiral. `t = sqrt(u)` biases density toward the
/// base; CHAOS points explode outward along each point's own radial direction.
pub fn spiral_band(count: usize, cone: &SpiralCone, rng: &mut impl Rng) -> GeneratedPositions {
    let mut out = GeneratedPositions::with_capacity(count);
    for _ in 0..count {
        let t = rng.random::<f32>().sqrt();
        let formed = cone.point(t, jitter(rng.random(), 1.0), jitter(rng.random(), 0.5), false);

        let dir = radial_direction(formed);
        let expansion = 25.0 + rng.random::<f32>() * 40.0;
        let chaos = Vec3::new(
            formed.x + dir.x * expansion,
            formed.y + jitter(rng.random(), 10.0),
            formed.z + dir.z * expansion,
        );
        out.push(formed, chaos);
    }
    out
}

/// Snowflakes interleave with the canopy: the band points are pushed along
/// their radial direction by a signed offset in `[-2, 1)`, some landing
/// inside the foliage. CHAOS points fill a cube.
pub fn snowflakes(count: usize, cone: &SpiralCone, rng: &mut impl Rng) -> GeneratedPositions {
    let base = spiral_band(count, cone, rng);
    let mut out = GeneratedPositions::with_capacity(count);
    for p in base.formed {
        let dir = radial_direction(p);
        let push = -2.0 + rng.random::<f32>() * 3.0;
        let formed = Vec3::new(
            p.x + dir.x * push,
            p.y + jitter(rng.random(), 2.0),
            p.z + dir.z * push,
        );
        out.push(formed, cube_point(rng, 50.0));
    }
    out
}

/// Footprint profile of a gift box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GiftShape {
    Flat,
    Tall,
    Cube,
}

impl GiftShape {
    fn pick(u: f32) -> Self {
        if u < 0.4 {
            GiftShape::Flat
        } else if u < 0.7 {
            GiftShape::Tall
        } else {
            GiftShape::Cube
        }
    }

    pub fn dimensions(self) -> Vec3 {
        match self {
            GiftShape::Flat => Vec3::new(1.6, 0.5, 1.2),
            GiftShape::Tall => Vec3::new(0.8, 1.2, 0.8),
            GiftShape::Cube => Vec3::ONE,
        }
    }
}

pub const GIFT_BOX_PALETTE: [&str; 7] = [
    "#2E5936", "#2E5936", "#228B22", "#006400", "#B22222", "#DAA520", "#800000",
];

pub const GIFT_RIBBON_PALETTE: [&str; 3] = ["#FFD700", "#FF4500", "#F0E68C"];

/// Per-box appearance chosen at generation time.
#[derive(Clone, Copy, Debug)]
pub struct GiftBoxStyle {
    /// Final box dimensions (shape profile times global size variation).
    pub size: Vec3,
    pub yaw: f32,
    pub box_color: usize,
    pub ribbon_color: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct GiftRing {
    pub inner_radius: f32,
    pub ring_width: f32,
    /// Radius at which the pile reaches `max_stack`. Boxes inside it stack
    /// higher, boxes outside it lower.
    pub stack_peak_radius: f32,
    pub floor_y: f32,
    pub max_stack: f32,
    pub chaos_inner: f32,
    pub chaos_outer: f32,
}

impl Default for GiftRing {
    fn default() -> Self {
        Self {
            inner_radius: 8.0,
            ring_width: 5.0,
            stack_peak_radius: 9.5,
            floor_y: -8.0,
            max_stack: 2.5,
            chaos_inner: 20.0,
            chaos_outer: 50.0,
        }
    }
}

/// Gift boxes piled in an annulus around the trunk; inner boxes stack higher.
pub fn gift_ring(
    count: usize,
    ring: &GiftRing,
    rng: &mut impl Rng,
) -> (GeneratedPositions, Vec<GiftBoxStyle>) {
    let mut out = GeneratedPositions::with_capacity(count);
    let mut styles = Vec::with_capacity(count);
    for _ in 0..count {
        let angle = rng.random::<f32>() * TAU;
        let bias = rng.random::<f32>().powi(2);
        let r = ring.inner_radius + bias * ring.ring_width;
        let height_factor = 1.0 - (r - ring.stack_peak_radius) / ring.ring_width;
        let y = ring.floor_y + rng.random::<f32>() * ring.max_stack * height_factor;
        let formed = Vec3::new(angle.cos() * r, y, angle.sin() * r);
        let chaos = shell_point(rng, ring.chaos_inner, ring.chaos_outer);
        out.push(formed, chaos);

        let shape = GiftShape::pick(rng.random());
        let global_scale = 0.8 + rng.random::<f32>() * 0.6;
        styles.push(GiftBoxStyle {
            size: shape.dimensions() * global_scale,
            yaw: rng.random::<f32>() * TAU,
            box_color: rng.random_range(0..GIFT_BOX_PALETTE.len()),
            ribbon_color: rng.random_range(0..GIFT_RIBBON_PALETTE.len()),
        });
    }
    (out, styles)
}

#[derive(Clone, Copy, Debug)]
pub struct SparkleCone {
    pub height: f32,
    pub base_radius: f32,
    pub y_offset: f32,
    pub chaos_inner: f32,
    pub chaos_outer: f32,
}

impl Default for SparkleCone {
    fn default() -> Self {
        Self {
            height: 14.0,
            base_radius: 6.0,
            y_offset: 2.0,
            chaos_inner: 10.0,
            chaos_outer: 30.0,
        }
    }
}

/// Sparkles sampled uniformly by area inside the cone's cross-section.
/// Returns the positions and a per-instance random size factor.
pub fn cone_volume(
    count: usize,
    cone: &SparkleCone,
    rng: &mut impl Rng,
) -> (GeneratedPositions, Vec<f32>) {
    let mut out = GeneratedPositions::with_capacity(count);
    let mut sizes = Vec::with_capacity(count);
    for _ in 0..count {
        let h = rng.random::<f32>();
        let y = (1.0 - h) * cone.height - cone.height / 2.0 + cone.y_offset;
        let r = h * cone.base_radius * rng.random::<f32>().sqrt();
        let theta = rng.random::<f32>() * TAU;
        let formed = Vec3::new(r * theta.cos(), y, r * theta.sin());
        out.push(formed, shell_point(rng, cone.chaos_inner, cone.chaos_outer));
        sizes.push(rng.random());
    }
    (out, sizes)
}

/// Single fixed arrangement on a shell, plus one random phase per point.
pub fn shell_field(
    count: usize,
    inner: f32,
    outer: f32,
    rng: &mut impl Rng,
) -> (Vec<Vec3>, Vec<f32>) {
    let mut positions = Vec::with_capacity(count);
    let mut phases = Vec::with_capacity(count);
    for _ in 0..count {
        positions.push(shell_point(rng, inner, outer));
        phases.push(rng.random());
    }
    (positions, phases)
}

/// Tapered spiral for photo decorations; `count` must already include the
/// placeholder fallback.
pub fn photo_spiral(count: usize, rng: &mut impl Rng) -> GeneratedPositions {
    let mut out = GeneratedPositions::with_capacity(count);
    for i in 0..count {
        let h = (i as f32 / count as f32) * 10.0 - 5.0;
        let r = 6.0 - (h + 5.0) * 0.3;
        let angle = i as f32 * 0.8;
        let formed = Vec3::new(angle.cos() * r, h, angle.sin() * r);
        out.push(formed, cube_point(rng, 15.0));
    }
    out
}
