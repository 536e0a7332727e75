//! Easing and smoothing primitives shared by every particle group.
//!
//! All per-frame convergence in the engine goes through [`smoothing_factor`]
//! so that a large frame delta saturates at the target instead of
//! overshooting it.

use glam::{Quat, Vec3};

/// Smoothstep-shaped ease: slow in, slow out.
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Fraction of the remaining distance covered this frame, `rate * dt` clamped to [0, 1].
#[inline]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Exponential approach of `current` toward `target`.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(current, target, smoothing_factor(rate, dt))
}

#[inline]
pub fn approach_vec3(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    current.lerp(target, smoothing_factor(rate, dt))
}

#[inline]
pub fn approach_quat(current: Quat, target: Quat, rate: f32, dt: f32) -> Quat {
    current.slerp(target, smoothing_factor(rate, dt)).normalize()
}

/// Uniform jitter in `[-scale / 2, scale / 2)` from a unit random value.
#[inline]
pub fn jitter(unit: f32, scale: f32) -> f32 {
    (unit - 0.5) * scale
}

/// Parse a `#RRGGBB` hex colour into linear-ish RGBA (no gamma conversion).
pub fn hex_color(hex: &str) -> [f32; 4] {
    let digits = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
            .unwrap_or(1.0)
    };
    [channel(0..2), channel(2..4), channel(4..6), 1.0]
}
