//! Orbit camera model and the camera control adapter.
//!
//! The renderer owns an orbit camera described only by its azimuth and polar
//! angles around a fixed target. [`OrbitControls`] is that seam; the crate's
//! own [`OrbitCamera`] implements it for headless runs and supplies the
//! projection used by magnet interactions.
//!
//! Authority over the angles alternates between the right hand and the
//! renderer's own (manual or automatic) orbiting:
//! - **Hand authority**: the adapter pulls the camera toward its targets every frame.
//! - **Manual authority**: camera changes are mirrored back into the targets, so
//!   re-engaging the hand starts from where the camera actually is.

use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::config::CameraConfig;
use crate::easing::approach;
use crate::router::CameraDelta;

/// Azimuth/polar pair in radians. Polar is measured from +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CameraAngles {
    pub azimuth: f32,
    pub polar: f32,
}

/// Desired orbit angles maintained by the adapter.
pub type CameraControlTarget = CameraAngles;

/// Angle access to an orbit-style camera.
pub trait OrbitControls {
    fn azimuth(&self) -> f32;
    fn polar(&self) -> f32;
    fn set_azimuth(&mut self, azimuth: f32);
    fn set_polar(&mut self, polar: f32);

    fn angles(&self) -> CameraAngles {
        CameraAngles {
            azimuth: self.azimuth(),
            polar: self.polar(),
        }
    }
}

// ============================================================================
// Orbit camera
// ============================================================================

#[derive(Clone, Debug)]
pub struct OrbitCamera {
    azimuth: f32,
    polar: f32,
    pub distance: f32,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    min_polar: f32,
    max_polar: f32,
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            azimuth: config.initial_azimuth,
            polar: config.initial_polar.clamp(config.min_polar, config.max_polar),
            distance: config.distance,
            target: Vec3::ZERO,
            fov: config.fov,
            aspect: config.aspect,
            near: config.near,
            far: config.far,
            min_polar: config.min_polar,
            max_polar: config.max_polar,
        }
    }

    /// World position on the orbit sphere.
    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point into normalised device coordinates.
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection_matrix().project_point3(point)
    }

    /// Snapshot of what the projection needs, cheap to pass per frame.
    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position(),
            view_projection: self.view_projection_matrix(),
        }
    }
}

impl OrbitControls for OrbitCamera {
    fn azimuth(&self) -> f32 {
        self.azimuth
    }

    fn polar(&self) -> f32 {
        self.polar
    }

    fn set_azimuth(&mut self, azimuth: f32) {
        self.azimuth = azimuth;
    }

    fn set_polar(&mut self, polar: f32) {
        self.polar = polar.clamp(self.min_polar, self.max_polar);
    }
}

/// Per-frame camera data needed for screen-space tests.
#[derive(Clone, Copy, Debug)]
pub struct CameraView {
    pub position: Vec3,
    pub view_projection: Mat4,
}

impl CameraView {
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection.project_point3(point)
    }
}

// ============================================================================
// Control adapter
// ============================================================================

#[derive(Clone, Debug)]
pub struct CameraControlAdapter {
    target: CameraControlTarget,
    hand_authority: bool,
    min_polar: f32,
    max_polar: f32,
    follow_rate: f32,
}

impl CameraControlAdapter {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            target: CameraControlTarget {
                azimuth: config.initial_azimuth,
                polar: config.initial_polar.clamp(config.min_polar, config.max_polar),
            },
            hand_authority: false,
            min_polar: config.min_polar,
            max_polar: config.max_polar,
            follow_rate: config.follow_rate,
        }
    }

    pub fn target(&self) -> CameraControlTarget {
        self.target
    }

    pub fn hand_authority(&self) -> bool {
        self.hand_authority
    }

    fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(self.min_polar, self.max_polar)
    }

    /// Accumulate joystick deltas into the targets. Polar saturates at its limits.
    pub fn apply_delta(&mut self, delta: CameraDelta) {
        self.target.azimuth += delta.azimuth;
        self.target.polar = self.clamp_polar(self.target.polar + delta.polar);
    }

    /// Handle an edge in right-hand activity. The targets are resynchronised
    /// to the camera on both edges so neither hand-over causes a jump.
    pub fn set_hand_authority(&mut self, active: bool, controls: &impl OrbitControls) {
        if active == self.hand_authority {
            return;
        }
        self.hand_authority = active;
        self.sync_from(controls.angles());
        log::debug!(
            "Camera authority -> {} at az={:.3} polar={:.3}",
            if active { "hand" } else { "manual" },
            self.target.azimuth,
            self.target.polar
        );
    }

    /// Change notification from the renderer's orbit controls. Ignored while
    /// the hand has authority.
    pub fn on_controls_changed(&mut self, angles: CameraAngles) {
        if !self.hand_authority {
            self.sync_from(angles);
        }
    }

    fn sync_from(&mut self, angles: CameraAngles) {
        self.target = CameraControlTarget {
            azimuth: angles.azimuth,
            polar: self.clamp_polar(angles.polar),
        };
    }

    /// Drive the controls toward the targets while the hand has authority.
    pub fn update(&self, controls: &mut impl OrbitControls, dt: f32) {
        if !self.hand_authority {
            return;
        }
        let azimuth = approach(controls.azimuth(), self.target.azimuth, self.follow_rate, dt);
        let polar = approach(controls.polar(), self.target.polar, self.follow_rate, dt);
        controls.set_azimuth(azimuth);
        controls.set_polar(polar);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn setup() -> (CameraControlAdapter, OrbitCamera) {
        let config = CameraConfig::default();
        (CameraControlAdapter::new(&config), OrbitCamera::from_config(&config))
    }

    #[test]
    fn test_default_camera_looks_at_origin() {
        let (_, camera) = setup();
        let p = camera.position();
        assert!((p - Vec3::new(0.0, 0.0, 20.0)).length() < 1e-4);
        let ndc = camera.project(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        // Points above the target land in the upper half of the screen.
        assert!(camera.project(Vec3::new(0.0, 3.0, 0.0)).y > 0.0);
    }

    #[test]
    fn test_polar_target_never_leaves_range() {
        let (mut adapter, _) = setup();
        for i in 0..500 {
            let polar = if i % 3 == 0 { 0.7 } else { -0.4 };
            adapter.apply_delta(CameraDelta { azimuth: 0.1, polar });
            let p = adapter.target().polar;
            assert!((PI / 4.0..=PI / 1.5).contains(&p), "polar {p} escaped");
        }
    }

    #[test]
    fn test_manual_changes_are_mirrored_only_without_hand() {
        let (mut adapter, mut camera) = setup();
        camera.set_azimuth(1.0);
        adapter.on_controls_changed(camera.angles());
        assert_eq!(adapter.target().azimuth, 1.0);

        adapter.set_hand_authority(true, &camera);
        adapter.on_controls_changed(CameraAngles { azimuth: 3.0, polar: 1.0 });
        assert_eq!(adapter.target().azimuth, 1.0);
    }

    #[test]
    fn test_release_resyncs_to_actual_camera() {
        let (mut adapter, mut camera) = setup();
        adapter.set_hand_authority(true, &camera);
        adapter.apply_delta(CameraDelta { azimuth: 2.0, polar: 0.0 });
        // Camera has only partly caught up when the hand disappears.
        adapter.update(&mut camera, 0.1);
        let actual = camera.azimuth();
        assert!(actual > 0.0 && actual < 2.0);

        adapter.set_hand_authority(false, &camera);
        assert_eq!(adapter.target().azimuth, actual);
        // No authority: update leaves the camera alone.
        adapter.update(&mut camera, 0.1);
        assert_eq!(camera.azimuth(), actual);
    }

    #[test]
    fn test_hand_authority_converges_without_overshoot() {
        let (mut adapter, mut camera) = setup();
        adapter.set_hand_authority(true, &camera);
        adapter.apply_delta(CameraDelta { azimuth: 1.0, polar: 0.3 });
        let mut last = camera.azimuth();
        for _ in 0..600 {
            adapter.update(&mut camera, 1.0 / 60.0);
            assert!(camera.azimuth() >= last && camera.azimuth() <= 1.0 + 1e-6);
            last = camera.azimuth();
        }
        assert!((camera.azimuth() - 1.0).abs() < 1e-3);
        assert!((camera.polar() - adapter.target().polar).abs() < 1e-3);
    }
}
