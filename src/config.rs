//! Startup configuration.
//!
//! Every field has a default matching the stock scene, so a config file only
//! needs the values it overrides.

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for all procedural generators. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub counts: GroupCounts,
    pub easing: EasingRates,
    pub joystick: JoystickConfig,
    pub magnet: MagnetConfig,
    pub camera: CameraConfig,
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if cam.min_polar.is_nan() || cam.max_polar.is_nan() || cam.min_polar >= cam.max_polar {
            return Err(ConfigError::Invalid(format!(
                "camera.min_polar ({}) must be below camera.max_polar ({})",
                cam.min_polar, cam.max_polar
            )));
        }
        if self.magnet.gate_radius.is_nan() || self.magnet.gate_radius <= 0.0 {
            return Err(ConfigError::Invalid("magnet.gate_radius must be positive".into()));
        }
        if self.joystick.deadzone < 0.0 || self.joystick.deadzone >= 0.5 {
            return Err(ConfigError::Invalid("joystick.deadzone must be in [0, 0.5)".into()));
        }
        Ok(())
    }
}

/// Instance counts per group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupCounts {
    pub foliage: usize,
    pub gold_balls: usize,
    pub red_balls: usize,
    pub lights: usize,
    pub snowflakes: usize,
    pub gingerbread: usize,
    pub gift_boxes: usize,
    pub sparkles: usize,
    pub stars: usize,
    pub dust: usize,
    /// Photo decorations shown when the photo list is empty.
    pub placeholder_photos: usize,
}

impl Default for GroupCounts {
    fn default() -> Self {
        Self {
            foliage: 50_000,
            gold_balls: 260,
            red_balls: 226,
            lights: 150,
            snowflakes: 80,
            gingerbread: 40,
            gift_boxes: 240,
            sparkles: 1_500,
            stars: 2_000,
            dust: 500,
            placeholder_photos: 20,
        }
    }
}

/// Progress convergence rates, per second. Ornament rates are derived from
/// their weight as `2 / weight`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasingRates {
    pub foliage: f32,
    pub gift_boxes: f32,
    pub sparkles: f32,
    pub star_opacity: f32,
    pub decorations: f32,
}

impl Default for EasingRates {
    fn default() -> Self {
        Self {
            foliage: 1.5,
            gift_boxes: 2.0 / 1.5,
            sparkles: 1.5,
            star_opacity: 1.0,
            decorations: 2.0,
        }
    }
}

/// Right-hand joystick mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Palm deviation from frame centre ignored on each axis.
    pub deadzone: f32,
    /// Radians per frame per unit of deviation beyond the deadzone.
    pub sensitivity: f32,
    /// Extra multiplier on the azimuth axis.
    pub azimuth_gain: f32,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.05,
            sensitivity: 0.05,
            azimuth_gain: 2.0,
        }
    }
}

/// Magnet interaction on photo decorations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnetConfig {
    /// NDC distance below which a decoration is captured.
    pub gate_radius: f32,
    /// World units a captured decoration moves toward the camera.
    pub pull_distance: f32,
    pub captured_scale: f32,
    pub idle_scale: f32,
    pub hovered_scale: f32,
    pub scattered_scale: f32,
    pub scale_rate: f32,
    pub pull_rate: f32,
    pub turn_rate: f32,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            gate_radius: 0.2,
            pull_distance: 4.0,
            captured_scale: 2.5,
            idle_scale: 1.0,
            hovered_scale: 1.5,
            scattered_scale: 1.4,
            scale_rate: 5.0,
            pull_rate: 2.0,
            turn_rate: 2.0,
        }
    }
}

/// Orbit camera model and its control adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub initial_azimuth: f32,
    pub initial_polar: f32,
    /// Rate at which hand authority pulls the camera toward its targets.
    pub follow_rate: f32,
    /// Auto-rotation speed in radians per second while scattered.
    pub auto_rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 20.0,
            fov: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 500.0,
            min_polar: PI / 4.0,
            max_polar: PI / 1.5,
            initial_azimuth: 0.0,
            initial_polar: PI / 2.0,
            follow_rate: 2.0,
            auto_rotate_speed: 2.0 * PI / 60.0 * 0.5,
        }
    }
}
