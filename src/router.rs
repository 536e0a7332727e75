//! Interaction/control signal routing.
//!
//! Turns each pose frame into scene-level signals: a requested scene state,
//! the left-hand cursor, the right-hand joystick with its camera deltas, and
//! edges of right-hand activity for the camera adapter.

use serde::Serialize;

use crate::config::JoystickConfig;
use crate::input::{Gesture, Handedness, Landmark, PoseFrame};
use crate::scene_state::SceneState;

/// A hand-driven point in normalised screen space, x right and y up, both in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScreenPointer {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

impl ScreenPointer {
    pub const INACTIVE: ScreenPointer = ScreenPointer {
        x: 0.0,
        y: 0.0,
        active: false,
    };

    /// Map an image-space landmark to screen space. Image y grows downward,
    /// scene y grows upward, hence the sign flip.
    pub fn from_landmark(point: Landmark) -> Self {
        Self {
            x: ((point.x - 0.5) * 2.0).clamp(-1.0, 1.0),
            y: (-(point.y - 0.5) * 2.0).clamp(-1.0, 1.0),
            active: true,
        }
    }
}

/// Left index fingertip, used for magnet interactions.
pub type HandCursor = ScreenPointer;
/// Right palm position, used only for on-screen feedback.
pub type RightHandJoystick = ScreenPointer;

/// Incremental change to the camera angle targets, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraDelta {
    pub azimuth: f32,
    pub polar: f32,
}

impl CameraDelta {
    pub fn is_zero(&self) -> bool {
        self.azimuth == 0.0 && self.polar == 0.0
    }
}

/// Everything a single frame asks of the rest of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RouterOutput {
    pub requested_state: Option<SceneState>,
    pub camera_delta: Option<CameraDelta>,
    /// `Some(active)` when right-hand activity flipped this frame.
    pub right_hand_edge: Option<bool>,
}

/// Rate-control mapping of one axis: zero inside the deadzone, then linear
/// in the excess deviation.
fn joystick_axis(deviation: f32, deadzone: f32, sensitivity: f32) -> f32 {
    let magnitude = deviation.abs();
    if magnitude <= deadzone {
        0.0
    } else {
        deviation.signum() * (magnitude - deadzone) * sensitivity
    }
}

#[derive(Debug, Default)]
pub struct InteractionRouter {
    config: JoystickConfig,
    cursor: HandCursor,
    joystick: RightHandJoystick,
    right_hand_active: bool,
}

impl InteractionRouter {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn cursor(&self) -> HandCursor {
        self.cursor
    }

    pub fn joystick(&self) -> RightHandJoystick {
        self.joystick
    }

    pub fn right_hand_active(&self) -> bool {
        self.right_hand_active
    }

    /// Route one pose frame.
    ///
    /// Conflicting gestures within one frame resolve to FORMED regardless of
    /// hand order. Hands whose controlling landmark is missing or not finite
    /// are ignored entirely for the frame.
    pub fn process(&mut self, frame: &PoseFrame) -> RouterOutput {
        let mut cursor = HandCursor::INACTIVE;
        let mut joystick = RightHandJoystick::INACTIVE;
        let mut right_active = false;
        let mut wants_formed = false;
        let mut wants_chaos = false;
        let mut delta = CameraDelta::default();

        for hand in &frame.hands {
            let Some(point) = hand.control_landmark() else {
                log::debug!(
                    "Skipping {:?} hand with {} landmarks",
                    hand.handedness,
                    hand.landmarks.len()
                );
                continue;
            };

            match hand.gesture {
                Gesture::OpenPalm => wants_chaos = true,
                Gesture::ClosedFist => wants_formed = true,
                Gesture::Unrecognized | Gesture::Other => {}
            }

            match hand.handedness {
                Handedness::Left => cursor = HandCursor::from_landmark(point),
                Handedness::Right => {
                    right_active = true;
                    joystick = RightHandJoystick::from_landmark(point);
                    let cfg = &self.config;
                    delta.azimuth +=
                        joystick_axis(point.x - 0.5, cfg.deadzone, cfg.sensitivity) * cfg.azimuth_gain;
                    delta.polar += joystick_axis(point.y - 0.5, cfg.deadzone, cfg.sensitivity);
                }
            }
        }

        let requested_state = if wants_formed {
            Some(SceneState::Formed)
        } else if wants_chaos {
            Some(SceneState::Chaos)
        } else {
            None
        };

        let right_hand_edge = (right_active != self.right_hand_active).then_some(right_active);
        if let Some(active) = right_hand_edge {
            log::debug!("Right hand {}", if active { "engaged" } else { "released" });
        }

        self.cursor = cursor;
        self.joystick = joystick;
        self.right_hand_active = right_active;

        RouterOutput {
            requested_state,
            camera_delta: (!delta.is_zero()).then_some(delta),
            right_hand_edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DetectedHand, INDEX_TIP};

    fn hand_at(handedness: Handedness, gesture: Gesture, x: f32, y: f32) -> DetectedHand {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); INDEX_TIP + 1];
        match handedness {
            Handedness::Left => landmarks[INDEX_TIP] = Landmark::new(x, y),
            Handedness::Right => landmarks[0] = Landmark::new(x, y),
        }
        DetectedHand::new(handedness, gesture, landmarks)
    }

    #[test]
    fn test_no_hands_clears_pointers() {
        let mut router = InteractionRouter::new(JoystickConfig::default());
        router.process(&PoseFrame::with_hands(vec![
            hand_at(Handedness::Left, Gesture::Unrecognized, 0.2, 0.3),
            hand_at(Handedness::Right, Gesture::Unrecognized, 0.5, 0.5),
        ]));
        assert!(router.cursor().active);
        assert!(router.joystick().active);

        let out = router.process(&PoseFrame::empty());
        assert_eq!(out.requested_state, None);
        assert_eq!(out.right_hand_edge, Some(false));
        assert_eq!(router.cursor(), HandCursor::INACTIVE);
        assert_eq!(router.joystick(), RightHandJoystick::INACTIVE);
    }

    #[test]
    fn test_left_hand_maps_fingertip_with_inverted_y() {
        let mut router = InteractionRouter::new(JoystickConfig::default());
        router.process(&PoseFrame::with_hands(vec![hand_at(
            Handedness::Left,
            Gesture::Unrecognized,
            0.75,
            0.25,
        )]));
        let cursor = router.cursor();
        assert!(cursor.active);
        assert!((cursor.x - 0.5).abs() < 1e-6);
        assert!((cursor.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_gestures_request_states() {
        let mut router = InteractionRouter::new(JoystickConfig::default());
        let out = router.process(&PoseFrame::with_hands(vec![hand_at(
            Handedness::Left,
            Gesture::ClosedFist,
            0.5,
            0.5,
        )]));
        assert_eq!(out.requested_state, Some(SceneState::Formed));
        let out = router.process(&PoseFrame::with_hands(vec![hand_at(
            Handedness::Right,
            Gesture::OpenPalm,
            0.5,
            0.5,
        )]));
        assert_eq!(out.requested_state, Some(SceneState::Chaos));
    }

    #[test]
    fn test_conflicting_gestures_resolve_to_formed_in_any_order() {
        let mut router = InteractionRouter::new(JoystickConfig::default());
        let open = hand_at(Handedness::Left, Gesture::OpenPalm, 0.5, 0.5);
        let fist = hand_at(Handedness::Right, Gesture::ClosedFist, 0.5, 0.5);
        let a = router.process(&PoseFrame::with_hands(vec![open.clone(), fist.clone()]));
        let b = router.process(&PoseFrame::with_hands(vec![fist, open]));
        assert_eq!(a.requested_state, Some(SceneState::Formed));
        assert_eq!(b.requested_state, Some(SceneState::Formed));
    }

    #[test]
    fn test_hand_without_landmarks_is_skipped() {
        let mut router = InteractionRouter::new(JoystickConfig::default());
        let out = router.process(&PoseFrame::with_hands(vec![DetectedHand::new(
            Handedness::Left,
            Gesture::ClosedFist,
            vec![],
        )]));
        assert_eq!(out, RouterOutput::default());
        assert!(!router.cursor().active);
    }

    #[test]
    fn test_deadzone_produces_no_delta() {
        let config = JoystickConfig::default();
        let mut router = InteractionRouter::new(config.clone());
        for (x, y) in [(0.5, 0.5), (0.54, 0.46), (0.46, 0.54), (0.53, 0.5)] {
            let out = router.process(&PoseFrame::with_hands(vec![hand_at(
                Handedness::Right,
                Gesture::Unrecognized,
                x,
                y,
            )]));
            assert_eq!(out.camera_delta, None, "({x}, {y}) is inside the deadzone");
        }
    }

    #[test]
    fn test_joystick_is_rate_control() {
        let config = JoystickConfig::default();
        let mut router = InteractionRouter::new(config.clone());
        let out = router.process(&PoseFrame::with_hands(vec![hand_at(
            Handedness::Right,
            Gesture::Unrecognized,
            0.75,
            0.25,
        )]));
        let delta = out.camera_delta.unwrap_or_default();
        let expected_az = (0.25 - config.deadzone) * config.sensitivity * config.azimuth_gain;
        let expected_polar = -(0.25 - config.deadzone) * config.sensitivity;
        assert!((delta.azimuth - expected_az).abs() < 1e-6);
        assert!((delta.polar - expected_polar).abs() < 1e-6);
        assert_eq!(out.right_hand_edge, Some(true));

        // Holding the same pose keeps producing the same increment.
        let again = router.process(&PoseFrame::with_hands(vec![hand_at(
            Handedness::Right,
            Gesture::Unrecognized,
            0.75,
            0.25,
        )]));
        assert_eq!(again.camera_delta, out.camera_delta);
        assert_eq!(again.right_hand_edge, None);

        let joystick = router.joystick();
        assert!((joystick.x - 0.5).abs() < 1e-6 && (joystick.y - 0.5).abs() < 1e-6);
    }
}
