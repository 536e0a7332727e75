//! Pose signals from the external hand-tracking pipeline.
//!
//! The pipeline runs at its own cadence and publishes into a [`LatestPose`]
//! slot. The scene takes whatever is newest at the start of a frame; frames
//! that arrive in between simply overwrite each other.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Landmark index of the palm base (wrist).
pub const PALM_BASE: usize = 0;
/// Landmark index of the index fingertip.
pub const INDEX_TIP: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// Top-1 gesture classification, using the tracker's category names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    #[serde(rename = "Open_Palm")]
    OpenPalm,
    #[serde(rename = "Closed_Fist")]
    ClosedFist,
    #[default]
    #[serde(rename = "None")]
    Unrecognized,
    /// Any other label the tracker emits (pointing, thumbs, ...).
    #[serde(other)]
    Other,
}

/// Normalised landmark: x and y in [0, 1] image space, y growing downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedHand {
    pub handedness: Handedness,
    #[serde(default)]
    pub gesture: Gesture,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl DetectedHand {
    pub fn new(handedness: Handedness, gesture: Gesture, landmarks: Vec<Landmark>) -> Self {
        Self {
            handedness,
            gesture,
            landmarks,
        }
    }

    /// Landmark at `index`, if present and finite.
    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied().filter(Landmark::is_finite)
    }

    /// The landmark this hand's handedness drives: index tip for the left
    /// hand (cursor), palm base for the right hand (joystick).
    pub fn control_landmark(&self) -> Option<Landmark> {
        match self.handedness {
            Handedness::Left => self.landmark(INDEX_TIP),
            Handedness::Right => self.landmark(PALM_BASE),
        }
    }
}

/// One processed frame of the pose pipeline. Zero hands is a valid frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub hands: Vec<DetectedHand>,
}

impl PoseFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_hands(hands: Vec<DetectedHand>) -> Self {
        Self { hands }
    }

    /// Decode a frame, treating anything malformed as a frame with no hands.
    pub fn from_json_lenient(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Malformed pose frame treated as no hands: {}", e);
                Self::empty()
            }
        }
    }
}

#[derive(Debug, Default)]
struct PoseSlot {
    frame: Option<PoseFrame>,
    overwritten: u64,
    closed: bool,
}

/// Single-slot, latest-value handoff between the pose pipeline and the scene.
///
/// Cloning yields another handle to the same slot; the producer keeps one and
/// the scene keeps the other.
#[derive(Clone, Debug, Default)]
pub struct LatestPose {
    slot: Rc<RefCell<PoseSlot>>,
}

impl LatestPose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending frame. An unread frame is dropped.
    pub fn publish(&self, frame: PoseFrame) {
        let mut slot = self.slot.borrow_mut();
        if slot.closed {
            return;
        }
        if slot.frame.replace(frame).is_some() {
            slot.overwritten += 1;
            log::debug!("Pose frame overwritten before it was read ({} total)", slot.overwritten);
        }
    }

    /// Take the newest unread frame, if any.
    pub fn take(&self) -> Option<PoseFrame> {
        self.slot.borrow_mut().frame.take()
    }

    /// Number of frames replaced before the scene read them.
    pub fn overwritten(&self) -> u64 {
        self.slot.borrow().overwritten
    }

    /// Stop accepting frames, e.g. after camera permission is revoked.
    /// Any pending frame is discarded; the scene keeps its last state.
    pub fn close(&self) {
        let mut slot = self.slot.borrow_mut();
        slot.closed = true;
        slot.frame = None;
    }

    pub fn is_closed(&self) -> bool {
        self.slot.borrow().closed
    }
}
