//! Scene orchestration: one [`Scene::tick`] per rendered frame.
//!
//! Each tick runs in a fixed order:
//! 1. take the newest pose frame, if one arrived
//! 2. route it into state requests, cursor updates and camera deltas
//! 3. drive the camera (hand authority or auto-rotation)
//! 4. update every group with the resulting state, cursor and camera

use std::sync::mpsc::Receiver;

use rand::rngs::StdRng;

use crate::camera::{CameraControlAdapter, OrbitCamera, OrbitControls};
use crate::config::SceneConfig;
use crate::generators::scene_rng;
use crate::groups::{build_groups, Decorations};
use crate::input::LatestPose;
use crate::particle_eval::{FrameContext, FrameOutput, GroupController};
use crate::persistence::PhotoRef;
use crate::router::{HandCursor, InteractionRouter, RightHandJoystick};
use crate::scene_state::{SceneState, SceneStateMachine, StateTransition, TransitionSource};

pub struct Scene {
    config: SceneConfig,
    /// Elapsed scene time in seconds.
    time: f32,
    rng: StdRng,
    state: SceneStateMachine,
    router: InteractionRouter,
    adapter: CameraControlAdapter,
    camera: OrbitCamera,
    groups: Vec<Box<dyn GroupController>>,
    decorations: Decorations,
    pose_feed: LatestPose,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self::with_photos(config, Vec::new())
    }

    pub fn with_photos(config: SceneConfig, photos: Vec<PhotoRef>) -> Self {
        let mut rng = scene_rng(config.seed);
        let state = SceneStateMachine::new();
        let initial = state.state();
        let groups = build_groups(&config, initial, &mut rng);
        let decorations = Decorations::new(
            photos,
            config.counts.placeholder_photos,
            config.easing.decorations,
            config.magnet.clone(),
            initial,
            &mut rng,
        );
        Self {
            router: InteractionRouter::new(config.joystick.clone()),
            adapter: CameraControlAdapter::new(&config.camera),
            camera: OrbitCamera::from_config(&config.camera),
            time: 0.0,
            rng,
            state,
            groups,
            decorations,
            pose_feed: LatestPose::new(),
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn state(&self) -> SceneState {
        self.state.state()
    }

    pub fn cursor(&self) -> HandCursor {
        self.router.cursor()
    }

    pub fn joystick(&self) -> RightHandJoystick {
        self.router.joystick()
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_adapter(&self) -> &CameraControlAdapter {
        &self.adapter
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    /// Every group in draw order, decorations last.
    pub fn groups<'a>(&'a self) -> impl Iterator<Item = &'a (dyn GroupController + 'a)> + 'a {
        let decorations: &'a (dyn GroupController + 'a) = &self.decorations;
        self.groups
            .iter()
            .map(|g| -> &'a (dyn GroupController + 'a) { &**g })
            .chain(std::iter::once(decorations))
    }

    /// Handle for the pose pipeline to publish into.
    pub fn pose_feed(&self) -> LatestPose {
        self.pose_feed.clone()
    }

    pub fn subscribe(&mut self) -> Receiver<StateTransition> {
        self.state.subscribe()
    }

    /// Explicit command, e.g. from a button.
    pub fn set_state(&mut self, next: SceneState) -> Option<StateTransition> {
        self.state.request(next, TransitionSource::Command)
    }

    pub fn toggle_state(&mut self) -> Option<StateTransition> {
        self.state.toggle()
    }

    pub fn set_photos(&mut self, photos: Vec<PhotoRef>) {
        let state = self.state.state();
        self.decorations.set_photos(photos, state, &mut self.rng);
    }

    pub fn hover_decoration(&mut self, index: Option<usize>) {
        self.decorations.set_hovered(index);
    }

    /// Orbit by mouse drag. Ignored while the right hand holds the camera.
    pub fn orbit_manually(&mut self, azimuth: f32, polar: f32) {
        if self.adapter.hand_authority() {
            return;
        }
        self.camera.set_azimuth(self.camera.azimuth() + azimuth);
        self.camera.set_polar(self.camera.polar() + polar);
        self.adapter.on_controls_changed(self.camera.angles());
    }

    /// Advance the scene by `dt` seconds and return the frame to draw.
    pub fn tick(&mut self, dt: f32) -> FrameOutput {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Ignoring invalid frame delta {}", dt);
            0.0
        };
        self.time += dt;

        if let Some(frame) = self.pose_feed.take() {
            let routed = self.router.process(&frame);
            if let Some(next) = routed.requested_state {
                self.state.request(next, TransitionSource::Gesture);
            }
            if let Some(active) = routed.right_hand_edge {
                self.adapter.set_hand_authority(active, &self.camera);
            }
            if let Some(delta) = routed.camera_delta {
                self.adapter.apply_delta(delta);
            }
        }

        if self.adapter.hand_authority() {
            self.adapter.update(&mut self.camera, dt);
        } else if self.state.auto_rotate() {
            let azimuth = self.camera.azimuth() + self.config.camera.auto_rotate_speed * dt;
            self.camera.set_azimuth(azimuth);
            self.adapter.on_controls_changed(self.camera.angles());
        }

        let ctx = FrameContext {
            time: self.time,
            dt,
            state: self.state.state(),
            cursor: self.router.cursor(),
            camera: self.camera.view(),
        };
        for group in self.groups.iter_mut() {
            group.update(&ctx);
        }
        self.decorations.update(&ctx);

        self.frame()
    }

    /// Current frame without advancing time.
    pub fn frame(&self) -> FrameOutput {
        FrameOutput {
            time: self.time,
            state: self.state.state(),
            camera: self.camera.angles(),
            cursor: self.router.cursor(),
            groups: self.groups().flat_map(|g| g.outputs()).collect(),
        }
    }
}
