pub mod camera;
pub mod config;
pub mod easing;
pub mod generators;
pub mod groups;
pub mod input;
pub mod particle;
pub mod particle_eval;
pub mod persistence;
pub mod router;
pub mod scene;
pub mod scene_state;

pub mod cli;
