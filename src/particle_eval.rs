//! Per-frame group evaluation and GPU instance generation.
//!
//! This module defines the seam between the scene and its groups:
//! - [`FrameContext`] carries everything a group may read in one tick
//! - [`GroupController`] is implemented by every group variant
//! - [`GroupOutput`] is the renderer-facing result, convertible to GPU records

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use serde::Serialize;

use crate::camera::{CameraAngles, CameraView};
use crate::particle::{InstanceTransform, ParticleGeometry};
use crate::persistence::PhotoRef;
use crate::router::HandCursor;
use crate::scene_state::SceneState;

/// GPU instance data for point sprites.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuPointInstance {
    pub position: [f32; 3],
    /// Point size before perspective attenuation.
    pub size: f32,
    /// RGBA color with alpha for opacity.
    pub color: [f32; 4],
}

impl GpuPointInstance {
    /// Vertex buffer layout for instanced sprites (slot 1, step mode Instance).
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuPointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // position: vec3<f32>
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3, // After quad vertex attributes (0, 1, 2)
                    format: wgpu::VertexFormat::Float32x3,
                },
                // size: f32
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32,
                },
                // color: vec4<f32>
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// GPU instance data for mesh instances: full model matrix plus colour.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuMeshInstance {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// RGBA color with alpha for opacity.
    pub color: [f32; 4],
}

impl GpuMeshInstance {
    /// Vertex buffer layout for instanced rendering.
    /// This should be used as the second vertex buffer (slot 1) with step_mode::Instance.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuMeshInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // model matrix: 4 x vec4<f32> columns
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3, // After mesh vertex attributes (0, 1, 2)
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 48,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // color: vec4<f32>
                wgpu::VertexAttribute {
                    offset: 64,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Everything a group may read during one tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Elapsed scene time in seconds.
    pub time: f32,
    /// Delta time since last frame.
    pub dt: f32,
    pub state: SceneState,
    pub cursor: HandCursor,
    pub camera: CameraView,
}

/// Renderer-facing output of one drawable batch.
#[derive(Clone, Debug, Serialize)]
pub struct GroupOutput {
    pub name: &'static str,
    pub geometry: ParticleGeometry,
    /// Multiplies every instance's alpha.
    pub opacity: f32,
    pub instances: Vec<InstanceTransform>,
    /// Per-instance image references, for textured groups only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<Option<PhotoRef>>>,
}

impl GroupOutput {
    pub fn new(name: &'static str, geometry: ParticleGeometry, instances: Vec<InstanceTransform>) -> Self {
        Self {
            name,
            geometry,
            opacity: 1.0,
            instances,
            textures: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn to_mesh_instances(&self) -> Vec<GpuMeshInstance> {
        generate_mesh_instances(&self.instances, self.opacity)
    }

    /// Point records; empty for mesh batches.
    pub fn to_point_instances(&self) -> Vec<GpuPointInstance> {
        match self.geometry {
            ParticleGeometry::Point { size } => generate_point_instances(&self.instances, size, self.opacity),
            ParticleGeometry::Mesh { .. } => Vec::new(),
        }
    }
}

/// One rendered frame of the whole scene.
#[derive(Clone, Debug, Serialize)]
pub struct FrameOutput {
    pub time: f32,
    pub state: SceneState,
    pub camera: CameraAngles,
    pub cursor: HandCursor,
    pub groups: Vec<GroupOutput>,
}

impl FrameOutput {
    pub fn group(&self, name: &str) -> Option<&GroupOutput> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(|g| g.instances.len()).sum()
    }
}

/// A particle group variant driven once per frame by the scene.
pub trait GroupController {
    fn name(&self) -> &'static str;

    fn count(&self) -> usize;

    /// Raw FORMED weight in [0, 1]. Groups without a CHAOS/FORMED duality report 1.
    fn progress(&self) -> f32 {
        1.0
    }

    /// Advance progress and recompute instance transforms.
    fn update(&mut self, ctx: &FrameContext);

    /// Drawable batches for the current frame.
    fn outputs(&self) -> Vec<GroupOutput>;
}

fn apply_opacity(color: [f32; 4], opacity: f32) -> [f32; 4] {
    [color[0], color[1], color[2], (color[3] * opacity).clamp(0.0, 1.0)]
}

/// Generate GPU-ready mesh instances.
pub fn generate_mesh_instances(instances: &[InstanceTransform], opacity: f32) -> Vec<GpuMeshInstance> {
    instances
        .iter()
        .map(|t| GpuMeshInstance {
            model: Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position).to_cols_array_2d(),
            color: apply_opacity(t.color, opacity),
        })
        .collect()
}

/// Generate GPU-ready point instances. The instance scale's x component
/// multiplies the base point size.
pub fn generate_point_instances(
    instances: &[InstanceTransform],
    base_size: f32,
    opacity: f32,
) -> Vec<GpuPointInstance> {
    instances
        .iter()
        .map(|t| GpuPointInstance {
            position: t.position.to_array(),
            size: base_size * t.scale.x,
            color: apply_opacity(t.color, opacity),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_gpu_record_sizes() {
        assert_eq!(std::mem::size_of::<GpuPointInstance>(), 32);
        assert_eq!(std::mem::size_of::<GpuMeshInstance>(), 80);
    }

    fn assert_packed(layout: &wgpu::VertexBufferLayout<'_>, record_size: usize) {
        assert_eq!(layout.array_stride, record_size as wgpu::BufferAddress);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        for pair in layout.attributes.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
            assert!(pair[0].shader_location < pair[1].shader_location);
        }
        let last = layout.attributes.last().expect("layout has attributes");
        assert_eq!(last.offset + last.format.size(), layout.array_stride);
    }

    #[test]
    fn test_vertex_layouts_match_records() {
        assert_packed(&GpuPointInstance::desc(), std::mem::size_of::<GpuPointInstance>());
        assert_packed(&GpuMeshInstance::desc(), std::mem::size_of::<GpuMeshInstance>());
    }

    #[test]
    fn test_group_output_to_mesh_instances() {
        let t = InstanceTransform {
            position: Vec3::new(0.0, -8.0, 9.0),
            color: [0.2, 0.4, 0.6, 1.0],
            ..Default::default()
        };
        let out = GroupOutput::new("boxes", ParticleGeometry::Mesh { asset_id: "box" }, vec![t, t]).with_opacity(0.5);
        let gpu = out.to_mesh_instances();
        assert_eq!(gpu.len(), 2);
        assert_eq!(gpu[1].model[3], [0.0, -8.0, 9.0, 1.0]);
        assert_eq!(gpu[1].color, [0.2, 0.4, 0.6, 0.5]);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&gpu).len(), 2 * 80);
    }

    #[test]
    fn test_mesh_instance_model_matrix() {
        let t = InstanceTransform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
            color: [1.0, 0.0, 0.0, 0.5],
        };
        let gpu = generate_mesh_instances(&[t], 0.5);
        assert_eq!(gpu[0].model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(gpu[0].model[0][0], 2.0);
        assert!((gpu[0].color[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_point_output_uses_base_size() {
        let t = InstanceTransform {
            scale: Vec3::splat(1.5),
            ..Default::default()
        };
        let out = GroupOutput::new("dots", ParticleGeometry::Point { size: 4.0 }, vec![t]).with_opacity(0.3);
        let points = out.to_point_instances();
        assert_eq!(points.len(), 1);
        assert!((points[0].size - 6.0).abs() < 1e-6);
        assert!((points[0].color[3] - 0.3).abs() < 1e-6);

        let mesh = GroupOutput::new("boxes", ParticleGeometry::Mesh { asset_id: "box" }, vec![t]);
        assert!(mesh.to_point_instances().is_empty());
    }
}
