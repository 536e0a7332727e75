//! Gift boxes piled around the trunk, each drawn as a box, two crossing
//! ribbons and a bow.

use glam::{Quat, Vec3};
use rand::Rng;

use crate::easing::hex_color;
use crate::generators::{gift_ring, GiftBoxStyle, GiftRing, GIFT_BOX_PALETTE, GIFT_RIBBON_PALETTE};
use crate::particle::{InstanceTransform, ParticleGeometry, ParticleGroup};
use crate::particle_eval::{FrameContext, GroupController, GroupOutput};
use crate::scene_state::SceneState;

const RIBBON_THICKNESS: f32 = 0.08;
/// Ribbons stand slightly proud of the box faces to avoid z-fighting.
const RIBBON_POP: f32 = 0.01;

pub struct GiftBoxes {
    group: ParticleGroup,
    styles: Vec<GiftBoxStyle>,
    boxes: Vec<InstanceTransform>,
    ribbons: Vec<InstanceTransform>,
    bows: Vec<InstanceTransform>,
}

fn chaos_drift(time: f32, index: usize) -> Vec3 {
    let i = index as f32;
    Vec3::new(
        (time * 0.3 + i).sin() * 5.0,
        (time * 0.2 + i).cos() * 2.0,
        (time * 0.4 + i).sin() * 5.0,
    )
}

impl GiftBoxes {
    pub fn new(count: usize, easing_rate: f32, initial: SceneState, rng: &mut impl Rng) -> Self {
        let (positions, styles) = gift_ring(count, &GiftRing::default(), rng);
        let mut gifts = Self {
            group: ParticleGroup::new(positions, easing_rate, initial),
            styles,
            boxes: Vec::with_capacity(count),
            ribbons: Vec::with_capacity(count * 2),
            bows: Vec::with_capacity(count),
        };
        gifts.place(0.0);
        gifts
    }

    fn place(&mut self, time: f32) {
        self.boxes.clear();
        self.ribbons.clear();
        self.bows.clear();
        for (i, style) in self.styles.iter().enumerate() {
            let center = self.group.rest_position(i, chaos_drift(time, i));
            let rotation = Quat::from_rotation_y(style.yaw);
            let size = style.size;
            let box_color = hex_color(GIFT_BOX_PALETTE[style.box_color]);
            let ribbon_color = hex_color(GIFT_RIBBON_PALETTE[style.ribbon_color]);

            self.boxes.push(InstanceTransform {
                position: center,
                rotation,
                scale: size,
                color: box_color,
            });

            let ribbon = InstanceTransform {
                position: center,
                rotation,
                scale: Vec3::ZERO,
                color: ribbon_color,
            };
            self.ribbons.push(InstanceTransform {
                scale: Vec3::new(size.x + RIBBON_POP, size.y + RIBBON_POP, RIBBON_THICKNESS),
                ..ribbon
            });
            self.ribbons.push(InstanceTransform {
                scale: Vec3::new(RIBBON_THICKNESS, size.y + RIBBON_POP, size.z + RIBBON_POP),
                ..ribbon
            });

            let bow = size.x.min(size.z) * 0.5;
            self.bows.push(InstanceTransform {
                position: center + rotation * Vec3::new(0.0, size.y * 0.5, 0.0),
                rotation,
                scale: Vec3::new(bow, bow * 0.6, bow),
                color: ribbon_color,
            });
        }
    }
}

impl GroupController for GiftBoxes {
    fn name(&self) -> &'static str {
        "gift_boxes"
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
        self.place(ctx.time);
    }

    fn outputs(&self) -> Vec<GroupOutput> {
        let cube = ParticleGeometry::Mesh { asset_id: "box" };
        vec![
            GroupOutput::new("gift_boxes", cube.clone(), self.boxes.clone()),
            GroupOutput::new("gift_ribbons", cube, self.ribbons.clone()),
            GroupOutput::new("gift_bows", ParticleGeometry::Mesh { asset_id: "bow" }, self.bows.clone()),
        ]
    }
}
