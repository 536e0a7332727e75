//! Group variants.
//!
//! Each variant owns its generated arrangement and implements
//! [`GroupController`]. [`build_groups`] creates the fixed set of groups a
//! scene starts with; photo decorations are owned separately by the scene
//! because they regenerate when the photo list changes.

pub mod backdrop;
pub mod decorations;
pub mod foliage;
pub mod gift_boxes;
pub mod ornaments;
pub mod sparkles;
pub mod star_topper;

use rand::Rng;

use crate::config::SceneConfig;
use crate::particle_eval::GroupController;
use crate::scene_state::SceneState;

pub use backdrop::{Dust, StarField};
pub use decorations::Decorations;
pub use foliage::Foliage;
pub use gift_boxes::GiftBoxes;
pub use ornaments::{OrnamentKind, Ornaments};
pub use sparkles::Sparkles;
pub use star_topper::StarTopper;

/// Build every fixed group in draw order, settled in `initial`.
pub fn build_groups(
    config: &SceneConfig,
    initial: SceneState,
    rng: &mut impl Rng,
) -> Vec<Box<dyn GroupController>> {
    let counts = &config.counts;
    let rates = &config.easing;

    let mut groups: Vec<Box<dyn GroupController>> = vec![
        Box::new(StarField::new(counts.stars, rates.star_opacity, initial, rng)),
        Box::new(Dust::new(counts.dust, rng)),
        Box::new(Foliage::new(counts.foliage, rates.foliage, initial, rng)),
    ];
    for kind in OrnamentKind::ALL {
        groups.push(Box::new(Ornaments::new(kind, kind.count(counts), initial, rng)));
    }
    groups.push(Box::new(GiftBoxes::new(counts.gift_boxes, rates.gift_boxes, initial, rng)));
    groups.push(Box::new(Sparkles::new(counts.sparkles, rates.sparkles, initial, rng)));
    groups.push(Box::new(StarTopper::new()));

    log::info!(
        "Built {} groups ({} instances)",
        groups.len(),
        groups.iter().map(|g| g.count()).sum::<usize>()
    );
    groups
}
