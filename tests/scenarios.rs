//! End-to-end scenarios through the public API.
//!
//! Run with: cargo test --test scenarios

use formation::config::{GroupCounts, SceneConfig};
use formation::generators::{foliage, gift_ring, scene_rng, spiral_band, SpiralCone};
use formation::input::{DetectedHand, Gesture, Handedness, Landmark, PoseFrame, INDEX_TIP};
use formation::particle::ParticleGroup;
use formation::persistence::{JsonDirPhotoStore, MemoryPhotoStore, PhotoRef, PhotoStore, StoreError, StoreId};
use formation::scene::Scene;
use formation::scene_state::{SceneState, TransitionSource};

fn small_config() -> SceneConfig {
    SceneConfig {
        seed: Some(2024),
        counts: GroupCounts {
            foliage: 500,
            gold_balls: 20,
            red_balls: 20,
            lights: 20,
            snowflakes: 10,
            gingerbread: 5,
            gift_boxes: 12,
            sparkles: 60,
            stars: 80,
            dust: 30,
            placeholder_photos: 20,
        },
        ..Default::default()
    }
}

fn hand(handedness: Handedness, gesture: Gesture) -> DetectedHand {
    let landmarks = vec![Landmark::new(0.5, 0.5); INDEX_TIP + 1];
    DetectedHand::new(handedness, gesture, landmarks)
}

#[test]
fn test_gesture_stream_scenario() {
    let mut scene = Scene::new(small_config());
    let transitions = scene.subscribe();
    let feed = scene.pose_feed();
    let dt = 1.0 / 60.0;

    feed.publish(PoseFrame::empty());
    scene.tick(dt);
    assert!(!scene.cursor().active);
    feed.publish(PoseFrame::empty());
    scene.tick(dt);
    assert!(!scene.cursor().active);
    assert_eq!(scene.state(), SceneState::Chaos);

    feed.publish(PoseFrame::with_hands(vec![hand(Handedness::Left, Gesture::OpenPalm)]));
    scene.tick(dt);
    assert!(scene.cursor().active);
    assert_eq!(scene.state(), SceneState::Chaos);

    feed.publish(PoseFrame::with_hands(vec![hand(Handedness::Right, Gesture::ClosedFist)]));
    scene.tick(dt);
    assert_eq!(scene.state(), SceneState::Formed);

    // Only the last frame changed the state, and it was gesture-driven.
    let seen: Vec<_> = transitions.try_iter().collect();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].to, SceneState::Formed);
    assert_eq!(seen[0].source, TransitionSource::Gesture);
}

#[test]
fn test_missing_pose_frames_keep_last_state() {
    let mut scene = Scene::new(small_config());
    let feed = scene.pose_feed();
    feed.publish(PoseFrame::with_hands(vec![hand(Handedness::Left, Gesture::ClosedFist)]));
    scene.tick(1.0 / 60.0);
    assert_eq!(scene.state(), SceneState::Formed);
    assert!(scene.cursor().active);

    // Pipeline stops: no more frames arrive.
    feed.close();
    for _ in 0..10 {
        scene.tick(1.0 / 60.0);
    }
    assert_eq!(scene.state(), SceneState::Formed);
    assert!(scene.cursor().active);
}

#[test]
fn test_full_transition_settles_every_group() {
    let mut scene = Scene::new(small_config());
    scene.set_state(SceneState::Formed);
    for _ in 0..1200 {
        scene.tick(1.0 / 60.0);
    }
    for group in scene.groups() {
        assert!(group.progress() > 0.999, "{} did not settle", group.name());
    }

    scene.toggle_state();
    for _ in 0..1200 {
        scene.tick(1.0 / 60.0);
    }
    // Backdrop layers and the topper have no scattered arrangement.
    let fixed_layout = ["stars", "dust", "star_topper"];
    for group in scene.groups().filter(|g| !fixed_layout.contains(&g.name())) {
        assert!(group.progress() < 1e-3, "{} did not scatter", group.name());
    }
}

#[test]
fn test_generate_zero_scenario() {
    let mut rng = scene_rng(Some(0));
    let cone = SpiralCone::default();
    let body = foliage(0, &cone, &mut rng);
    assert!(body.formed.is_empty() && body.chaos.is_empty());
    let band = spiral_band(0, &cone, &mut rng);
    assert!(band.formed.is_empty() && band.chaos.is_empty());
    let (gifts, styles) = gift_ring(0, &Default::default(), &mut rng);
    assert!(gifts.is_empty() && styles.is_empty());

    let mut group = ParticleGroup::new(body, 1.5, SceneState::Chaos);
    group.advance(SceneState::Formed, 1.0 / 60.0);
    assert_eq!(group.count(), 0);
    assert!(group.rest_positions().is_empty());

    let mut config = small_config();
    config.counts = GroupCounts {
        foliage: 0,
        gold_balls: 0,
        red_balls: 0,
        lights: 0,
        snowflakes: 0,
        gingerbread: 0,
        gift_boxes: 0,
        sparkles: 0,
        stars: 0,
        dust: 0,
        placeholder_photos: 0,
    };
    let mut scene = Scene::new(config);
    scene.set_state(SceneState::Formed);
    let frame = scene.tick(1.0 / 60.0);
    assert_eq!(frame.group("foliage").map(|g| g.instances.len()), Some(0));
    assert_eq!(frame.group("decorations").map(|g| g.instances.len()), Some(0));
}

#[test]
fn test_save_load_scenario() {
    let photos = vec![PhotoRef::from("img1"), PhotoRef::from("img2")];
    let fixed = StoreId::parse("abc123xyz").expect("valid id");

    let mut memory = MemoryPhotoStore::new().with_ids([fixed.clone()]);
    assert_eq!(memory.save(&photos).unwrap(), fixed);
    assert_eq!(memory.load("abc123xyz").unwrap(), photos);
    assert!(matches!(memory.load("doesnotexist"), Err(StoreError::NotFound(_))));

    let dir = tempfile::tempdir().unwrap();
    let mut files = JsonDirPhotoStore::open(dir.path()).unwrap().with_ids([fixed.clone()]);
    assert_eq!(files.save(&photos).unwrap(), fixed);
    assert_eq!(files.load("abc123xyz").unwrap(), photos);
    assert!(matches!(files.load("doesnotexist"), Err(StoreError::NotFound(_))));

    // A loaded list sizes the photo decorations.
    let mut scene = Scene::new(small_config());
    scene.set_photos(files.load("abc123xyz").unwrap());
    let frame = scene.tick(1.0 / 60.0);
    let decorations = frame.group("decorations").expect("decorations present");
    assert_eq!(decorations.instances.len(), 2);
    let textures = decorations.textures.as_ref().expect("decorations carry textures");
    assert_eq!(textures[1].as_ref(), Some(&photos[1]));
}
