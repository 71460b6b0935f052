//! Crossfade demo: plays an "idle" sway, then crossfades to a "wave"
//! bounce on the same node, printing the blended position each frame.
//!
//! Run with `cargo run --example crossfade` (set `RUST_LOG=debug` for
//! binding diagnostics).

use std::sync::Arc;

use glam::Vec3;

use saga_animation::animation::binding::TrackPath;
use saga_animation::animation::clip::{AnimationClip, Track, TrackData};
use saga_animation::animation::tracks::{InterpolationMode, KeyframeTrack};
use saga_animation::{AnimationMixer, Node, Scene};

fn position_clip(name: &str, times: Vec<f32>, xs: &[f32]) -> Arc<AnimationClip> {
    Arc::new(AnimationClip::new(
        name,
        vec![Track::new(
            TrackPath::new("Arm", "position"),
            TrackData::Vector3(KeyframeTrack::new(
                times,
                xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect(),
                InterpolationMode::Linear,
            )),
        )],
    ))
}

fn main() {
    env_logger::init();

    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Figure"));
    let arm = scene.add_to_parent(Node::new("Arm"), root);

    let idle = position_clip("idle", vec![0.0, 1.0, 2.0], &[0.0, 0.2, 0.0]);
    let wave = position_clip("wave", vec![0.0, 0.5, 1.0], &[0.0, 1.0, 0.0]);

    let mut mixer = AnimationMixer::new();
    let idle_action = mixer.clip_action(&idle, root, &scene);
    let wave_action = mixer.clip_action(&wave, root, &scene);
    mixer.play(idle_action);

    let dt = 0.1;
    for frame in 0..60 {
        if frame == 20 {
            println!("-- crossfading idle -> wave over 1s --");
            mixer.play(wave_action);
            mixer.cross_fade(idle_action, wave_action, 1.0, true);
        }

        mixer.update(dt, &mut scene);
        scene.update_local_matrices();

        for event in mixer.take_events() {
            println!("   event: {event:?}");
        }

        let x = scene.get_node(arm).unwrap().transform.position.x;
        println!("t={:4.1}s  arm.x = {x:+.3}", mixer.time());
    }
}
