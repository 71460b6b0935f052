//! Track & Clip Tests
//!
//! Tests for:
//! - KeyframeTrack step/linear/smooth/cubic-spline sampling
//! - Clamped (non-extrapolating) edge behavior
//! - KeyframeCursor O(1) sequential access and binary-search fallback
//! - validate / optimize / trim
//! - AnimationClip duration handling and the serialized record form

use std::f32::consts::PI;

use glam::{Quat, Vec3};

use saga_animation::animation::binding::TrackPath;
use saga_animation::animation::clip::{AnimationClip, BlendMode, Track, TrackData};
use saga_animation::animation::tracks::{
    InterpolationMode, KeyframeCursor, KeyframeTrack, SmoothEnding,
};
use saga_animation::animation::values::{AnimValue, Interpolatable, MorphWeights};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Linear interpolation
// ============================================================================

#[test]
fn linear_midpoint() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    let val = track.sample(0.5).unwrap();
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn linear_exact_keyframes() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );
    assert!(approx(track.sample(0.0).unwrap(), 0.0));
    assert!(approx(track.sample(1.0).unwrap(), 10.0));
    assert!(approx(track.sample(2.0).unwrap(), 20.0));
}

#[test]
fn linear_clamps_beyond_range() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    // Clamped, not extrapolated
    assert!(approx(track.sample(5.0).unwrap(), 10.0));
    assert!(approx(track.sample(-5.0).unwrap(), 0.0));
}

#[test]
fn linear_before_first_returns_first() {
    let track = KeyframeTrack::new(
        vec![1.0, 2.0],
        vec![10.0_f32, 20.0],
        InterpolationMode::Linear,
    );
    assert!(approx(track.sample(0.5).unwrap(), 10.0));
}

#[test]
fn linear_vec3() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)],
        InterpolationMode::Linear,
    );
    let val = track.sample(0.5).unwrap();
    assert!(approx(val.x, 5.0));
    assert!(approx(val.y, 10.0));
    assert!(approx(val.z, 15.0));
}

#[test]
fn linear_quat_is_slerp() {
    let q0 = Quat::IDENTITY;
    let q1 = Quat::from_rotation_y(PI);
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![q0, q1], InterpolationMode::Linear);

    let val = track.sample(0.5).unwrap();
    let expected = q0.slerp(q1, 0.5);
    let angle = val.angle_between(expected);
    assert!(angle < 0.01, "Quaternion slerp mismatch: angle={angle}");
}

#[test]
fn empty_track_returns_none() {
    let track: KeyframeTrack<f32> = KeyframeTrack::new(vec![], vec![], InterpolationMode::Linear);
    assert!(track.sample(0.0).is_none());
    let mut cursor = KeyframeCursor::default();
    assert!(track.sample_with_cursor(0.0, &mut cursor).is_none());
}

// ============================================================================
// Step interpolation
// ============================================================================

#[test]
fn step_holds_left_sample() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );
    assert!(approx(track.sample(0.0).unwrap(), 0.0));
    assert!(approx(track.sample(0.99).unwrap(), 0.0));
    assert!(approx(track.sample(1.0).unwrap(), 100.0));
    assert!(approx(track.sample(1.5).unwrap(), 100.0));
    assert!(approx(track.sample(2.5).unwrap(), 200.0));
}

// ============================================================================
// Smooth interpolation (estimated tangents)
// ============================================================================

#[test]
fn smooth_hits_keyframes_exactly() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 4.0],
        InterpolationMode::Smooth,
    );
    assert!(approx(track.sample(0.0).unwrap(), 0.0));
    assert!(approx(track.sample(1.0).unwrap(), 10.0));
    assert!(approx(track.sample(2.0).unwrap(), 4.0));
}

#[test]
fn smooth_two_keys_clamped_matches_linear() {
    // With one-sided tangents over a single interval, the Hermite blend
    // degenerates to the straight line.
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Smooth,
    );
    assert!(approx(track.sample(0.5).unwrap(), 5.0));
    assert!(approx(track.sample(0.25).unwrap(), 2.5));
}

#[test]
fn smooth_zero_slope_eases_at_ends() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Smooth,
    )
    .with_ending(SmoothEnding::ZeroSlope);

    // Symmetric basis: midpoint unchanged, quarter point below the line.
    assert!(approx(track.sample(0.5).unwrap(), 5.0));
    let quarter = track.sample(0.25).unwrap();
    assert!(
        quarter < 2.5 && quarter > 0.0,
        "expected ease-in below the linear value, got {quarter}"
    );
}

#[test]
fn smooth_never_produces_nan_on_duplicate_times() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0, 30.0],
        InterpolationMode::Smooth,
    );
    for i in 0..=20 {
        let t = i as f32 * 0.1;
        let val = track.sample(t).unwrap();
        assert!(val.is_finite(), "t={t}: non-finite sample {val}");
    }
}

// ============================================================================
// Cubic spline interpolation (explicit tangents)
// ============================================================================

#[test]
fn cubic_spline_endpoints_exact() {
    // values = [in_tangent, value, out_tangent] per keyframe
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![
            0.0_f32, 0.0, 1.0, // frame 0
            1.0, 10.0, 0.0, // frame 1
        ],
        InterpolationMode::CubicSpline,
    );
    assert!(approx(track.sample(0.0).unwrap(), 0.0));
    assert!(approx(track.sample(1.0).unwrap(), 10.0));
}

#[test]
fn cubic_spline_flat_tangent_midpoint() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![
            0.0_f32, 0.0, 0.0, // frame 0: zero tangents
            0.0, 10.0, 0.0, // frame 1: zero tangents
        ],
        InterpolationMode::CubicSpline,
    );
    let val = track.sample(0.5).unwrap();
    assert!(approx(val, 5.0), "expected 5.0, got {val}");
}

// ============================================================================
// Cursor behavior
// ============================================================================

#[test]
fn cursor_sequential_forward() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 20.0, 30.0, 40.0],
        InterpolationMode::Linear,
    );
    let mut cursor = KeyframeCursor::default();
    for i in 0..=20 {
        let t = i as f32 * 0.2;
        let val = track.sample_with_cursor(t, &mut cursor).unwrap();
        let expected = t * 10.0;
        assert!(approx(val, expected), "t={t}: expected {expected}, got {val}");
    }
}

#[test]
fn cursor_forward_then_jump_back() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0_f32, 10.0, 20.0, 30.0],
        InterpolationMode::Linear,
    );
    let mut cursor = KeyframeCursor::default();

    assert!(approx(track.sample_with_cursor(2.5, &mut cursor).unwrap(), 25.0));
    // Large jump back: binary-search fallback
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor).unwrap(), 5.0));
}

#[test]
fn cursor_matches_stateless_sampling() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 5.0, 20.0, 15.0],
        InterpolationMode::Linear,
    );
    for i in 0..=40 {
        let t = i as f32 * 0.1;
        let mut cursor = KeyframeCursor::default();
        let with_cursor = track.sample_with_cursor(t, &mut cursor).unwrap();
        let stateless = track.sample(t).unwrap();
        assert!(
            approx(with_cursor, stateless),
            "t={t}: cursor={with_cursor} stateless={stateless}"
        );
    }
}

#[test]
fn cursor_single_keyframe() {
    let track = KeyframeTrack::new(vec![0.0], vec![42.0_f32], InterpolationMode::Linear);
    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(5.0, &mut cursor).unwrap(), 42.0));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn validate_accepts_well_formed() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 1.0, 2.0],
        vec![0.0_f32, 1.0, 2.0, 3.0],
        InterpolationMode::Linear,
    );
    assert!(track.validate().is_ok());
}

#[test]
fn validate_rejects_decreasing_times() {
    let track = KeyframeTrack::new(
        vec![0.0, 2.0, 1.0],
        vec![0.0_f32, 1.0, 2.0],
        InterpolationMode::Linear,
    );
    assert!(track.validate().is_err());
}

#[test]
fn validate_rejects_nan_values() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, f32::NAN],
        InterpolationMode::Linear,
    );
    assert!(track.validate().is_err());
}

#[test]
fn validate_rejects_length_mismatch() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 1.0, 2.0],
        InterpolationMode::Linear,
    );
    assert!(track.validate().is_err());

    // CubicSpline needs 3 values per keyframe
    let spline = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 1.0, 2.0, 3.0],
        InterpolationMode::CubicSpline,
    );
    assert!(spline.validate().is_err());
}

#[test]
fn validate_rejects_empty() {
    let track: KeyframeTrack<f32> = KeyframeTrack::new(vec![], vec![], InterpolationMode::Linear);
    assert!(track.validate().is_err());
}

// ============================================================================
// Optimization
// ============================================================================

#[test]
fn optimize_drops_redundant_interior_keys() {
    let mut track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 5.0, 5.0, 5.0, 10.0],
        InterpolationMode::Linear,
    );
    track.optimize();
    assert_eq!(track.key_count(), 4, "middle of the flat run should go");
}

#[test]
fn optimize_preserves_sampling_at_original_keys() {
    let times = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    let values = vec![0.0_f32, 5.0, 5.0, 5.0, 10.0];
    let mut track = KeyframeTrack::new(times.clone(), values.clone(), InterpolationMode::Linear);
    track.optimize();

    for (t, v) in times.iter().zip(values.iter()) {
        let sampled = track.sample(*t).unwrap();
        assert!(
            approx(sampled, *v),
            "t={t}: optimized track gives {sampled}, original was {v}"
        );
    }
}

#[test]
fn optimize_collapses_duplicate_timestamps() {
    let mut track = KeyframeTrack::new(
        vec![0.0, 1.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0, 30.0],
        InterpolationMode::Linear,
    );
    track.optimize();
    assert_eq!(track.key_count(), 3);
    assert!(approx(track.sample(1.0).unwrap(), 10.0));
}

// ============================================================================
// Trimming
// ============================================================================

#[test]
fn trim_resamples_boundaries_and_rebases() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );
    let trimmed = track.trim(0.5, 1.5).unwrap();

    assert!(approx(trimmed.start_time(), 0.0));
    assert!(approx(trimmed.end_time(), 1.0));
    assert!(approx(trimmed.sample(0.0).unwrap(), 5.0));
    assert!(approx(trimmed.sample(0.5).unwrap(), 10.0));
    assert!(approx(trimmed.sample(1.0).unwrap(), 15.0));
}

#[test]
fn trim_rejects_inverted_window() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    assert!(track.trim(1.5, 0.5).is_err());
}

// ============================================================================
// Interpolatable values
// ============================================================================

#[test]
fn morph_weights_linear() {
    let a = MorphWeights::from_slice(&[0.0, 1.0, 0.5, 0.0]);
    let b = MorphWeights::from_slice(&[1.0, 0.0, 0.5, 1.0]);
    let result = MorphWeights::interpolate_linear(&a, &b, 0.5);
    for (i, expected) in [0.5, 0.5, 0.5, 0.5].iter().enumerate() {
        assert!(approx(result.weights[i], *expected));
    }
}

#[test]
fn anim_value_mix_mismatch_is_dropped() {
    let mut a = AnimValue::Scalar(1.0);
    a.mix(&AnimValue::Vector3(Vec3::ONE), 0.5);
    assert_eq!(a, AnimValue::Scalar(1.0));
}

#[test]
fn anim_value_quat_additive_composes() {
    let half_turn = Quat::from_rotation_y(PI * 0.5);
    let mut base = AnimValue::Quaternion(Quat::IDENTITY);
    base.add_scaled(&AnimValue::Quaternion(half_turn), 1.0);
    let AnimValue::Quaternion(q) = base else {
        panic!("kind changed");
    };
    assert!(q.angle_between(half_turn) < 1e-4);
}

// ============================================================================
// AnimationClip
// ============================================================================

fn position_track(node: &str, times: Vec<f32>, xs: &[f32]) -> Track {
    Track::new(
        TrackPath::new(node, "position"),
        TrackData::Vector3(KeyframeTrack::new(
            times,
            xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect(),
            InterpolationMode::Linear,
        )),
    )
}

#[test]
fn clip_duration_is_max_track_end() {
    let clip = AnimationClip::new(
        "test",
        vec![
            position_track("a", vec![0.0, 1.5], &[0.0, 1.0]),
            Track::new(
                TrackPath::new("b", "rotation"),
                TrackData::Quaternion(KeyframeTrack::new(
                    vec![0.0, 3.0],
                    vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)],
                    InterpolationMode::Linear,
                )),
            ),
        ],
    );
    assert!(approx(clip.duration, 3.0));
}

#[test]
fn clip_empty_tracks_zero_duration() {
    let clip = AnimationClip::new("empty", vec![]);
    assert!(approx(clip.duration, 0.0));
}

#[test]
fn clip_explicit_duration_override() {
    let clip =
        AnimationClip::new("held", vec![position_track("a", vec![0.0, 1.0], &[0.0, 1.0])])
            .with_duration(4.0);
    assert!(approx(clip.duration, 4.0));
}

#[test]
fn clip_validate_reports_bad_track() {
    let clip = AnimationClip::new(
        "bad",
        vec![Track::new(
            TrackPath::new("a", "position"),
            TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, 2.0, 1.0],
                vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                InterpolationMode::Linear,
            )),
        )],
    );
    assert!(clip.validate().is_err());
}

#[test]
fn clip_trim_rebases_duration() {
    let clip = AnimationClip::new(
        "walk",
        vec![position_track("a", vec![0.0, 1.0, 2.0], &[0.0, 10.0, 20.0])],
    );
    let trimmed = clip.trim(0.5, 1.5).unwrap();
    assert!(approx(trimmed.duration, 1.0));
    assert_ne!(trimmed.id, clip.id);
}

// ============================================================================
// Serialized records
// ============================================================================

#[test]
fn record_round_trip_preserves_samples() {
    let clip = AnimationClip::new(
        "walk",
        vec![
            position_track("Hips", vec![0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]),
            Track::new(
                TrackPath::new("Hips", "rotation"),
                TrackData::Quaternion(KeyframeTrack::new(
                    vec![0.0, 2.0],
                    vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)],
                    InterpolationMode::Linear,
                )),
            ),
        ],
    );

    let json = clip.to_json().unwrap();
    let restored = AnimationClip::from_json(&json).unwrap();

    assert_eq!(restored.name, "walk");
    assert!(approx(restored.duration, 2.0));
    assert_eq!(restored.tracks.len(), 2);
    assert_eq!(restored.tracks[0].path, clip.tracks[0].path);

    for i in 0..=20 {
        let t = i as f32 * 0.1;
        let (TrackData::Vector3(a), TrackData::Vector3(b)) =
            (&clip.tracks[0].data, &restored.tracks[0].data)
        else {
            panic!("track kind changed in round trip");
        };
        let (va, vb) = (a.sample(t).unwrap(), b.sample(t).unwrap());
        assert!(approx(va.x, vb.x), "t={t}: {} != {}", va.x, vb.x);
    }
}

#[test]
fn record_unknown_interpolation_falls_back_to_linear() {
    let clip = AnimationClip::new(
        "fallback",
        vec![position_track("a", vec![0.0, 1.0], &[0.0, 1.0])],
    );
    let mut record = clip.to_record();
    record.tracks[0].interpolation = "bezier".to_string();

    let restored = AnimationClip::from_record(&record).unwrap();
    assert_eq!(
        restored.tracks[0].data.interpolation(),
        InterpolationMode::Linear
    );
}

#[test]
fn record_rejects_bad_value_count() {
    let clip = AnimationClip::new(
        "broken",
        vec![position_track("a", vec![0.0, 1.0], &[0.0, 1.0])],
    );
    let mut record = clip.to_record();
    record.tracks[0].values.pop();
    assert!(AnimationClip::from_record(&record).is_err());
}

#[test]
fn record_preserves_blend_mode() {
    let clip = AnimationClip::new(
        "layer",
        vec![position_track("a", vec![0.0, 1.0], &[0.0, 1.0])],
    )
    .with_blend_mode(BlendMode::Additive);

    let restored = AnimationClip::from_record(&clip.to_record()).unwrap();
    assert_eq!(restored.blend_mode, BlendMode::Additive);
}
