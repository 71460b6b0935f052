//! # Saga Animation
//!
//! Real-time keyframe animation blending for the Saga engine.
//!
//! Any number of [`AnimationAction`]s can play concurrently against one
//! object graph; contributions targeting the same property are blended
//! through shared, reference-counted [`animation::PropertyMixer`]s so
//! each live property is written exactly once per frame.
//!
//! ```rust,ignore
//! use saga_animation::{AnimationMixer, Scene};
//!
//! let mut mixer = AnimationMixer::new();
//! let walk = mixer.clip_action(&walk_clip, root, &scene);
//! mixer.play(walk);
//!
//! // once per frame:
//! mixer.update(dt, &mut scene);
//! for event in mixer.take_events() { /* loop / finished */ }
//! ```

pub mod animation;
pub mod errors;
pub mod scene;

pub use animation::{
    ActionHandle, AnimValue, AnimationAction, AnimationClip, AnimationEvent, AnimationMixer,
    BlendMode, InterpolationMode, KeyframeTrack, LoopMode, PropertyBinding, TrackPath,
};
pub use errors::AnimationError;
pub use scene::{Material, Node, NodeHandle, Scene, Skeleton, Transform};
