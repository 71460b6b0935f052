use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::clip::AnimationClip;
use crate::animation::mixer::{ActionHandle, AnimationEvent, PropertyMixerHandle};
use crate::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use crate::scene::NodeHandle;

/// What happens when an action's local time runs past the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Play through once and finish at the boundary.
    Once,
    /// Wrap modulo the clip duration, counting repetitions.
    Repeat,
    /// Like `Repeat`, but alternate direction every cycle.
    PingPong,
}

/// A two-point linear schedule over global mixer time, driving either an
/// action's weight (fading) or its time scale (warping).
#[derive(Debug, Clone)]
pub(crate) struct ControlCurve {
    track: KeyframeTrack<f32>,
    cursor: KeyframeCursor,
}

impl ControlCurve {
    fn new(start_time: f32, start_value: f32, end_time: f32, end_value: f32) -> Self {
        Self {
            track: KeyframeTrack::new(
                vec![start_time, end_time],
                vec![start_value, end_value],
                InterpolationMode::Linear,
            ),
            cursor: KeyframeCursor::default(),
        }
    }

    fn sample(&mut self, time: f32) -> f32 {
        self.track
            .sample_with_cursor(time, &mut self.cursor)
            .unwrap_or(1.0)
    }

    fn end_time(&self) -> f32 {
        self.track.end_time()
    }
}

/// One playing instance of a clip against one target root.
///
/// Owns all per-instance playback state: the local time cursor, loop
/// mode and repetition budget, weight (with an optional fade schedule),
/// time scale (with an optional warp schedule), and the per-track search
/// cursors. The clip itself stays shared and immutable.
///
/// Actions are created through
/// [`AnimationMixer::clip_action`](crate::animation::mixer::AnimationMixer::clip_action)
/// and driven by the mixer; verbs that depend on mixer state (play,
/// stop, fading, warping) live on the mixer and take the action's
/// handle.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    pub(crate) clip: Arc<AnimationClip>,
    pub(crate) root: NodeHandle,

    /// Local clip time, in seconds.
    pub time: f32,
    /// Playback speed multiplier; negative plays in reverse.
    pub time_scale: f32,
    /// Blend weight before fading is applied.
    pub weight: f32,
    pub loop_mode: LoopMode,
    /// Allowed repetitions for `Repeat`/`PingPong`; `None` is unbounded.
    pub repetitions: Option<u32>,
    /// On finish, hold the boundary pose (paused) instead of disabling.
    pub clamp_when_finished: bool,
    pub paused: bool,
    pub enabled: bool,

    /// Scheduled start in global mixer time; the action idles until then.
    pub(crate) start_time: Option<f32>,
    /// Completed wraps since play; -1 until the first time update.
    loop_count: i32,

    effective_time_scale: f32,
    effective_weight: f32,
    fade: Option<ControlCurve>,
    warp: Option<ControlCurve>,

    pub(crate) cursors: Vec<KeyframeCursor>,
    /// Property mixer per track, parallel to `clip.tracks`.
    pub(crate) mixer_slots: SmallVec<[PropertyMixerHandle; 8]>,
}

impl AnimationAction {
    #[must_use]
    pub(crate) fn new(clip: Arc<AnimationClip>, root: NodeHandle) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            root,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            repetitions: None,
            clamp_when_finished: false,
            paused: false,
            enabled: true,
            start_time: None,
            loop_count: -1,
            effective_time_scale: 1.0,
            effective_weight: 1.0,
            fade: None,
            warp: None,
            cursors: vec![KeyframeCursor::default(); track_count],
            mixer_slots: SmallVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Sets the loop mode and the repetition budget (`None` = forever).
    pub fn set_loop(&mut self, mode: LoopMode, repetitions: Option<u32>) {
        self.loop_mode = mode;
        self.repetitions = repetitions;
    }

    /// Defers the start until the given global mixer time.
    pub fn start_at(&mut self, global_time: f32) {
        self.start_time = Some(global_time);
    }

    /// Sets the base weight directly, cancelling any fade in flight.
    pub fn set_effective_weight(&mut self, weight: f32) {
        self.weight = weight;
        self.effective_weight = weight;
        self.stop_fading();
    }

    /// The weight actually applied last frame (base × fade).
    #[inline]
    #[must_use]
    pub fn get_effective_weight(&self) -> f32 {
        self.effective_weight
    }

    /// Sets the time scale directly, cancelling any warp in flight.
    pub fn set_effective_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
        self.effective_time_scale = time_scale;
        self.stop_warping();
    }

    /// The time scale actually applied last frame (base × warp).
    #[inline]
    #[must_use]
    pub fn get_effective_time_scale(&self) -> f32 {
        self.effective_time_scale
    }

    /// Retimes playback so one pass takes `duration` seconds.
    pub fn set_duration(&mut self, duration: f32) {
        if duration > 0.0 && self.clip.duration > 0.0 {
            self.time_scale = self.clip.duration / duration;
            self.stop_warping();
        }
    }

    pub fn stop_fading(&mut self) {
        self.fade = None;
    }

    pub fn stop_warping(&mut self) {
        self.warp = None;
    }

    /// Whether a deferred start is still pending.
    #[inline]
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.start_time.is_some()
    }

    // ========================================================================
    // Mixer-driven internals
    // ========================================================================

    /// Back to the initial playback state; bindings stay resolved.
    pub(crate) fn reset_state(&mut self) {
        self.time = 0.0;
        self.loop_count = -1;
        self.start_time = None;
        self.paused = false;
        self.enabled = true;
        self.fade = None;
        self.warp = None;
        for cursor in &mut self.cursors {
            cursor.last_index = 0;
        }
    }

    pub(crate) fn schedule_fade(&mut self, now: f32, duration: f32, from: f32, to: f32) {
        self.fade = Some(ControlCurve::new(now, from, now + duration, to));
    }

    pub(crate) fn schedule_warp(
        &mut self,
        now: f32,
        duration: f32,
        start_scale: f32,
        end_scale: f32,
    ) {
        self.warp = Some(ControlCurve::new(now, start_scale, now + duration, end_scale));
    }

    /// Resolves the frame's time scale, consuming the warp schedule once
    /// its window has elapsed.
    pub(crate) fn consume_time_scale(&mut self, global_time: f32) -> f32 {
        let mut time_scale = 0.0;
        if !self.paused {
            time_scale = self.time_scale;
            if let Some(warp) = &mut self.warp {
                let factor = warp.sample(global_time);
                time_scale *= factor;
                if global_time > warp.end_time() {
                    self.warp = None;
                    if time_scale == 0.0 {
                        // Warped to a standstill.
                        self.paused = true;
                    } else {
                        // Warp done: the end scale becomes the base scale.
                        self.time_scale = time_scale;
                    }
                }
            }
        }
        self.effective_time_scale = time_scale;
        time_scale
    }

    /// Resolves the frame's weight, consuming the fade schedule once its
    /// window has elapsed. A completed fade to zero disables the action.
    pub(crate) fn consume_weight(&mut self, global_time: f32) -> f32 {
        let mut weight = 0.0;
        if self.enabled {
            weight = self.weight;
            if let Some(fade) = &mut self.fade {
                let factor = fade.sample(global_time);
                weight *= factor;
                if global_time > fade.end_time() {
                    self.fade = None;
                    if factor == 0.0 {
                        self.enabled = false;
                    }
                }
            }
        }
        self.effective_weight = weight;
        weight
    }

    /// Advances the local time by `delta` (already time-scaled), applying
    /// the loop mode, and returns the time to sample the tracks at.
    ///
    /// `Repeat`/`PingPong` wraps fire a [`AnimationEvent::Loop`] per
    /// crossing; running out of the repetition budget (or reaching the
    /// boundary under `Once`) fires [`AnimationEvent::Finished`] and
    /// either pauses on the boundary pose (`clamp_when_finished`) or
    /// disables the action.
    pub(crate) fn advance_time(
        &mut self,
        delta: f32,
        handle: ActionHandle,
        events: &mut Vec<AnimationEvent>,
    ) -> f32 {
        let duration = self.clip.duration;
        if duration <= 0.0 {
            return 0.0;
        }

        let ping_pong = self.loop_mode == LoopMode::PingPong;
        let mut time = self.time + delta;

        if delta == 0.0 {
            if self.loop_count == -1 {
                return time;
            }
            return if ping_pong && (self.loop_count & 1) == 1 {
                duration - time
            } else {
                time
            };
        }

        if self.loop_mode == LoopMode::Once {
            if self.loop_count == -1 {
                self.loop_count = 0;
            }

            if time >= duration {
                time = duration;
            } else if time < 0.0 {
                time = 0.0;
            } else {
                self.time = time;
                return time;
            }

            if self.clamp_when_finished {
                self.paused = true;
            } else {
                self.enabled = false;
            }
            self.time = time;
            events.push(AnimationEvent::Finished {
                action: handle,
                direction: if delta < 0.0 { -1 } else { 1 },
            });
            return time;
        }

        // Repeat / PingPong
        if self.loop_count == -1 {
            self.loop_count = 0;
        }

        if time >= duration || time < 0.0 {
            let loop_delta = (time / duration).floor() as i32;
            time -= duration * loop_delta as f32;
            self.loop_count += loop_delta.abs();

            let exhausted = self
                .repetitions
                .is_some_and(|reps| self.loop_count as u32 >= reps);

            if exhausted {
                if self.clamp_when_finished {
                    self.paused = true;
                } else {
                    self.enabled = false;
                }
                time = if delta > 0.0 { duration } else { 0.0 };
                self.time = time;
                events.push(AnimationEvent::Finished {
                    action: handle,
                    direction: if delta > 0.0 { 1 } else { -1 },
                });
            } else {
                self.time = time;
                events.push(AnimationEvent::Loop {
                    action: handle,
                    loop_delta,
                });
            }
        } else {
            self.time = time;
        }

        if ping_pong && (self.loop_count & 1) == 1 {
            return duration - time;
        }
        time
    }
}
