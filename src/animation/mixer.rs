use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::{Key, SecondaryMap, SlotMap, new_key_type};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::animation::action::AnimationAction;
use crate::animation::binding::{PropertyBinding, TrackPath};
use crate::animation::blending::PropertyMixer;
use crate::animation::clip::{AnimationClip, BlendMode};
use crate::scene::{NodeHandle, Scene};

new_key_type! {
    /// Handle to an [`AnimationAction`] owned by a mixer.
    pub struct ActionHandle;
    /// Handle to a [`PropertyMixer`] owned by a mixer.
    pub struct PropertyMixerHandle;
}

/// Playback notifications, collected per [`AnimationMixer::update`] call
/// and drained by the caller — no re-entrant callbacks during the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    /// A `Repeat`/`PingPong` action crossed the clip boundary.
    Loop {
        action: ActionHandle,
        /// Signed number of wraps this frame (negative in reverse).
        loop_delta: i32,
    },
    /// A non-repeating action completed, or a repetition budget ran out.
    Finished {
        action: ActionHandle,
        /// +1 forward, -1 reverse.
        direction: i32,
    },
}

/// Active/inactive partition over a set of slotmap keys.
///
/// Implemented as an order array with an active cursor: the first
/// `active` entries are the active set. Activation swaps an entry to the
/// boundary and grows the cursor, deactivation swaps it back and shrinks
/// it — O(1) both ways, and per-frame iteration never touches disabled
/// entries.
#[derive(Debug)]
struct ActivePartition<K: Key> {
    order: Vec<K>,
    slot: SecondaryMap<K, usize>,
    active: usize,
}

impl<K: Key> ActivePartition<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            slot: SecondaryMap::new(),
            active: 0,
        }
    }

    /// Registers a key in the inactive region.
    fn insert(&mut self, key: K) {
        self.slot.insert(key, self.order.len());
        self.order.push(key);
    }

    /// Unregisters a key entirely (deactivating it first).
    fn remove(&mut self, key: K) {
        self.deactivate(key);
        let Some(&idx) = self.slot.get(key) else {
            return;
        };
        let last = self.order.len() - 1;
        self.order.swap(idx, last);
        self.order.pop();
        if idx < self.order.len() {
            let moved = self.order[idx];
            self.slot.insert(moved, idx);
        }
        self.slot.remove(key);
    }

    /// Moves a key into the active region. Returns false if unknown or
    /// already active.
    fn activate(&mut self, key: K) -> bool {
        let Some(&idx) = self.slot.get(key) else {
            return false;
        };
        if idx < self.active {
            return false;
        }
        let boundary = self.active;
        if idx != boundary {
            self.order.swap(idx, boundary);
            let other = self.order[idx];
            self.slot.insert(key, boundary);
            self.slot.insert(other, idx);
        }
        self.active += 1;
        true
    }

    /// Moves a key out of the active region. Returns false if unknown or
    /// already inactive.
    fn deactivate(&mut self, key: K) -> bool {
        let Some(&idx) = self.slot.get(key) else {
            return false;
        };
        if idx >= self.active {
            return false;
        }
        let boundary = self.active - 1;
        if idx != boundary {
            self.order.swap(idx, boundary);
            let other = self.order[idx];
            self.slot.insert(key, boundary);
            self.slot.insert(other, idx);
        }
        self.active -= 1;
        true
    }

    fn is_active(&self, key: K) -> bool {
        self.slot.get(key).is_some_and(|&idx| idx < self.active)
    }

    #[inline]
    fn active_count(&self) -> usize {
        self.active
    }

    #[inline]
    fn active(&self) -> &[K] {
        &self.order[..self.active]
    }
}

/// The global animation scheduler for one object graph.
///
/// Owns every action and a deduplicated, reference-counted pool of
/// [`PropertyMixer`]s keyed by (root, path): however many actions animate
/// the same property, there is exactly one blend buffer and exactly one
/// write per frame.
///
/// [`AnimationMixer::update`] runs the frame in two phases:
/// 1. every active action advances its clock and *accumulates* its
///    track samples into the shared property mixers;
/// 2. every active property mixer composes its accumulated result and
///    *applies* it to the bound property.
pub struct AnimationMixer {
    time: f32,
    /// Global playback speed; scales every `update` delta.
    pub time_scale: f32,

    actions: SlotMap<ActionHandle, AnimationAction>,
    action_partition: ActivePartition<ActionHandle>,
    /// (clip id, root) → action, so `clip_action` is idempotent.
    action_cache: FxHashMap<(Uuid, NodeHandle), ActionHandle>,

    prop_mixers: SlotMap<PropertyMixerHandle, PropertyMixer>,
    mixer_partition: ActivePartition<PropertyMixerHandle>,
    /// (root, path) → property mixer, the shared-binding cache.
    binding_cache: FxHashMap<(NodeHandle, TrackPath), PropertyMixerHandle>,

    events: Vec<AnimationEvent>,
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            time_scale: 1.0,
            actions: SlotMap::with_key(),
            action_partition: ActivePartition::new(),
            action_cache: FxHashMap::default(),
            prop_mixers: SlotMap::with_key(),
            mixer_partition: ActivePartition::new(),
            binding_cache: FxHashMap::default(),
            events: Vec::new(),
        }
    }

    /// Global mixer time, in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    // ========================================================================
    // Action management
    // ========================================================================

    /// Returns the action for (clip, root), creating and binding it on
    /// first use. Path resolution is shared: a property already bound by
    /// a sibling action reuses the cached binding instead of resolving
    /// again.
    pub fn clip_action(
        &mut self,
        clip: &Arc<AnimationClip>,
        root: NodeHandle,
        scene: &Scene,
    ) -> ActionHandle {
        if let Some(&handle) = self.action_cache.get(&(clip.id, root)) {
            return handle;
        }

        let mut action = AnimationAction::new(clip.clone(), root);
        for track in &clip.tracks {
            let key = (root, track.path.clone());
            let slot = match self.binding_cache.get(&key) {
                Some(&existing) => {
                    self.prop_mixers[existing].ref_count += 1;
                    existing
                }
                None => {
                    let binding = PropertyBinding::bind(scene, root, &track.path);
                    let mut mixer = PropertyMixer::new(binding, key.clone());
                    mixer.ref_count = 1;
                    let handle = self.prop_mixers.insert(mixer);
                    self.mixer_partition.insert(handle);
                    self.binding_cache.insert(key, handle);
                    handle
                }
            };
            action.mixer_slots.push(slot);
        }

        let handle = self.actions.insert(action);
        self.action_partition.insert(handle);
        self.action_cache.insert((clip.id, root), handle);
        handle
    }

    /// The cached action for (clip, root), if one exists.
    #[must_use]
    pub fn existing_action(&self, clip: &AnimationClip, root: NodeHandle) -> Option<ActionHandle> {
        self.action_cache.get(&(clip.id, root)).copied()
    }

    #[inline]
    #[must_use]
    pub fn action(&self, handle: ActionHandle) -> Option<&AnimationAction> {
        self.actions.get(handle)
    }

    #[inline]
    pub fn action_mut(&mut self, handle: ActionHandle) -> Option<&mut AnimationAction> {
        self.actions.get_mut(handle)
    }

    /// Starts (or resumes) an action: idle → running.
    pub fn play(&mut self, handle: ActionHandle) {
        let Some(action) = self.actions.get_mut(handle) else {
            return;
        };
        action.enabled = true;
        action.paused = false;
        self.activate_action(handle);
    }

    /// Stops an action immediately: any state → idle, local time back to
    /// zero. If this was the property's last animator, the property
    /// returns to its pre-animation value.
    pub fn stop(&mut self, handle: ActionHandle, scene: &mut Scene) {
        self.deactivate_action(handle, scene);
        if let Some(action) = self.actions.get_mut(handle) {
            action.reset_state();
        }
    }

    /// Rewinds an action without changing its active status.
    pub fn reset(&mut self, handle: ActionHandle) {
        if let Some(action) = self.actions.get_mut(handle) {
            action.reset_state();
        }
    }

    /// Stops every active action.
    pub fn stop_all_actions(&mut self, scene: &mut Scene) {
        let active: Vec<ActionHandle> = self.action_partition.active().to_vec();
        for handle in active {
            self.stop(handle, scene);
        }
    }

    /// Whether the action is active and its clock is moving.
    #[must_use]
    pub fn is_action_running(&self, handle: ActionHandle) -> bool {
        self.action_partition.is_active(handle)
            && self.actions.get(handle).is_some_and(|a| {
                a.enabled && !a.paused && a.time_scale != 0.0 && a.start_time.is_none()
            })
    }

    // ========================================================================
    // Fading & warping
    // ========================================================================

    /// Ramps the action's weight 0 → 1 over `duration` seconds.
    pub fn fade_in(&mut self, handle: ActionHandle, duration: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(handle) {
            action.schedule_fade(now, duration, 0.0, 1.0);
        }
    }

    /// Ramps the action's weight 1 → 0 over `duration` seconds; the
    /// action disables itself when the fade completes.
    pub fn fade_out(&mut self, handle: ActionHandle, duration: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(handle) {
            action.schedule_fade(now, duration, 1.0, 0.0);
        }
    }

    /// Fades `from` out and `to` in over the same window. With
    /// `with_warp`, both actions also warp their time scales by the
    /// ratio of the clip durations, so clips of different native tempo
    /// stay in step across the transition.
    pub fn cross_fade(
        &mut self,
        from: ActionHandle,
        to: ActionHandle,
        duration: f32,
        with_warp: bool,
    ) {
        self.fade_out(from, duration);
        self.fade_in(to, duration);

        if with_warp {
            let Some(from_duration) = self.actions.get(from).map(|a| a.clip.duration) else {
                return;
            };
            let Some(to_duration) = self.actions.get(to).map(|a| a.clip.duration) else {
                return;
            };
            if from_duration > 0.0 && to_duration > 0.0 {
                self.warp(from, 1.0, from_duration / to_duration, duration);
                self.warp(to, to_duration / from_duration, 1.0, duration);
            }
        }
    }

    /// Schedules a time-scale ramp from `start_scale` to `end_scale`
    /// over `duration` seconds. The curve is relative to the action's
    /// base time scale, which absorbs the end value when the warp
    /// completes.
    pub fn warp(&mut self, handle: ActionHandle, start_scale: f32, end_scale: f32, duration: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(handle) {
            let base = if action.time_scale == 0.0 {
                1.0
            } else {
                action.time_scale
            };
            action.schedule_warp(now, duration, start_scale / base, end_scale / base);
        }
    }

    /// Decelerates the action to a standstill over `duration` seconds.
    pub fn halt(&mut self, handle: ActionHandle, duration: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(handle) {
            let current = action.get_effective_time_scale();
            action.time_scale = 1.0;
            action.schedule_warp(now, duration, current, 0.0);
        }
    }

    /// Copies `other`'s clock onto `handle` (tempo-matched hand-offs).
    pub fn sync_actions(&mut self, handle: ActionHandle, other: ActionHandle) {
        let Some((time, time_scale)) = self.actions.get(other).map(|a| (a.time, a.time_scale))
        else {
            return;
        };
        if let Some(action) = self.actions.get_mut(handle) {
            action.time = time;
            action.time_scale = time_scale;
            action.stop_warping();
        }
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advances the whole system by `dt` seconds (scaled by the global
    /// `time_scale`).
    ///
    /// Phase 1 gathers every active action's contribution; Phase 2
    /// writes each animated property exactly once. Actions that finished
    /// or faded out this frame are deactivated afterwards. Emitted
    /// events queue up until [`AnimationMixer::take_events`].
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        let dt = dt * self.time_scale;
        self.time += dt;
        let now = self.time;

        // === Phase 1: advance actions, accumulate samples ===
        for i in 0..self.action_partition.active_count() {
            let handle = self.action_partition.active()[i];
            let Some(action) = self.actions.get_mut(handle) else {
                continue;
            };

            let time_scale = action.consume_time_scale(now);
            let weight = action.consume_weight(now);

            let mut clip_delta = dt * time_scale;
            if let Some(start) = action.start_time {
                let running = now - start;
                if running < 0.0 || time_scale == 0.0 {
                    // Still scheduled.
                    clip_delta = 0.0;
                } else {
                    action.start_time = None;
                    clip_delta = running * time_scale;
                }
            }

            let sample_time = action.advance_time(clip_delta, handle, &mut self.events);
            if weight <= 0.0 {
                continue;
            }

            let clip = action.clip.clone();
            for (index, track) in clip.tracks.iter().enumerate() {
                let Some(&slot) = action.mixer_slots.get(index) else {
                    continue;
                };
                let Some(mixer) = self.prop_mixers.get_mut(slot) else {
                    continue;
                };
                if !mixer.is_bound() {
                    continue;
                }
                if mixer.needs_snapshot() {
                    mixer.save_original_state(scene);
                }
                let Some(cursor) = action.cursors.get_mut(index) else {
                    continue;
                };
                if let Some(value) = track.data.sample_with_cursor(sample_time, cursor) {
                    match clip.blend_mode {
                        BlendMode::Normal => mixer.accumulate(&value, weight),
                        BlendMode::Additive => mixer.accumulate_additive(&value, weight),
                    }
                }
            }
        }

        // === Phase 2: apply the composed results ===
        for i in 0..self.mixer_partition.active_count() {
            let handle = self.mixer_partition.active()[i];
            if let Some(mixer) = self.prop_mixers.get_mut(handle) {
                mixer.apply(scene);
            }
        }

        // Actions that finished or faded out leave the active set.
        let finished: SmallVec<[ActionHandle; 4]> = self
            .action_partition
            .active()
            .iter()
            .copied()
            .filter(|&h| self.actions.get(h).is_some_and(|a| !a.enabled))
            .collect();
        for handle in finished {
            self.deactivate_action(handle, scene);
        }
    }

    /// Rewinds the global clock and every action, then advances to
    /// `time` in one step.
    pub fn set_time(&mut self, time: f32, scene: &mut Scene) {
        self.time = 0.0;
        for (_, action) in &mut self.actions {
            action.time = 0.0;
        }
        self.update(time, scene);
    }

    /// Drains the events emitted since the last call.
    #[must_use]
    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Cache release
    // ========================================================================

    /// Releases an action and its binding references. Evicted property
    /// mixers restore their pre-animation values.
    pub fn uncache_action(&mut self, handle: ActionHandle, scene: &mut Scene) {
        self.deactivate_action(handle, scene);
        let Some(action) = self.actions.remove(handle) else {
            return;
        };
        self.action_cache.remove(&(action.clip.id, action.root));
        self.action_partition.remove(handle);
        for slot in action.mixer_slots {
            self.release_property_mixer(slot, scene);
        }
    }

    /// Releases every action playing the given clip.
    pub fn uncache_clip(&mut self, clip_id: Uuid, scene: &mut Scene) {
        let handles: Vec<ActionHandle> = self
            .actions
            .iter()
            .filter(|(_, a)| a.clip.id == clip_id)
            .map(|(h, _)| h)
            .collect();
        for handle in handles {
            self.uncache_action(handle, scene);
        }
    }

    /// Releases every action bound to the given root.
    pub fn uncache_root(&mut self, root: NodeHandle, scene: &mut Scene) {
        let handles: Vec<ActionHandle> = self
            .actions
            .iter()
            .filter(|(_, a)| a.root == root)
            .map(|(h, _)| h)
            .collect();
        for handle in handles {
            self.uncache_action(handle, scene);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn activate_action(&mut self, handle: ActionHandle) {
        if !self.action_partition.activate(handle) {
            return;
        }
        let Some(action) = self.actions.get(handle) else {
            return;
        };
        for &slot in &action.mixer_slots {
            if let Some(mixer) = self.prop_mixers.get_mut(slot) {
                mixer.use_count += 1;
                if mixer.use_count == 1 {
                    self.mixer_partition.activate(slot);
                }
            }
        }
    }

    fn deactivate_action(&mut self, handle: ActionHandle, scene: &mut Scene) {
        if !self.action_partition.deactivate(handle) {
            return;
        }
        let Some(action) = self.actions.get(handle) else {
            return;
        };
        for &slot in &action.mixer_slots {
            if let Some(mixer) = self.prop_mixers.get_mut(slot) {
                mixer.use_count = mixer.use_count.saturating_sub(1);
                if mixer.use_count == 0 {
                    mixer.restore_original_state(scene);
                    self.mixer_partition.deactivate(slot);
                }
            }
        }
    }

    fn release_property_mixer(&mut self, handle: PropertyMixerHandle, scene: &mut Scene) {
        let Some(mixer) = self.prop_mixers.get_mut(handle) else {
            return;
        };
        mixer.ref_count = mixer.ref_count.saturating_sub(1);
        if mixer.ref_count > 0 {
            return;
        }
        if mixer.use_count > 0 {
            mixer.restore_original_state(scene);
        }
        let key = mixer.cache_key.clone();
        self.binding_cache.remove(&key);
        self.mixer_partition.remove(handle);
        self.prop_mixers.remove(handle);
    }
}
