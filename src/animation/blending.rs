use crate::animation::binding::{PropertyBinding, TrackPath};
use crate::animation::values::AnimValue;
use crate::scene::{NodeHandle, Scene};

/// Tolerance for the write-suppression dirty check.
const WRITE_TOL: f32 = 1e-7;

/// Per-property blend state.
///
/// One `PropertyMixer` exists per unique (root, path) pair, shared by
/// every action that animates the property. Actions *accumulate* into it
/// during Phase 1; the mixer *applies* the composed result exactly once
/// during Phase 2. That two-phase split is what lets any number of
/// actions co-animate one property without clobbering each other's
/// partial writes.
///
/// Lifecycle counters:
/// - `ref_count` — actions bound to this property (cache references);
///   eviction happens at zero.
/// - `use_count` — actions currently *active* on it; the pre-animation
///   snapshot is taken when it leaves zero and written back when it
///   returns to zero.
#[derive(Debug)]
pub struct PropertyMixer {
    pub(crate) binding: PropertyBinding,
    /// Cache key, kept for eviction.
    pub(crate) cache_key: (NodeHandle, TrackPath),

    // === Value slots ===
    original: Option<AnimValue>,
    accumulated: Option<AnimValue>,
    additive: Option<AnimValue>,
    last_written: Option<AnimValue>,

    // === Per-frame blend state ===
    cumulative_weight: f32,
    cumulative_weight_additive: f32,

    // === Lifecycle ===
    original_saved: bool,
    pub(crate) ref_count: u32,
    pub(crate) use_count: u32,
}

impl PropertyMixer {
    #[must_use]
    pub(crate) fn new(binding: PropertyBinding, cache_key: (NodeHandle, TrackPath)) -> Self {
        Self {
            binding,
            cache_key,
            original: None,
            accumulated: None,
            additive: None,
            last_written: None,
            cumulative_weight: 0.0,
            cumulative_weight_additive: 0.0,
            original_saved: false,
            ref_count: 0,
            use_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    #[inline]
    pub(crate) fn needs_snapshot(&self) -> bool {
        !self.original_saved
    }

    /// Snapshots the property's current value before any blending
    /// touches it. Called when the first action starts using this
    /// property.
    pub(crate) fn save_original_state(&mut self, scene: &Scene) {
        self.original = self.binding.get(scene);
        self.original_saved = true;
    }

    /// Writes the saved snapshot back, so disabling all animators
    /// returns the property to its pre-animation value.
    pub(crate) fn restore_original_state(&mut self, scene: &mut Scene) {
        if let Some(original) = &self.original {
            self.binding.set(scene, original);
        }
        self.original = None;
        self.original_saved = false;
        self.accumulated = None;
        self.additive = None;
        self.last_written = None;
        self.cumulative_weight = 0.0;
        self.cumulative_weight_additive = 0.0;
    }

    /// Phase 1: folds one normally-blended contribution in, as a running
    /// weighted average. The first contributor of the frame seeds the
    /// buffer; later ones blend in by their share of the running total.
    pub fn accumulate(&mut self, value: &AnimValue, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        match &mut self.accumulated {
            None => {
                self.accumulated = Some(value.clone());
                self.cumulative_weight = weight;
            }
            Some(accu) => {
                self.cumulative_weight += weight;
                accu.mix(value, weight / self.cumulative_weight);
            }
        }
    }

    /// Phase 1: folds one additive contribution into the separate
    /// additive slot (plain scaled addition; multiplicative for
    /// rotations).
    pub fn accumulate_additive(&mut self, value: &AnimValue, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        let slot = self
            .additive
            .get_or_insert_with(|| AnimValue::zero_like(value));
        slot.add_scaled(value, weight);
        self.cumulative_weight_additive += weight;
    }

    /// Phase 2: composes the frame's contributions and writes the result
    /// through the binding, then resets the accumulation state.
    ///
    /// Composition order: under-weighted normal blends fade toward the
    /// saved original (not toward zero), then the additive layer goes on
    /// top. The write is suppressed when the result matches what was
    /// written last frame, so downstream invalidation (matrix rebuilds,
    /// GPU uploads) only happens on real change.
    pub fn apply(&mut self, scene: &mut Scene) {
        let normal = self.accumulated.take();
        let additive = self.additive.take();
        let weight = self.cumulative_weight;
        let additive_weight = self.cumulative_weight_additive;
        self.cumulative_weight = 0.0;
        self.cumulative_weight_additive = 0.0;

        let mut result = match normal {
            Some(accu) => {
                if weight < 1.0 {
                    if let Some(original) = &self.original {
                        let mut blended = original.clone();
                        blended.mix(&accu, weight);
                        blended
                    } else {
                        accu
                    }
                } else {
                    accu
                }
            }
            // No normal contribution this frame (all contributors at
            // weight zero): degrade to the original pose.
            None => match &self.original {
                Some(original) => original.clone(),
                None => return,
            },
        };

        if additive_weight > 0.0 {
            if let Some(add) = additive {
                result.add_scaled(&add, 1.0);
            }
        }

        let dirty = self
            .last_written
            .as_ref()
            .is_none_or(|prev| !prev.approx_eq(&result, WRITE_TOL));
        if dirty {
            self.binding.set(scene, &result);
            self.last_written = Some(result);
        }
    }
}
