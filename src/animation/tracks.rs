use crate::animation::values::Interpolatable;
use crate::errors::{AnimationError, Result};

/// How a track blends between bracketing keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Hold the left sample (step function).
    Step,
    /// Per-component linear blend (spherical for rotations).
    Linear,
    /// Hermite blend with tangents estimated from neighbor samples
    /// (C¹ continuity, no authored tangents required).
    Smooth,
    /// Hermite blend with explicit in/out tangents stored inline;
    /// values length is `3 × times length` (glTF-style layout).
    CubicSpline,
}

/// Boundary policy for [`InterpolationMode::Smooth`] tangent estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothEnding {
    /// One-sided finite difference at the ends.
    #[default]
    Clamped,
    /// Flat tangents at the ends.
    ZeroSlope,
    /// Estimate across the loop seam (for cyclic clips whose first and
    /// last samples match).
    WrapAround,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Divisor floor for degenerate (near-zero) key intervals.
const MIN_INTERVAL: f32 = 1e-6;

/// Tolerance used by keyframe optimization.
const REDUNDANCY_TOL: f32 = 1e-6;

/// Monotonic search cursor for O(1) amortized sequential sampling.
///
/// One cursor per (action, track) pair: the cursor caches the last hit
/// interval, so playback at ordinary frame rates touches at most a couple
/// of neighboring keys per sample instead of re-running a binary search.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// An immutable table of keyframe times and values plus an interpolation
/// mode.
///
/// Times must be non-decreasing ([`KeyframeTrack::validate`] checks this).
/// Sampling outside the keyed range clamps to the first/last sample; there
/// is no extrapolation.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
    ending: SmoothEnding,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
            ending: SmoothEnding::default(),
        }
    }

    /// Builder-style boundary policy for [`InterpolationMode::Smooth`].
    #[must_use]
    pub fn with_ending(mut self, ending: SmoothEnding) -> Self {
        self.ending = ending;
        self
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    #[inline]
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.times.first().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    /// Stateless sample: binary search every call.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        // partition_point yields the first index with t > time, i.e. the
        // right bracket; the interval starts one before it.
        let next = self.times.partition_point(|&t| t <= time);
        let index = next.saturating_sub(1);
        Some(self.sample_at_frame(index, time))
    }

    /// Cursor-assisted sample: scans a few keys around the last hit and
    /// falls back to binary search on a miss (scrubbing, loop reset).
    #[must_use]
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        if len == 0 {
            return None;
        }
        if len == 1 {
            return Some(self.value_at(0).clone());
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found = if time >= t_curr {
            // Forward scan from the cached interval.
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Backward scan (reverse playback).
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let index = found.unwrap_or_else(|| {
            let next = self.times.partition_point(|&t| t <= time);
            next.saturating_sub(1)
        });
        cursor.last_index = index;

        Some(self.sample_at_frame(index, time))
    }

    /// Value lookup that accounts for the CubicSpline triplet layout.
    fn value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            _ => &self.values[index],
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();

        // Clamp: at or past the last key there is no right bracket.
        if index >= len - 1 {
            return self.value_at(len - 1).clone();
        }

        let next = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next];
        let dt = t1 - t0;

        // Degenerate intervals collapse to the left sample rather than
        // dividing by ~0 and feeding NaN into the blend buffers.
        let t = if dt > MIN_INTERVAL {
            ((time - t0) / dt).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index).clone(),
            InterpolationMode::Linear => {
                T::interpolate_linear(self.value_at(index), self.value_at(next), t)
            }
            InterpolationMode::Smooth => {
                let m0 = self.smooth_tangent(index);
                let m1 = self.smooth_tangent(next);
                T::interpolate_cubic(self.value_at(index), &m0, &m1, self.value_at(next), t, dt)
            }
            InterpolationMode::CubicSpline => {
                let i0 = index * 3;
                let i1 = next * 3;
                T::interpolate_cubic(
                    &self.values[i0 + 1],
                    &self.values[i0 + 2],
                    &self.values[i1],
                    &self.values[i1 + 1],
                    t,
                    dt,
                )
            }
        }
    }

    /// Per-second tangent at key `index`, estimated by finite differences.
    /// Interior keys use a central difference; the two ends follow the
    /// track's [`SmoothEnding`].
    fn smooth_tangent(&self, index: usize) -> T {
        let n = self.times.len();
        debug_assert!(n >= 2);

        if index > 0 && index < n - 1 {
            let span = (self.times[index + 1] - self.times[index - 1]).max(MIN_INTERVAL);
            return T::scaled_diff(&self.values[index - 1], &self.values[index + 1], 1.0 / span);
        }

        match self.ending {
            SmoothEnding::ZeroSlope => {
                let v = &self.values[index];
                T::scaled_diff(v, v, 0.0)
            }
            SmoothEnding::Clamped => {
                if index == 0 {
                    let span = (self.times[1] - self.times[0]).max(MIN_INTERVAL);
                    T::scaled_diff(&self.values[0], &self.values[1], 1.0 / span)
                } else {
                    let span = (self.times[n - 1] - self.times[n - 2]).max(MIN_INTERVAL);
                    T::scaled_diff(&self.values[n - 2], &self.values[n - 1], 1.0 / span)
                }
            }
            SmoothEnding::WrapAround => {
                // Neighbor across the seam; assumes first and last samples
                // coincide (cyclic clip).
                let span = ((self.times[1] - self.times[0])
                    + (self.times[n - 1] - self.times[n - 2]))
                    .max(MIN_INTERVAL);
                T::scaled_diff(&self.values[n - 2], &self.values[1], 1.0 / span)
            }
        }
    }

    // ========================================================================
    // Validation / Optimization / Trimming
    // ========================================================================

    /// Checks the keyframe table for structural defects: emptiness,
    /// decreasing times, length mismatches, non-finite data.
    ///
    /// Reports rather than panics; callers decide whether a degraded
    /// track is still worth playing.
    pub fn validate(&self) -> Result<()> {
        if self.times.is_empty() {
            return Err(AnimationError::MalformedTrack(
                "track has no keyframes".to_string(),
            ));
        }

        let stride = match self.interpolation {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        };
        if self.values.len() != self.times.len() * stride {
            return Err(AnimationError::MalformedTrack(format!(
                "value count {} does not match {} keyframes (stride {})",
                self.values.len(),
                self.times.len(),
                stride
            )));
        }

        for (i, pair) in self.times.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(AnimationError::MalformedTrack(format!(
                    "times decrease at index {} ({} -> {})",
                    i + 1,
                    pair[0],
                    pair[1]
                )));
            }
        }
        if let Some(t) = self.times.iter().find(|t| !t.is_finite()) {
            return Err(AnimationError::MalformedTrack(format!(
                "non-finite keyframe time {t}"
            )));
        }
        if self.values.iter().any(|v| !T::is_finite(v)) {
            return Err(AnimationError::MalformedTrack(
                "non-finite keyframe value".to_string(),
            ));
        }

        Ok(())
    }

    /// Removes interior keyframes that are numerically redundant with both
    /// neighbors, and collapses duplicate timestamps.
    ///
    /// CubicSpline tracks are left untouched: authored tangents make
    /// value-equality an unreliable redundancy signal.
    pub fn optimize(&mut self) {
        if self.interpolation == InterpolationMode::CubicSpline || self.times.len() < 2 {
            return;
        }

        let n = self.times.len();
        let mut new_times = Vec::with_capacity(n);
        let mut new_values = Vec::with_capacity(n);

        for i in 0..n {
            // Duplicate timestamp: keep the first occurrence only.
            if let Some(&last) = new_times.last() {
                if self.times[i] <= last {
                    continue;
                }
            }
            // Interior key equal to both original neighbors adds nothing
            // under step/linear/smooth interpolation.
            if i > 0
                && i + 1 < n
                && T::approx_eq(&self.values[i], &self.values[i - 1], REDUNDANCY_TOL)
                && T::approx_eq(&self.values[i], &self.values[i + 1], REDUNDANCY_TOL)
            {
                continue;
            }
            new_times.push(self.times[i]);
            new_values.push(self.values[i].clone());
        }

        self.times = new_times;
        self.values = new_values;
    }

    /// Restricts the track to `[start, end]`, resampling exact boundary
    /// values so the truncated track has no gap. The resulting times are
    /// rebased to start at zero.
    pub fn trim(&self, start: f32, end: f32) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(AnimationError::InvalidTimeWindow { start, end });
        }
        if self.times.is_empty() {
            return Err(AnimationError::MalformedTrack(
                "cannot trim an empty track".to_string(),
            ));
        }

        let stride = match self.interpolation {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        };

        let mut new_times = Vec::new();
        let mut new_values = Vec::new();

        let push_boundary = |times: &mut Vec<f32>, values: &mut Vec<T>, at: f32, v: T| {
            times.push(at - start);
            if stride == 3 {
                // Synthesized boundary keys get flat tangents.
                let zero = T::scaled_diff(&v, &v, 0.0);
                values.push(zero.clone());
                values.push(v);
                values.push(zero);
            } else {
                values.push(v);
            }
        };

        if let Some(v) = self.sample(start) {
            push_boundary(&mut new_times, &mut new_values, start, v);
        }

        for i in 0..self.times.len() {
            let t = self.times[i];
            if t > start + MIN_INTERVAL && t < end - MIN_INTERVAL {
                new_times.push(t - start);
                for k in 0..stride {
                    new_values.push(self.values[i * stride + k].clone());
                }
            }
        }

        if let Some(v) = self.sample(end) {
            push_boundary(&mut new_times, &mut new_values, end, v);
        }

        Ok(Self {
            times: new_times,
            values: new_values,
            interpolation: self.interpolation,
            ending: self.ending,
        })
    }
}
