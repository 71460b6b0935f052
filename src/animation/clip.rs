use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animation::binding::TrackPath;
use crate::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use crate::animation::values::{AnimValue, MorphWeights, ValueKind};
use crate::errors::{AnimationError, Result};

/// How a clip's contribution enters the per-property blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Shares the normalized weight budget with other normal actions.
    #[default]
    Normal,
    /// Layered on top of the normally-blended result.
    Additive,
}

/// Typed keyframe data for one track.
#[derive(Debug, Clone)]
pub enum TrackData {
    Scalar(KeyframeTrack<f32>),
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Bool(KeyframeTrack<bool>),
    MorphWeights(KeyframeTrack<MorphWeights>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            Self::Scalar(t) => t.end_time(),
            Self::Vector3(t) => t.end_time(),
            Self::Quaternion(t) => t.end_time(),
            Self::Bool(t) => t.end_time(),
            Self::MorphWeights(t) => t.end_time(),
        }
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        match self {
            Self::Scalar(t) => t.key_count(),
            Self::Vector3(t) => t.key_count(),
            Self::Quaternion(t) => t.key_count(),
            Self::Bool(t) => t.key_count(),
            Self::MorphWeights(t) => t.key_count(),
        }
    }

    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        match self {
            Self::Scalar(t) => t.interpolation(),
            Self::Vector3(t) => t.interpolation(),
            Self::Quaternion(t) => t.interpolation(),
            Self::Bool(t) => t.interpolation(),
            Self::MorphWeights(t) => t.interpolation(),
        }
    }

    /// The value kind this track produces (and must bind to).
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Scalar(_) => ValueKind::Scalar,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Quaternion(_) => ValueKind::Quaternion,
            Self::Bool(_) => ValueKind::Bool,
            Self::MorphWeights(_) => ValueKind::MorphWeights,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Scalar(t) => t.validate(),
            Self::Vector3(t) => t.validate(),
            Self::Quaternion(t) => t.validate(),
            Self::Bool(t) => t.validate(),
            Self::MorphWeights(t) => t.validate(),
        }
    }

    pub fn optimize(&mut self) {
        match self {
            Self::Scalar(t) => t.optimize(),
            Self::Vector3(t) => t.optimize(),
            Self::Quaternion(t) => t.optimize(),
            Self::Bool(t) => t.optimize(),
            Self::MorphWeights(t) => t.optimize(),
        }
    }

    pub fn trim(&self, start: f32, end: f32) -> Result<Self> {
        Ok(match self {
            Self::Scalar(t) => Self::Scalar(t.trim(start, end)?),
            Self::Vector3(t) => Self::Vector3(t.trim(start, end)?),
            Self::Quaternion(t) => Self::Quaternion(t.trim(start, end)?),
            Self::Bool(t) => Self::Bool(t.trim(start, end)?),
            Self::MorphWeights(t) => Self::MorphWeights(t.trim(start, end)?),
        })
    }

    /// Samples the track at `time`, advancing the caller's cursor.
    #[must_use]
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<AnimValue> {
        Some(match self {
            Self::Scalar(t) => AnimValue::Scalar(t.sample_with_cursor(time, cursor)?),
            Self::Vector3(t) => AnimValue::Vector3(t.sample_with_cursor(time, cursor)?),
            Self::Quaternion(t) => AnimValue::Quaternion(t.sample_with_cursor(time, cursor)?),
            Self::Bool(t) => AnimValue::Bool(t.sample_with_cursor(time, cursor)?),
            Self::MorphWeights(t) => AnimValue::MorphWeights(t.sample_with_cursor(time, cursor)?),
        })
    }
}

/// One animated channel: a target path plus its keyframe data.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: TrackPath,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn new(path: TrackPath, data: TrackData) -> Self {
        Self { path, data }
    }
}

/// An authored, reusable bundle of tracks with one duration.
///
/// Clips are immutable at playback time and shared read-only between any
/// number of actions (wrap in `Arc`).
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// Stable identity for action caching (`clip_action` lookups).
    pub id: Uuid,
    pub name: String,
    pub duration: f32,
    pub blend_mode: BlendMode,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Creates a clip; duration is the maximum end time across tracks.
    #[must_use]
    pub fn new(name: &str, tracks: Vec<Track>) -> Self {
        let mut clip = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            duration: 0.0,
            blend_mode: BlendMode::default(),
            tracks,
        };
        clip.reset_duration();
        clip
    }

    /// Overrides the computed duration (clips may end on a hold).
    #[must_use]
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Recomputes `duration` as the maximum track end time.
    pub fn reset_duration(&mut self) {
        self.duration = self
            .tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);
    }

    /// Validates every track, reporting the first defect with its path.
    pub fn validate(&self) -> Result<()> {
        for track in &self.tracks {
            track.data.validate().map_err(|e| AnimationError::MalformedClip {
                name: self.name.clone(),
                detail: format!("track '{}': {e}", track.path),
            })?;
        }
        Ok(())
    }

    /// Removes redundant keyframes from every track.
    pub fn optimize(&mut self) {
        for track in &mut self.tracks {
            track.data.optimize();
        }
    }

    /// Restricts the clip to `[start, end]`; the result is rebased to
    /// start at zero and gets a fresh identity.
    pub fn trim(&self, start: f32, end: f32) -> Result<Self> {
        let tracks = self
            .tracks
            .iter()
            .map(|t| {
                Ok(Track {
                    path: t.path.clone(),
                    data: t.data.trim(start, end)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            duration: end - start,
            blend_mode: self.blend_mode,
            tracks,
        })
    }

    // ========================================================================
    // Persisted form
    // ========================================================================

    /// Converts to the flat serialized record form.
    #[must_use]
    pub fn to_record(&self) -> ClipRecord {
        ClipRecord {
            name: self.name.clone(),
            duration: self.duration,
            blend_mode: self.blend_mode,
            tracks: self.tracks.iter().map(TrackRecord::from_track).collect(),
        }
    }

    /// Rebuilds a clip from its record form.
    pub fn from_record(record: &ClipRecord) -> Result<Self> {
        let tracks = record
            .tracks
            .iter()
            .map(TrackRecord::to_track)
            .collect::<Result<Vec<_>>>()?;

        let mut clip = Self::new(&record.name, tracks).with_blend_mode(record.blend_mode);
        if record.duration > 0.0 {
            clip.duration = record.duration;
        }
        Ok(clip)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: ClipRecord = serde_json::from_str(json)?;
        Self::from_record(&record)
    }
}

// ============================================================================
// Record types
// ============================================================================

/// Value-kind tag of a serialized track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Scalar,
    Vector3,
    Quaternion,
    Bool,
    MorphWeights,
}

/// Serialized form of one track: a type tag, a path string, and flat
/// time/value arrays. The component count is implied by the type tag and
/// the array length ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub path: String,
    pub interpolation: String,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

/// Serialized form of a clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRecord {
    pub name: String,
    pub duration: f32,
    #[serde(default)]
    pub blend_mode: BlendMode,
    pub tracks: Vec<TrackRecord>,
}

fn interpolation_tag(mode: InterpolationMode) -> &'static str {
    match mode {
        InterpolationMode::Step => "step",
        InterpolationMode::Linear => "linear",
        InterpolationMode::Smooth => "smooth",
        InterpolationMode::CubicSpline => "cubicspline",
    }
}

/// Parses an interpolation tag. Unknown tags fall back to the kind's
/// default mode with a logged warning rather than failing the track.
fn parse_interpolation(tag: &str, kind: TrackKind) -> InterpolationMode {
    match tag {
        "step" => InterpolationMode::Step,
        "linear" => InterpolationMode::Linear,
        "smooth" => InterpolationMode::Smooth,
        "cubicspline" => InterpolationMode::CubicSpline,
        _ => {
            let fallback = match kind {
                TrackKind::Bool => InterpolationMode::Step,
                _ => InterpolationMode::Linear,
            };
            log::warn!(
                "unsupported interpolation '{tag}', falling back to {fallback:?}"
            );
            fallback
        }
    }
}

impl TrackRecord {
    fn from_track(track: &Track) -> Self {
        let (kind, times, values) = match &track.data {
            TrackData::Scalar(t) => (TrackKind::Scalar, t.times().to_vec(), t.values().to_vec()),
            TrackData::Vector3(t) => (
                TrackKind::Vector3,
                t.times().to_vec(),
                t.values().iter().flat_map(|v| v.to_array()).collect(),
            ),
            TrackData::Quaternion(t) => (
                TrackKind::Quaternion,
                t.times().to_vec(),
                t.values().iter().flat_map(|q| q.to_array()).collect(),
            ),
            TrackData::Bool(t) => (
                TrackKind::Bool,
                t.times().to_vec(),
                t.values().iter().map(|&b| if b { 1.0 } else { 0.0 }).collect(),
            ),
            TrackData::MorphWeights(t) => (
                TrackKind::MorphWeights,
                t.times().to_vec(),
                t.values().iter().flat_map(|w| w.weights.to_vec()).collect(),
            ),
        };

        Self {
            kind,
            path: track.path.to_string(),
            interpolation: interpolation_tag(track.data.interpolation()).to_string(),
            times,
            values,
        }
    }

    fn to_track(&self) -> Result<Track> {
        let path = TrackPath::from_str(&self.path)?;
        let mode = parse_interpolation(&self.interpolation, self.kind);
        let stride = match mode {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        };

        let key_count = self.times.len() * stride;
        if key_count == 0 {
            return Err(AnimationError::RecordDecode(format!(
                "track '{}' has no keyframes",
                self.path
            )));
        }

        let components = match self.kind {
            TrackKind::Scalar | TrackKind::Bool => 1,
            TrackKind::Vector3 => 3,
            TrackKind::Quaternion => 4,
            TrackKind::MorphWeights => {
                if self.values.len() % key_count != 0 || self.values.is_empty() {
                    return Err(AnimationError::RecordDecode(format!(
                        "track '{}': cannot infer morph component count from {} values over {} keys",
                        self.path,
                        self.values.len(),
                        key_count
                    )));
                }
                self.values.len() / key_count
            }
        };

        if self.values.len() != key_count * components {
            return Err(AnimationError::RecordDecode(format!(
                "track '{}': expected {} values, found {}",
                self.path,
                key_count * components,
                self.values.len()
            )));
        }

        let times = self.times.clone();
        let data = match self.kind {
            TrackKind::Scalar => {
                TrackData::Scalar(KeyframeTrack::new(times, self.values.clone(), mode))
            }
            TrackKind::Bool => TrackData::Bool(KeyframeTrack::new(
                times,
                self.values.iter().map(|&v| v > 0.5).collect(),
                mode,
            )),
            TrackKind::Vector3 => TrackData::Vector3(KeyframeTrack::new(
                times,
                self.values
                    .chunks_exact(3)
                    .map(|c| Vec3::new(c[0], c[1], c[2]))
                    .collect(),
                mode,
            )),
            TrackKind::Quaternion => TrackData::Quaternion(KeyframeTrack::new(
                times,
                self.values
                    .chunks_exact(4)
                    .map(|c| Quat::from_xyzw(c[0], c[1], c[2], c[3]))
                    .collect(),
                mode,
            )),
            TrackKind::MorphWeights => TrackData::MorphWeights(KeyframeTrack::new(
                times,
                self.values
                    .chunks_exact(components)
                    .map(MorphWeights::from_slice)
                    .collect(),
                mode,
            )),
        };

        Ok(Track { path, data })
    }
}
