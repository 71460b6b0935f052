//! Error Types
//!
//! This module defines the error types used by the animation system.
//!
//! # Overview
//!
//! The main error type [`AnimationError`] covers the *reportable* failure
//! modes: malformed track data, unparsable target paths, and broken
//! serialized clip records.
//!
//! Runtime failures during playback (a path that resolves to nothing, a
//! value kind that does not match its target) are deliberately **not**
//! errors. They degrade to no-ops and are surfaced through the `log`
//! channel, so a broken track can never take down the frame loop.

use thiserror::Error;

/// The main error type for the animation system.
#[derive(Error, Debug)]
pub enum AnimationError {
    // ========================================================================
    // Path Errors
    // ========================================================================
    /// A track target path could not be parsed.
    #[error("Invalid track path '{path}': {reason}")]
    InvalidTrackPath {
        /// The offending path string
        path: String,
        /// What went wrong
        reason: String,
    },

    // ========================================================================
    // Track & Clip Data Errors
    // ========================================================================
    /// Keyframe data failed validation (non-monotonic times, length
    /// mismatch, non-finite values).
    #[error("Malformed track data: {0}")]
    MalformedTrack(String),

    /// A clip aggregated at least one malformed track.
    #[error("Malformed clip '{name}': {detail}")]
    MalformedClip {
        /// Clip name
        name: String,
        /// Per-track diagnostic
        detail: String,
    },

    /// An invalid time window was passed to a trim operation.
    #[error("Invalid time window [{start}, {end}]")]
    InvalidTimeWindow {
        /// Window start (seconds)
        start: f32,
        /// Window end (seconds)
        end: f32,
    },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// A serialized clip record could not be decoded back into a clip.
    #[error("Clip record error: {0}")]
    RecordDecode(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
