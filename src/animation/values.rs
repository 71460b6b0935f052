use glam::{Quat, Vec3, Vec4};

/// Hermite basis weights for the cubic interpolation modes.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

/// A value a [`KeyframeTrack`](crate::animation::tracks::KeyframeTrack)
/// can interpolate.
///
/// Quaternions blend spherically in `interpolate_linear`, so rotation
/// tracks get slerp out of the same bracketing logic every other value
/// kind uses.
pub trait Interpolatable: Clone + Sized {
    fn interpolate_linear(a: &Self, b: &Self, t: f32) -> Self;

    /// Hermite blend between `v0` and `v1` with per-second tangents
    /// `out_tangent0` / `in_tangent1` over an interval of length `dt`.
    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self;

    /// `(b - a) * scale`, used for finite-difference tangent estimation.
    fn scaled_diff(a: &Self, b: &Self, scale: f32) -> Self;

    /// Componentwise tolerance compare (keyframe optimization, dirty
    /// checks).
    fn approx_eq(a: &Self, b: &Self, tol: f32) -> bool;

    /// NaN/infinity screen used by track validation.
    fn is_finite(v: &Self) -> bool;
}

impl Interpolatable for f32 {
    fn interpolate_linear(a: &Self, b: &Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let m0 = out_tangent0 * dt;
        let m1 = in_tangent1 * dt;
        s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
    }

    fn scaled_diff(a: &Self, b: &Self, scale: f32) -> Self {
        (b - a) * scale
    }

    fn approx_eq(a: &Self, b: &Self, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    fn is_finite(v: &Self) -> bool {
        v.is_finite()
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(a: &Self, b: &Self, t: f32) -> Self {
        a.lerp(*b, t)
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let m0 = *out_tangent0 * dt;
        let m1 = *in_tangent1 * dt;
        *v0 * s0 + m0 * s1 + *v1 * s2 + m1 * s3
    }

    fn scaled_diff(a: &Self, b: &Self, scale: f32) -> Self {
        (*b - *a) * scale
    }

    fn approx_eq(a: &Self, b: &Self, tol: f32) -> bool {
        (*a - *b).abs().max_element() <= tol
    }

    fn is_finite(v: &Self) -> bool {
        v.is_finite()
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(a: &Self, b: &Self, t: f32) -> Self {
        a.slerp(*b, t)
    }

    // Componentwise Hermite, then renormalize. Tangent quats are treated
    // as raw 4-vectors.
    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let v0_v = Vec4::from(*v0);
        let v1_v = Vec4::from(*v1);
        let m0_v = Vec4::from(*out_tangent0) * dt;
        let m1_v = Vec4::from(*in_tangent1) * dt;

        let result = v0_v * s0 + m0_v * s1 + v1_v * s2 + m1_v * s3;
        Quat::from_vec4(result).normalize()
    }

    fn scaled_diff(a: &Self, b: &Self, scale: f32) -> Self {
        let d = (Vec4::from(*b) - Vec4::from(*a)) * scale;
        Quat::from_vec4(d)
    }

    fn approx_eq(a: &Self, b: &Self, tol: f32) -> bool {
        (Vec4::from(*a) - Vec4::from(*b)).abs().max_element() <= tol
    }

    fn is_finite(v: &Self) -> bool {
        v.is_finite()
    }
}

/// Step-only value: booleans hold their left sample under every
/// interpolation mode.
impl Interpolatable for bool {
    fn interpolate_linear(a: &Self, _b: &Self, _t: f32) -> Self {
        *a
    }

    fn interpolate_cubic(
        v0: &Self,
        _out_tangent0: &Self,
        _in_tangent1: &Self,
        _v1: &Self,
        _t: f32,
        _dt: f32,
    ) -> Self {
        *v0
    }

    fn scaled_diff(a: &Self, _b: &Self, _scale: f32) -> Self {
        *a
    }

    fn approx_eq(a: &Self, b: &Self, _tol: f32) -> bool {
        a == b
    }

    fn is_finite(_v: &Self) -> bool {
        true
    }
}

/// Morph target influence weights.
///
/// Heap-allocated since target counts vary per mesh; all arithmetic is
/// componentwise over the shorter of the two operands, with missing
/// components treated as zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MorphWeights {
    pub weights: Box<[f32]>,
}

impl MorphWeights {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            weights: vec![0.0; count].into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn from_slice(weights: &[f32]) -> Self {
        Self {
            weights: weights.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    fn get(&self, i: usize) -> f32 {
        self.weights.get(i).copied().unwrap_or(0.0)
    }
}

impl Interpolatable for MorphWeights {
    fn interpolate_linear(a: &Self, b: &Self, t: f32) -> Self {
        let mut out = a.clone();
        for (i, w) in out.weights.iter_mut().enumerate() {
            let bv = b.get(i);
            *w += (bv - *w) * t;
        }
        out
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite_basis(t);
        let mut out = v0.clone();
        for (i, w) in out.weights.iter_mut().enumerate() {
            let m0 = out_tangent0.get(i) * dt;
            let m1 = in_tangent1.get(i) * dt;
            *w = s0 * v0.get(i) + s1 * m0 + s2 * v1.get(i) + s3 * m1;
        }
        out
    }

    fn scaled_diff(a: &Self, b: &Self, scale: f32) -> Self {
        let mut out = a.clone();
        for (i, w) in out.weights.iter_mut().enumerate() {
            *w = (b.get(i) - a.get(i)) * scale;
        }
        out
    }

    fn approx_eq(a: &Self, b: &Self, tol: f32) -> bool {
        a.len() == b.len()
            && a.weights
                .iter()
                .zip(b.weights.iter())
                .all(|(x, y)| (x - y).abs() <= tol)
    }

    fn is_finite(v: &Self) -> bool {
        v.weights.iter().all(|w| w.is_finite())
    }
}

// ============================================================================
// Runtime value
// ============================================================================

/// Kind tag for [`AnimValue`]; also identifies which property shapes a
/// track may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Vector3,
    Quaternion,
    Bool,
    MorphWeights,
}

/// A sampled track value on its way from interpolation through the
/// accumulation buffers into a bound property.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimValue {
    Scalar(f32),
    Vector3(Vec3),
    Quaternion(Quat),
    Bool(bool),
    MorphWeights(MorphWeights),
}

impl AnimValue {
    /// The blend identity matching `value`'s kind: zero for linear types,
    /// the identity rotation for quaternions.
    #[must_use]
    pub fn zero_like(value: &AnimValue) -> AnimValue {
        match value {
            Self::Scalar(_) => Self::Scalar(0.0),
            Self::Vector3(_) => Self::Vector3(Vec3::ZERO),
            Self::Quaternion(_) => Self::Quaternion(Quat::IDENTITY),
            Self::Bool(_) => Self::Bool(false),
            Self::MorphWeights(w) => Self::MorphWeights(MorphWeights::new(w.len())),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Scalar(_) => ValueKind::Scalar,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Quaternion(_) => ValueKind::Quaternion,
            Self::Bool(_) => ValueKind::Bool,
            Self::MorphWeights(_) => ValueKind::MorphWeights,
        }
    }

    /// Blends `self` toward `other` by `t`. Kind mismatches leave `self`
    /// untouched (the contribution is dropped, not propagated as garbage).
    pub fn mix(&mut self, other: &AnimValue, t: f32) {
        match (&mut *self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => *a = f32::interpolate_linear(a, b, t),
            (Self::Vector3(a), Self::Vector3(b)) => *a = Vec3::interpolate_linear(a, b, t),
            (Self::Quaternion(a), Self::Quaternion(b)) => *a = Quat::interpolate_linear(a, b, t),
            (Self::Bool(a), Self::Bool(b)) => {
                // Select semantics: the heavier side wins.
                if t >= 0.5 {
                    *a = *b;
                }
            }
            (Self::MorphWeights(a), Self::MorphWeights(b)) => {
                *a = MorphWeights::interpolate_linear(a, b, t);
            }
            _ => log::debug!(
                "dropping mix of mismatched value kinds {:?} / {:?}",
                self.kind(),
                other.kind()
            ),
        }
    }

    /// Folds a weighted additive contribution into `self`. Rotations
    /// compose multiplicatively through a weighted slerp from identity.
    pub fn add_scaled(&mut self, other: &AnimValue, weight: f32) {
        match (&mut *self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => *a += b * weight,
            (Self::Vector3(a), Self::Vector3(b)) => *a += *b * weight,
            (Self::Quaternion(a), Self::Quaternion(b)) => {
                *a = (*a * Quat::IDENTITY.slerp(*b, weight)).normalize();
            }
            (Self::MorphWeights(a), Self::MorphWeights(b)) => {
                for (i, w) in a.weights.iter_mut().enumerate() {
                    *w += b.get(i) * weight;
                }
            }
            // Booleans have no additive composition.
            (Self::Bool(_), Self::Bool(_)) => {}
            _ => log::debug!(
                "dropping additive fold of mismatched value kinds {:?} / {:?}",
                self.kind(),
                other.kind()
            ),
        }
    }

    /// Componentwise tolerance compare; mismatched kinds are never equal.
    #[must_use]
    pub fn approx_eq(&self, other: &AnimValue, tol: f32) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => f32::approx_eq(a, b, tol),
            (Self::Vector3(a), Self::Vector3(b)) => Vec3::approx_eq(a, b, tol),
            (Self::Quaternion(a), Self::Quaternion(b)) => Quat::approx_eq(a, b, tol),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::MorphWeights(a), Self::MorphWeights(b)) => MorphWeights::approx_eq(a, b, tol),
            _ => false,
        }
    }
}
