//! Blend strategies plugged into the interpolator.
//!
//! A strategy receives the older and newer snapshot values and a normalized
//! time. `t` runs past 1.0 when extrapolating, so every strategy here is
//! unclamped.

use glam::{Quat, Vec2, Vec3, Vec3A};
use serde::{Deserialize, Serialize};

pub trait LerpStrategy<T> {
    fn lerp(&self, from: &T, to: &T, t: f32) -> T;
}

impl<T, F> LerpStrategy<T> for F
where
    F: Fn(&T, &T, f32) -> T,
{
    fn lerp(&self, from: &T, to: &T, t: f32) -> T {
        self(from, to, t)
    }
}

/// Straight-line blend for scalars and vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl LerpStrategy<f32> for Linear {
    fn lerp(&self, from: &f32, to: &f32, t: f32) -> f32 {
        from + (to - from) * t
    }
}

impl LerpStrategy<f64> for Linear {
    fn lerp(&self, from: &f64, to: &f64, t: f32) -> f64 {
        from + (to - from) * t as f64
    }
}

impl LerpStrategy<Vec2> for Linear {
    fn lerp(&self, from: &Vec2, to: &Vec2, t: f32) -> Vec2 {
        from.lerp(*to, t)
    }
}

impl LerpStrategy<Vec3> for Linear {
    fn lerp(&self, from: &Vec3, to: &Vec3, t: f32) -> Vec3 {
        from.lerp(*to, t)
    }
}

impl LerpStrategy<Vec3A> for Linear {
    fn lerp(&self, from: &Vec3A, to: &Vec3A, t: f32) -> Vec3A {
        from.lerp(*to, t)
    }
}

/// Shortest-arc rotation blend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl LerpStrategy<Quat> for Spherical {
    fn lerp(&self, from: &Quat, to: &Quat, t: f32) -> Quat {
        slerp_unclamped(*from, *to, t)
    }
}

/// Rigid-body pose: the usual payload of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Linear position, spherical rotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseLerp;

impl LerpStrategy<Pose> for PoseLerp {
    fn lerp(&self, from: &Pose, to: &Pose, t: f32) -> Pose {
        Pose {
            position: from.position.lerp(to.position, t),
            rotation: slerp_unclamped(from.rotation, to.rotation, t),
        }
    }
}

/// Slerp that keeps following the great circle for `t` outside `[0, 1]`.
pub fn slerp_unclamped(from: Quat, to: Quat, t: f32) -> Quat {
    const NLERP_THRESHOLD: f32 = 0.9995;

    let mut to = to;
    let mut dot = from.dot(to);
    if dot < 0.0 {
        to = -to;
        dot = -dot;
    }

    if dot > NLERP_THRESHOLD {
        return (from + (to - from) * t).normalize();
    }

    let theta = dot.min(1.0).acos();
    let sin_theta = theta.sin();
    let from_weight = (theta * (1.0 - t)).sin() / sin_theta;
    let to_weight = (theta * t).sin() / sin_theta;

    (from * from_weight + to * to_weight).normalize()
}
