//! Unit direction compression.
//!
//! A direction is stored as three sign bits plus two magnitudes projected
//! onto the simplex `x + y + z = M`; `z` is implied. Points with a large `x`
//! are folded onto the other half of the simplex, which saves a bit in the
//! `x` field:
//!
//! ```text
//! u16: [15] sx  [14] sy  [13] sz  [12:7] x  [6:0] y    M = 126
//! u32: [31] sx  [30] sy  [29] sz  [28:15] x [14:0] y   M = 32766
//! ```

use glam::Vec3;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Integer word a direction can be packed into.
pub trait DirectionCode: sealed::Sealed + Copy {
    const BITS: u32;
    /// Width of the low (`y`) field.
    const SPLIT: u32;
    /// Integer length of the projected direction.
    const MAX_SUM: u32;

    fn from_raw(raw: u32) -> Self;
    fn into_raw(self) -> u32;
}

impl DirectionCode for u16 {
    const BITS: u32 = 16;
    const SPLIT: u32 = 7;
    const MAX_SUM: u32 = 126;

    fn from_raw(raw: u32) -> Self {
        raw as u16
    }

    fn into_raw(self) -> u32 {
        self as u32
    }
}

impl DirectionCode for u32 {
    const BITS: u32 = 32;
    const SPLIT: u32 = 15;
    const MAX_SUM: u32 = 32766;

    fn from_raw(raw: u32) -> Self {
        raw
    }

    fn into_raw(self) -> u32 {
        self
    }
}

struct Layout {
    sign_x: u32,
    sign_y: u32,
    sign_z: u32,
    top_mask: u32,
    bottom_mask: u32,
    fold_threshold: u32,
    fold_sum: u32,
}

impl Layout {
    const fn of<C: DirectionCode>() -> Self {
        let sign_x = 1 << (C::BITS - 1);
        let sign_y = 1 << (C::BITS - 2);
        let sign_z = 1 << (C::BITS - 3);
        let bottom_mask = (1 << C::SPLIT) - 1;
        let full = u32::MAX >> (32 - C::BITS);

        Self {
            sign_x,
            sign_y,
            sign_z,
            top_mask: full ^ (sign_x | sign_y | sign_z | bottom_mask),
            bottom_mask,
            fold_threshold: 1 << (C::SPLIT - 1),
            fold_sum: C::MAX_SUM + 1,
        }
    }
}

/// Packs a unit direction. Components are truncated onto the grid, which
/// keeps `x + y <= M` so the fold stays detectable.
pub fn pack<C: DirectionCode>(direction: Vec3) -> C {
    debug_assert!(
        direction.is_normalized(),
        "direction must be unit length: {direction:?}"
    );

    let layout = Layout::of::<C>();
    let mut raw = 0u32;

    if direction.x < 0.0 {
        raw |= layout.sign_x;
    }
    if direction.y < 0.0 {
        raw |= layout.sign_y;
    }
    if direction.z < 0.0 {
        raw |= layout.sign_z;
    }

    let abs = direction.abs().as_dvec3();
    let w = C::MAX_SUM as f64 / (abs.x + abs.y + abs.z);

    let mut x = ((abs.x * w) as u32).min(C::MAX_SUM);
    let mut y = ((abs.y * w) as u32).min(C::MAX_SUM - x);

    if x >= layout.fold_threshold {
        x = layout.fold_sum - x;
        y = layout.fold_sum - y;
    }

    raw |= x << C::SPLIT;
    raw |= y;

    C::from_raw(raw)
}

pub fn unpack<C: DirectionCode>(code: C) -> Vec3 {
    let layout = Layout::of::<C>();
    let raw = code.into_raw();

    let mut x = (raw & layout.top_mask) >> C::SPLIT;
    let mut y = raw & layout.bottom_mask;

    if x + y >= layout.fold_sum {
        x = layout.fold_sum - x;
        y = layout.fold_sum - y;
    }

    let z = C::MAX_SUM.saturating_sub(x + y);

    let (x, y, z) = (x as f64, y as f64, z as f64);
    let length = (x * x + y * y + z * z).sqrt();
    let mut direction = Vec3::new((x / length) as f32, (y / length) as f32, (z / length) as f32);

    if raw & layout.sign_x != 0 {
        direction.x = -direction.x;
    }
    if raw & layout.sign_y != 0 {
        direction.y = -direction.y;
    }
    if raw & layout.sign_z != 0 {
        direction.z = -direction.z;
    }

    direction
}

pub fn pack_u16(direction: Vec3) -> u16 {
    pack(direction)
}

pub fn pack_u32(direction: Vec3) -> u32 {
    pack(direction)
}
