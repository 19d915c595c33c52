//! Smallest-three quaternion compression.
//!
//! The largest component of a unit quaternion is dropped and rebuilt from
//! the unit-norm constraint. The remaining three are bounded by
//! `[-1/sqrt(2), 1/sqrt(2)]` and quantized into fixed-width fields:
//!
//! ```text
//! u32: [31:30] index  [29:20] a  [19:10] b  [9:0] c      (10-bit fields)
//! u64: [63:60] index  [59:40] a  [39:20] b  [19:0] c     (20-bit fields)
//! ```
//!
//! The u64 index nibble only uses its two low bits; the upper two are zero.

use glam::Quat;

const MAXIMUM: f64 = std::f64::consts::FRAC_1_SQRT_2;
const MINIMUM: f64 = -MAXIMUM;
const RANGE: f64 = MAXIMUM - MINIMUM;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Integer word a quaternion can be packed into.
pub trait QuatCode: sealed::Sealed + Copy {
    /// Width of each of the three stored components.
    const COMPONENT_BITS: u32;
    /// Bit offset of the dropped-component index.
    const INDEX_SHIFT: u32;

    fn from_raw(raw: u64) -> Self;
    fn into_raw(self) -> u64;
}

impl QuatCode for u32 {
    const COMPONENT_BITS: u32 = 10;
    const INDEX_SHIFT: u32 = 30;

    fn from_raw(raw: u64) -> Self {
        raw as u32
    }

    fn into_raw(self) -> u64 {
        self as u64
    }
}

impl QuatCode for u64 {
    const COMPONENT_BITS: u32 = 20;
    const INDEX_SHIFT: u32 = 60;

    fn from_raw(raw: u64) -> Self {
        raw
    }

    fn into_raw(self) -> u64 {
        self
    }
}

/// Packs a unit quaternion. `q` and `-q` produce the same code.
pub fn pack<C: QuatCode>(q: Quat) -> C {
    debug_assert!(q.is_normalized(), "quaternion must be unit length: {q:?}");

    let components = q.to_array();
    let mut largest = 0;
    for i in 1..4 {
        if components[i].abs() > components[largest].abs() {
            largest = i;
        }
    }

    // Flip so the dropped component is non-negative; unpack assumes it.
    let sign = if components[largest] < 0.0 { -1.0 } else { 1.0 };

    let mut rest = [0.0f32; 3];
    let mut n = 0;
    for (i, &component) in components.iter().enumerate() {
        if i != largest {
            rest[n] = component * sign;
            n += 1;
        }
    }

    let bits = C::COMPONENT_BITS;
    let scale = field_mask::<C>() as f64;
    let raw = ((largest as u64) << C::INDEX_SHIFT)
        | (quantize(rest[0], scale) << (2 * bits))
        | (quantize(rest[1], scale) << bits)
        | quantize(rest[2], scale);

    C::from_raw(raw)
}

pub fn unpack<C: QuatCode>(code: C) -> Quat {
    let raw = code.into_raw();
    let bits = C::COMPONENT_BITS;
    let mask = field_mask::<C>();
    let scale = mask as f64;

    let largest = ((raw >> C::INDEX_SHIFT) & 0b11) as usize;
    let a = dequantize((raw >> (2 * bits)) & mask, scale);
    let b = dequantize((raw >> bits) & mask, scale);
    let c = dequantize(raw & mask, scale);
    let dropped = (1.0 - a * a - b * b - c * c).max(0.0).sqrt();

    let mut rest = [a, b, c].into_iter();
    let mut out = [0.0f32; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        let value = if i == largest {
            dropped
        } else {
            rest.next().unwrap_or_default()
        };
        *slot = value as f32;
    }

    Quat::from_array(out)
}

pub fn pack_u32(q: Quat) -> u32 {
    pack(q)
}

pub fn pack_u64(q: Quat) -> u64 {
    pack(q)
}

#[inline]
fn field_mask<C: QuatCode>() -> u64 {
    (1u64 << C::COMPONENT_BITS) - 1
}

#[inline]
fn quantize(value: f32, scale: f64) -> u64 {
    let normal = (value as f64 - MINIMUM) / RANGE;
    (normal * scale + 0.5).floor().clamp(0.0, scale) as u64
}

#[inline]
fn dequantize(value: u64, scale: f64) -> f64 {
    value as f64 * (RANGE / scale) + MINIMUM
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn distance(a: Quat, b: Quat) -> f64 {
        let a = a.to_array().map(f64::from);
        let b = b.to_array().map(f64::from);
        let minus: f64 = a.iter().zip(&b).map(|(x, y)| (x - y).powi(2)).sum();
        let plus: f64 = a.iter().zip(&b).map(|(x, y)| (x + y).powi(2)).sum();
        minus.min(plus).sqrt()
    }

    fn unit_quat() -> impl Strategy<Value = Quat> {
        (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
            .prop_filter("degenerate", |(x, y, z, w)| x * x + y * y + z * z + w * w > 0.01)
            .prop_map(|(x, y, z, w)| Quat::from_xyzw(x, y, z, w).normalize())
    }

    fn random_rotation(rng: &mut StdRng) -> Quat {
        loop {
            let q = Quat::from_xyzw(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if q.length_squared() > 0.01 {
                return q.normalize();
            }
        }
    }

    #[test]
    fn identity_layout() {
        let code = pack_u32(Quat::IDENTITY);
        assert_eq!(code >> 30, 3);
        // zero quantizes to the middle of the field
        assert_eq!((code >> 20) & 0x3ff, 512);
        assert_eq!((code >> 10) & 0x3ff, 512);
        assert_eq!(code & 0x3ff, 512);

        let wide = pack_u64(Quat::IDENTITY);
        assert_eq!(wide >> 60, 3);
        assert_eq!(wide & 0xfffff, 524_288);
    }

    #[test]
    fn index_tracks_largest_component() {
        let cases = [
            (Quat::from_xyzw(0.9, 0.3, 0.3, 0.1).normalize(), 0),
            (Quat::from_xyzw(0.1, -0.9, 0.3, 0.3).normalize(), 1),
            (Quat::from_xyzw(0.3, 0.1, 0.9, -0.3).normalize(), 2),
            (Quat::from_xyzw(0.3, 0.3, 0.1, -0.9).normalize(), 3),
        ];
        for (q, index) in cases {
            assert_eq!(pack_u32(q) >> 30, index);
            assert_eq!(pack_u64(q) >> 60, index as u64);
        }
    }

    #[test]
    fn negated_quaternion_packs_identically() {
        let q = Quat::from_rotation_y(2.5) * Quat::from_rotation_x(-0.7);
        assert_eq!(pack_u32(q), pack_u32(-q));
        assert_eq!(pack_u64(q), pack_u64(-q));
    }

    #[test]
    fn reserved_bits_stay_clear() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let code = pack_u64(random_rotation(&mut rng));
            assert_eq!(code >> 62, 0);
        }
    }

    #[test]
    fn wide_code_is_more_accurate() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut worst_narrow = 0.0f64;
        let mut worst_wide = 0.0f64;

        for _ in 0..u16::MAX {
            let q = random_rotation(&mut rng);
            let narrow = unpack(pack_u32(q));
            let wide = unpack(pack_u64(q));

            assert!(narrow.is_normalized(), "{narrow:?}");
            assert!(wide.is_normalized(), "{wide:?}");

            worst_narrow = worst_narrow.max(distance(q, narrow));
            worst_wide = worst_wide.max(distance(q, wide));
        }

        assert!(worst_narrow < 0.004, "worst 32-bit error {worst_narrow}");
        assert!(worst_wide < 1.0e-5, "worst 64-bit error {worst_wide}");
        assert!(worst_wide < worst_narrow);
    }

    proptest! {
        #[test]
        fn narrow_round_trip_is_bounded(q in unit_quat()) {
            let restored = unpack(pack_u32(q));
            prop_assert!(distance(q, restored) < 0.004);
        }

        #[test]
        fn wide_round_trip_is_bounded(q in unit_quat()) {
            let restored = unpack(pack_u64(q));
            prop_assert!(distance(q, restored) < 1.0e-5);
        }
    }
}
