//! Table driven f32 <-> IEEE-754 binary16 conversion.
//!
//! Both directions are a couple of table lookups and an add, using the
//! scheme from Jeroen van der Zijp's "Fast Half Float Conversions". The
//! mantissa is truncated when narrowing (round toward zero), so results are
//! bit exact with the reference tables rather than with a rounding
//! converter.

use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

const SIGN_MASK: u16 = 0x8000;
const EXPONENT_MASK: u16 = 0x7c00;

static MANTISSA_TABLE: [u32; 2048] = mantissa_table();
static EXPONENT_TABLE: [u32; 64] = exponent_table();
static OFFSET_TABLE: [u16; 64] = offset_table();
static BASE_TABLE: [u16; 512] = base_table();
static SHIFT_TABLE: [u8; 512] = shift_table();

/// Narrows `value` to binary16 bits.
#[inline]
pub fn encode(value: f32) -> u16 {
    let bits = value.to_bits();
    let index = (bits >> 23) as usize & 0x1ff;
    BASE_TABLE[index] + ((bits & 0x007f_ffff) >> SHIFT_TABLE[index]) as u16
}

/// Widens binary16 bits to an f32. Exact for every input.
#[inline]
pub fn decode(bits: u16) -> f32 {
    let high = (bits >> 10) as usize;
    let mantissa = MANTISSA_TABLE[OFFSET_TABLE[high] as usize + (bits & 0x03ff) as usize];
    f32::from_bits(mantissa + EXPONENT_TABLE[high])
}

/// A binary16 value carried as its raw bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Half(u16);

impl Half {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(0x3c00);
    pub const INFINITY: Self = Self(EXPONENT_MASK);
    pub const NEG_INFINITY: Self = Self(EXPONENT_MASK | SIGN_MASK);
    pub const MAX: Self = Self(0x7bff);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u16 {
        self.0
    }

    pub fn from_f32(value: f32) -> Self {
        Self(encode(value))
    }

    pub fn to_f32(self) -> f32 {
        decode(self.0)
    }

    pub const fn negate(self) -> Self {
        Self(self.0 ^ SIGN_MASK)
    }

    pub const fn abs(self) -> Self {
        Self(self.0 & !SIGN_MASK)
    }

    pub const fn is_nan(self) -> bool {
        self.0 & !SIGN_MASK > EXPONENT_MASK
    }

    pub const fn is_infinite(self) -> bool {
        self.0 & !SIGN_MASK == EXPONENT_MASK
    }

    pub const fn is_positive_infinity(self) -> bool {
        self.0 == EXPONENT_MASK
    }

    pub const fn is_negative_infinity(self) -> bool {
        self.0 == EXPONENT_MASK | SIGN_MASK
    }
}

impl Neg for Half {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl From<f32> for Half {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

impl From<Half> for f32 {
    fn from(value: Half) -> Self {
        value.to_f32()
    }
}

impl fmt::Debug for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Half({} / {:#06x})", self.to_f32(), self.0)
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f32(), f)
    }
}

/// Renormalizes a subnormal half mantissa into f32 exponent/mantissa bits.
const fn convert_mantissa(i: u32) -> u32 {
    let mut mantissa = i << 13;
    let mut exponent: u32 = 0;

    while mantissa & 0x0080_0000 == 0 {
        exponent = exponent.wrapping_sub(0x0080_0000);
        mantissa <<= 1;
    }

    mantissa &= !0x0080_0000;
    exponent = exponent.wrapping_add(0x3880_0000);
    mantissa | exponent
}

const fn mantissa_table() -> [u32; 2048] {
    let mut table = [0u32; 2048];
    let mut i = 1;
    while i < 1024 {
        table[i] = convert_mantissa(i as u32);
        i += 1;
    }
    while i < 2048 {
        table[i] = 0x3800_0000 + (((i - 1024) as u32) << 13);
        i += 1;
    }
    table
}

const fn exponent_table() -> [u32; 64] {
    let mut table = [0u32; 64];
    let mut i = 1;
    while i < 31 {
        table[i] = (i as u32) << 23;
        i += 1;
    }
    table[31] = 0x4780_0000;
    table[32] = 0x8000_0000;
    i = 33;
    while i < 63 {
        table[i] = 0x8000_0000 + (((i - 32) as u32) << 23);
        i += 1;
    }
    table[63] = 0xc780_0000;
    table
}

const fn offset_table() -> [u16; 64] {
    let mut table = [1024u16; 64];
    table[0] = 0;
    table[32] = 0;
    table
}

const fn base_table() -> [u16; 512] {
    let mut table = [0u16; 512];
    let mut i = 0;
    while i < 256 {
        let e = 127 - i as i32;
        let base = if e > 24 {
            // underflow to zero
            0
        } else if e > 14 {
            // subnormal halves
            0x0400u16 >> (e - 14)
        } else if e >= -15 {
            ((15 - e) as u16) << 10
        } else {
            // overflow, infinity and NaN
            EXPONENT_MASK
        };
        table[i] = base;
        table[i | 0x100] = base | SIGN_MASK;
        i += 1;
    }
    table
}

const fn shift_table() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 256 {
        let e = 127 - i as i32;
        let shift = if e > 24 {
            24
        } else if e > 14 {
            (e - 1) as u8
        } else if e >= -15 {
            13
        } else if e > -128 {
            24
        } else {
            13
        };
        table[i] = shift;
        table[i | 0x100] = shift;
        i += 1;
    }
    table
}
