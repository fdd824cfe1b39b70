//! The 128-bit SIMD vector value and its lane operations.
//!
//! A [`V128`] is an interpretation-free bag of 16 bytes; every operation
//! picks its own lane shape (8/16/32/64-bit integer or 32/64-bit float
//! lanes). Shift amounts are taken modulo the lane width, narrowing
//! clamps to the target lane range and float lane operations follow the
//! same NaN rules as the scalar kernel.

#![allow(missing_docs)]

use crate::value::{Float, TruncateSaturateInto};
use core::array;
use core::fmt;

/// A 128-bit SIMD vector.
///
/// Stored as its little-endian byte image, so lane order matches the
/// memory representation and `v128.const` immediates are preserved
/// bit-exactly.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct V128([u8; 16]);

impl fmt::Debug for V128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "V128(0x{:032x})", u128::from_le_bytes(self.0))
    }
}

fn map<T: Copy, U, const N: usize>(a: [T; N], f: impl Fn(T) -> U) -> [U; N] {
    array::from_fn(|i| f(a[i]))
}

fn zip<T: Copy, U, const N: usize>(a: [T; N], b: [T; N], f: impl Fn(T, T) -> U) -> [U; N] {
    array::from_fn(|i| f(a[i], b[i]))
}

fn mask<T>(cond: bool) -> T
where
    T: From<u8> + core::ops::Not<Output = T>,
{
    if cond {
        !T::from(0u8)
    } else {
        T::from(0u8)
    }
}

macro_rules! lanes {
    ($to:ident, $from:ident, $lane:ty, $n:expr) => {
        pub fn $to(self) -> [$lane; $n] {
            const W: usize = 16 / $n;
            array::from_fn(|i| {
                let mut le = [0u8; W];
                le.copy_from_slice(&self.0[i * W..(i + 1) * W]);
                <$lane>::from_le_bytes(le)
            })
        }

        pub fn $from(lanes: [$lane; $n]) -> V128 {
            const W: usize = 16 / $n;
            let mut bytes = [0u8; 16];
            for (i, lane) in lanes.iter().enumerate() {
                bytes[i * W..(i + 1) * W].copy_from_slice(&lane.to_le_bytes());
            }
            V128(bytes)
        }
    };
}

impl V128 {
    /// The all-zeroes vector.
    pub fn zero() -> V128 {
        V128([0; 16])
    }

    /// Constructs a vector from its little-endian byte image.
    pub fn from_le_bytes(bytes: [u8; 16]) -> V128 {
        V128(bytes)
    }

    /// The little-endian byte image of this vector.
    pub fn to_le_bytes(self) -> [u8; 16] {
        self.0
    }

    lanes!(to_i8x16, from_i8x16, i8, 16);
    lanes!(to_u8x16, from_u8x16, u8, 16);
    lanes!(to_i16x8, from_i16x8, i16, 8);
    lanes!(to_u16x8, from_u16x8, u16, 8);
    lanes!(to_i32x4, from_i32x4, i32, 4);
    lanes!(to_u32x4, from_u32x4, u32, 4);
    lanes!(to_i64x2, from_i64x2, i64, 2);
    lanes!(to_u64x2, from_u64x2, u64, 2);
    lanes!(to_f32x4, from_f32x4, f32, 4);
    lanes!(to_f64x2, from_f64x2, f64, 2);
}

// Bitwise ops and the whole-vector tests.
impl V128 {
    pub fn not(self) -> V128 {
        V128(map(self.0, |b| !b))
    }

    pub fn and(self, rhs: V128) -> V128 {
        V128(zip(self.0, rhs.0, |a, b| a & b))
    }

    pub fn andnot(self, rhs: V128) -> V128 {
        V128(zip(self.0, rhs.0, |a, b| a & !b))
    }

    pub fn or(self, rhs: V128) -> V128 {
        V128(zip(self.0, rhs.0, |a, b| a | b))
    }

    pub fn xor(self, rhs: V128) -> V128 {
        V128(zip(self.0, rhs.0, |a, b| a ^ b))
    }

    /// Selects bits from `self` where `ctrl` has ones, from `rhs` where it
    /// has zeroes.
    pub fn bitselect(self, rhs: V128, ctrl: V128) -> V128 {
        self.and(ctrl).or(rhs.andnot(ctrl))
    }

    pub fn any_true(self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

// Extending loads build a full vector out of 8 loaded bytes.
impl V128 {
    pub fn i16x8_load8x8_s(bits: u64) -> V128 {
        let b = bits.to_le_bytes();
        V128::from_i16x8(array::from_fn(|i| (b[i] as i8) as i16))
    }

    pub fn i16x8_load8x8_u(bits: u64) -> V128 {
        let b = bits.to_le_bytes();
        V128::from_u16x8(array::from_fn(|i| b[i] as u16))
    }

    pub fn i32x4_load16x4_s(bits: u64) -> V128 {
        let b = bits.to_le_bytes();
        V128::from_i32x4(array::from_fn(|i| {
            i16::from_le_bytes([b[2 * i], b[2 * i + 1]]) as i32
        }))
    }

    pub fn i32x4_load16x4_u(bits: u64) -> V128 {
        let b = bits.to_le_bytes();
        V128::from_u32x4(array::from_fn(|i| {
            u16::from_le_bytes([b[2 * i], b[2 * i + 1]]) as u32
        }))
    }

    pub fn i64x2_load32x2_s(bits: u64) -> V128 {
        V128::from_i64x2([(bits as u32 as i32) as i64, ((bits >> 32) as u32 as i32) as i64])
    }

    pub fn i64x2_load32x2_u(bits: u64) -> V128 {
        V128::from_u64x2([bits as u32 as u64, bits >> 32])
    }
}

// i8x16 lane ops.
impl V128 {
    pub fn i8x16_splat(x: i32) -> V128 {
        V128::from_i8x16([x as i8; 16])
    }

    pub fn i8x16_extract_lane_s(self, lane: u8) -> i32 {
        self.to_i8x16()[lane as usize] as i32
    }

    pub fn i8x16_extract_lane_u(self, lane: u8) -> i32 {
        self.to_u8x16()[lane as usize] as i32
    }

    pub fn i8x16_replace_lane(self, lane: u8, x: i32) -> V128 {
        let mut lanes = self.to_i8x16();
        lanes[lane as usize] = x as i8;
        V128::from_i8x16(lanes)
    }

    /// Selects bytes of `self` by the byte indices in `rhs`; indices out
    /// of range select zero.
    pub fn i8x16_swizzle(self, rhs: V128) -> V128 {
        let src = self.to_u8x16();
        let sel = rhs.to_u8x16();
        V128(map(sel, |i| {
            if (i as usize) < 16 {
                src[i as usize]
            } else {
                0
            }
        }))
    }

    /// Reorders bytes from the concatenation of `self` and `rhs` by the
    /// 16 immediate lane indices (each in `0..32`).
    pub fn i8x16_shuffle(self, rhs: V128, sel: [u8; 16]) -> V128 {
        let a = self.to_u8x16();
        let b = rhs.to_u8x16();
        V128(map(sel, |i| {
            if (i as usize) < 16 {
                a[i as usize]
            } else {
                b[i as usize - 16]
            }
        }))
    }

    pub fn i8x16_eq(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a == b)))
    }

    pub fn i8x16_ne(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a != b)))
    }

    pub fn i8x16_lt_s(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a < b)))
    }

    pub fn i8x16_lt_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| mask(a < b)))
    }

    pub fn i8x16_gt_s(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a > b)))
    }

    pub fn i8x16_gt_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| mask(a > b)))
    }

    pub fn i8x16_le_s(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a <= b)))
    }

    pub fn i8x16_le_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| mask(a <= b)))
    }

    pub fn i8x16_ge_s(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| mask(a >= b)))
    }

    pub fn i8x16_ge_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| mask(a >= b)))
    }

    pub fn i8x16_abs(self) -> V128 {
        V128::from_i8x16(map(self.to_i8x16(), |a| a.wrapping_abs()))
    }

    pub fn i8x16_neg(self) -> V128 {
        V128::from_i8x16(map(self.to_i8x16(), |a| a.wrapping_neg()))
    }

    pub fn i8x16_popcnt(self) -> V128 {
        V128::from_u8x16(map(self.to_u8x16(), |a| a.count_ones() as u8))
    }

    pub fn i8x16_all_true(self) -> bool {
        self.to_u8x16().iter().all(|&a| a != 0)
    }

    pub fn i8x16_bitmask(self) -> i32 {
        self.to_i8x16()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &a)| acc | (((a < 0) as i32) << i))
    }

    pub fn i8x16_narrow_i16x8_s(self, rhs: V128) -> V128 {
        let mut out = [0i8; 16];
        for (i, &a) in self.to_i16x8().iter().enumerate() {
            out[i] = a.clamp(i8::MIN as i16, i8::MAX as i16) as i8;
        }
        for (i, &b) in rhs.to_i16x8().iter().enumerate() {
            out[8 + i] = b.clamp(i8::MIN as i16, i8::MAX as i16) as i8;
        }
        V128::from_i8x16(out)
    }

    pub fn i8x16_narrow_i16x8_u(self, rhs: V128) -> V128 {
        let mut out = [0u8; 16];
        for (i, &a) in self.to_i16x8().iter().enumerate() {
            out[i] = a.clamp(0, u8::MAX as i16) as u8;
        }
        for (i, &b) in rhs.to_i16x8().iter().enumerate() {
            out[8 + i] = b.clamp(0, u8::MAX as i16) as u8;
        }
        V128::from_u8x16(out)
    }

    pub fn i8x16_shl(self, amount: u32) -> V128 {
        let amount = amount % 8;
        V128::from_u8x16(map(self.to_u8x16(), |a| a.wrapping_shl(amount)))
    }

    pub fn i8x16_shr_s(self, amount: u32) -> V128 {
        let amount = amount % 8;
        V128::from_i8x16(map(self.to_i8x16(), |a| a.wrapping_shr(amount)))
    }

    pub fn i8x16_shr_u(self, amount: u32) -> V128 {
        let amount = amount % 8;
        V128::from_u8x16(map(self.to_u8x16(), |a| a.wrapping_shr(amount)))
    }

    pub fn i8x16_add(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| a.wrapping_add(b)))
    }

    pub fn i8x16_add_sat_s(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| {
            a.saturating_add(b)
        }))
    }

    pub fn i8x16_add_sat_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| {
            a.saturating_add(b)
        }))
    }

    pub fn i8x16_sub(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| a.wrapping_sub(b)))
    }

    pub fn i8x16_sub_sat_s(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| {
            a.saturating_sub(b)
        }))
    }

    pub fn i8x16_sub_sat_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| {
            a.saturating_sub(b)
        }))
    }

    pub fn i8x16_min_s(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| a.min(b)))
    }

    pub fn i8x16_min_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| a.min(b)))
    }

    pub fn i8x16_max_s(self, rhs: V128) -> V128 {
        V128::from_i8x16(zip(self.to_i8x16(), rhs.to_i8x16(), |a, b| a.max(b)))
    }

    pub fn i8x16_max_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| a.max(b)))
    }

    pub fn i8x16_avgr_u(self, rhs: V128) -> V128 {
        V128::from_u8x16(zip(self.to_u8x16(), rhs.to_u8x16(), |a, b| {
            ((a as u16 + b as u16 + 1) / 2) as u8
        }))
    }
}

// i16x8 lane ops.
impl V128 {
    pub fn i16x8_splat(x: i32) -> V128 {
        V128::from_i16x8([x as i16; 8])
    }

    pub fn i16x8_extract_lane_s(self, lane: u8) -> i32 {
        self.to_i16x8()[lane as usize] as i32
    }

    pub fn i16x8_extract_lane_u(self, lane: u8) -> i32 {
        self.to_u16x8()[lane as usize] as i32
    }

    pub fn i16x8_replace_lane(self, lane: u8, x: i32) -> V128 {
        let mut lanes = self.to_i16x8();
        lanes[lane as usize] = x as i16;
        V128::from_i16x8(lanes)
    }

    pub fn i16x8_eq(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a == b)))
    }

    pub fn i16x8_ne(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a != b)))
    }

    pub fn i16x8_lt_s(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a < b)))
    }

    pub fn i16x8_lt_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| mask(a < b)))
    }

    pub fn i16x8_gt_s(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a > b)))
    }

    pub fn i16x8_gt_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| mask(a > b)))
    }

    pub fn i16x8_le_s(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a <= b)))
    }

    pub fn i16x8_le_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| mask(a <= b)))
    }

    pub fn i16x8_ge_s(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| mask(a >= b)))
    }

    pub fn i16x8_ge_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| mask(a >= b)))
    }

    pub fn i16x8_abs(self) -> V128 {
        V128::from_i16x8(map(self.to_i16x8(), |a| a.wrapping_abs()))
    }

    pub fn i16x8_neg(self) -> V128 {
        V128::from_i16x8(map(self.to_i16x8(), |a| a.wrapping_neg()))
    }

    pub fn i16x8_q15mulr_sat_s(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| {
            let product = (a as i32 * b as i32 + (1 << 14)) >> 15;
            product.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        }))
    }

    pub fn i16x8_all_true(self) -> bool {
        self.to_u16x8().iter().all(|&a| a != 0)
    }

    pub fn i16x8_bitmask(self) -> i32 {
        self.to_i16x8()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &a)| acc | (((a < 0) as i32) << i))
    }

    pub fn i16x8_narrow_i32x4_s(self, rhs: V128) -> V128 {
        let mut out = [0i16; 8];
        for (i, &a) in self.to_i32x4().iter().enumerate() {
            out[i] = a.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
        for (i, &b) in rhs.to_i32x4().iter().enumerate() {
            out[4 + i] = b.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
        V128::from_i16x8(out)
    }

    pub fn i16x8_narrow_i32x4_u(self, rhs: V128) -> V128 {
        let mut out = [0u16; 8];
        for (i, &a) in self.to_i32x4().iter().enumerate() {
            out[i] = a.clamp(0, u16::MAX as i32) as u16;
        }
        for (i, &b) in rhs.to_i32x4().iter().enumerate() {
            out[4 + i] = b.clamp(0, u16::MAX as i32) as u16;
        }
        V128::from_u16x8(out)
    }

    pub fn i16x8_extend_low_i8x16_s(self) -> V128 {
        let lanes = self.to_i8x16();
        V128::from_i16x8(array::from_fn(|i| lanes[i] as i16))
    }

    pub fn i16x8_extend_high_i8x16_s(self) -> V128 {
        let lanes = self.to_i8x16();
        V128::from_i16x8(array::from_fn(|i| lanes[8 + i] as i16))
    }

    pub fn i16x8_extend_low_i8x16_u(self) -> V128 {
        let lanes = self.to_u8x16();
        V128::from_u16x8(array::from_fn(|i| lanes[i] as u16))
    }

    pub fn i16x8_extend_high_i8x16_u(self) -> V128 {
        let lanes = self.to_u8x16();
        V128::from_u16x8(array::from_fn(|i| lanes[8 + i] as u16))
    }

    pub fn i16x8_extadd_pairwise_i8x16_s(self) -> V128 {
        let lanes = self.to_i8x16();
        V128::from_i16x8(array::from_fn(|i| {
            lanes[2 * i] as i16 + lanes[2 * i + 1] as i16
        }))
    }

    pub fn i16x8_extadd_pairwise_i8x16_u(self) -> V128 {
        let lanes = self.to_u8x16();
        V128::from_u16x8(array::from_fn(|i| {
            lanes[2 * i] as u16 + lanes[2 * i + 1] as u16
        }))
    }

    pub fn i16x8_shl(self, amount: u32) -> V128 {
        let amount = amount % 16;
        V128::from_u16x8(map(self.to_u16x8(), |a| a.wrapping_shl(amount)))
    }

    pub fn i16x8_shr_s(self, amount: u32) -> V128 {
        let amount = amount % 16;
        V128::from_i16x8(map(self.to_i16x8(), |a| a.wrapping_shr(amount)))
    }

    pub fn i16x8_shr_u(self, amount: u32) -> V128 {
        let amount = amount % 16;
        V128::from_u16x8(map(self.to_u16x8(), |a| a.wrapping_shr(amount)))
    }

    pub fn i16x8_add(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| a.wrapping_add(b)))
    }

    pub fn i16x8_add_sat_s(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| {
            a.saturating_add(b)
        }))
    }

    pub fn i16x8_add_sat_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| {
            a.saturating_add(b)
        }))
    }

    pub fn i16x8_sub(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| a.wrapping_sub(b)))
    }

    pub fn i16x8_sub_sat_s(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| {
            a.saturating_sub(b)
        }))
    }

    pub fn i16x8_sub_sat_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| {
            a.saturating_sub(b)
        }))
    }

    pub fn i16x8_mul(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| a.wrapping_mul(b)))
    }

    pub fn i16x8_min_s(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| a.min(b)))
    }

    pub fn i16x8_min_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| a.min(b)))
    }

    pub fn i16x8_max_s(self, rhs: V128) -> V128 {
        V128::from_i16x8(zip(self.to_i16x8(), rhs.to_i16x8(), |a, b| a.max(b)))
    }

    pub fn i16x8_max_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| a.max(b)))
    }

    pub fn i16x8_avgr_u(self, rhs: V128) -> V128 {
        V128::from_u16x8(zip(self.to_u16x8(), rhs.to_u16x8(), |a, b| {
            ((a as u32 + b as u32 + 1) / 2) as u16
        }))
    }

    pub fn i16x8_extmul_low_i8x16_s(self, rhs: V128) -> V128 {
        let a = self.to_i8x16();
        let b = rhs.to_i8x16();
        V128::from_i16x8(array::from_fn(|i| a[i] as i16 * b[i] as i16))
    }

    pub fn i16x8_extmul_high_i8x16_s(self, rhs: V128) -> V128 {
        let a = self.to_i8x16();
        let b = rhs.to_i8x16();
        V128::from_i16x8(array::from_fn(|i| a[8 + i] as i16 * b[8 + i] as i16))
    }

    pub fn i16x8_extmul_low_i8x16_u(self, rhs: V128) -> V128 {
        let a = self.to_u8x16();
        let b = rhs.to_u8x16();
        V128::from_u16x8(array::from_fn(|i| a[i] as u16 * b[i] as u16))
    }

    pub fn i16x8_extmul_high_i8x16_u(self, rhs: V128) -> V128 {
        let a = self.to_u8x16();
        let b = rhs.to_u8x16();
        V128::from_u16x8(array::from_fn(|i| a[8 + i] as u16 * b[8 + i] as u16))
    }
}

// i32x4 lane ops.
impl V128 {
    pub fn i32x4_splat(x: i32) -> V128 {
        V128::from_i32x4([x; 4])
    }

    pub fn i32x4_extract_lane(self, lane: u8) -> i32 {
        self.to_i32x4()[lane as usize]
    }

    pub fn i32x4_replace_lane(self, lane: u8, x: i32) -> V128 {
        let mut lanes = self.to_i32x4();
        lanes[lane as usize] = x;
        V128::from_i32x4(lanes)
    }

    pub fn i32x4_eq(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a == b)))
    }

    pub fn i32x4_ne(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a != b)))
    }

    pub fn i32x4_lt_s(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a < b)))
    }

    pub fn i32x4_lt_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| mask(a < b)))
    }

    pub fn i32x4_gt_s(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a > b)))
    }

    pub fn i32x4_gt_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| mask(a > b)))
    }

    pub fn i32x4_le_s(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a <= b)))
    }

    pub fn i32x4_le_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| mask(a <= b)))
    }

    pub fn i32x4_ge_s(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| mask(a >= b)))
    }

    pub fn i32x4_ge_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| mask(a >= b)))
    }

    pub fn i32x4_abs(self) -> V128 {
        V128::from_i32x4(map(self.to_i32x4(), |a| a.wrapping_abs()))
    }

    pub fn i32x4_neg(self) -> V128 {
        V128::from_i32x4(map(self.to_i32x4(), |a| a.wrapping_neg()))
    }

    pub fn i32x4_all_true(self) -> bool {
        self.to_u32x4().iter().all(|&a| a != 0)
    }

    pub fn i32x4_bitmask(self) -> i32 {
        self.to_i32x4()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &a)| acc | (((a < 0) as i32) << i))
    }

    pub fn i32x4_extend_low_i16x8_s(self) -> V128 {
        let lanes = self.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| lanes[i] as i32))
    }

    pub fn i32x4_extend_high_i16x8_s(self) -> V128 {
        let lanes = self.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| lanes[4 + i] as i32))
    }

    pub fn i32x4_extend_low_i16x8_u(self) -> V128 {
        let lanes = self.to_u16x8();
        V128::from_u32x4(array::from_fn(|i| lanes[i] as u32))
    }

    pub fn i32x4_extend_high_i16x8_u(self) -> V128 {
        let lanes = self.to_u16x8();
        V128::from_u32x4(array::from_fn(|i| lanes[4 + i] as u32))
    }

    pub fn i32x4_extadd_pairwise_i16x8_s(self) -> V128 {
        let lanes = self.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| {
            lanes[2 * i] as i32 + lanes[2 * i + 1] as i32
        }))
    }

    pub fn i32x4_extadd_pairwise_i16x8_u(self) -> V128 {
        let lanes = self.to_u16x8();
        V128::from_u32x4(array::from_fn(|i| {
            lanes[2 * i] as u32 + lanes[2 * i + 1] as u32
        }))
    }

    pub fn i32x4_shl(self, amount: u32) -> V128 {
        let amount = amount % 32;
        V128::from_u32x4(map(self.to_u32x4(), |a| a.wrapping_shl(amount)))
    }

    pub fn i32x4_shr_s(self, amount: u32) -> V128 {
        let amount = amount % 32;
        V128::from_i32x4(map(self.to_i32x4(), |a| a.wrapping_shr(amount)))
    }

    pub fn i32x4_shr_u(self, amount: u32) -> V128 {
        let amount = amount % 32;
        V128::from_u32x4(map(self.to_u32x4(), |a| a.wrapping_shr(amount)))
    }

    pub fn i32x4_add(self, rhs: V128) -> V128 {
        V128::from_i32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| a.wrapping_add(b)))
    }

    pub fn i32x4_sub(self, rhs: V128) -> V128 {
        V128::from_i32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| a.wrapping_sub(b)))
    }

    pub fn i32x4_mul(self, rhs: V128) -> V128 {
        V128::from_i32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| a.wrapping_mul(b)))
    }

    pub fn i32x4_min_s(self, rhs: V128) -> V128 {
        V128::from_i32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| a.min(b)))
    }

    pub fn i32x4_min_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| a.min(b)))
    }

    pub fn i32x4_max_s(self, rhs: V128) -> V128 {
        V128::from_i32x4(zip(self.to_i32x4(), rhs.to_i32x4(), |a, b| a.max(b)))
    }

    pub fn i32x4_max_u(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_u32x4(), rhs.to_u32x4(), |a, b| a.max(b)))
    }

    pub fn i32x4_dot_i16x8_s(self, rhs: V128) -> V128 {
        let a = self.to_i16x8();
        let b = rhs.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| {
            a[2 * i] as i32 * b[2 * i] as i32 + a[2 * i + 1] as i32 * b[2 * i + 1] as i32
        }))
    }

    pub fn i32x4_extmul_low_i16x8_s(self, rhs: V128) -> V128 {
        let a = self.to_i16x8();
        let b = rhs.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| a[i] as i32 * b[i] as i32))
    }

    pub fn i32x4_extmul_high_i16x8_s(self, rhs: V128) -> V128 {
        let a = self.to_i16x8();
        let b = rhs.to_i16x8();
        V128::from_i32x4(array::from_fn(|i| a[4 + i] as i32 * b[4 + i] as i32))
    }

    pub fn i32x4_extmul_low_i16x8_u(self, rhs: V128) -> V128 {
        let a = self.to_u16x8();
        let b = rhs.to_u16x8();
        V128::from_u32x4(array::from_fn(|i| a[i] as u32 * b[i] as u32))
    }

    pub fn i32x4_extmul_high_i16x8_u(self, rhs: V128) -> V128 {
        let a = self.to_u16x8();
        let b = rhs.to_u16x8();
        V128::from_u32x4(array::from_fn(|i| a[4 + i] as u32 * b[4 + i] as u32))
    }

    pub fn i32x4_trunc_sat_f32x4_s(self) -> V128 {
        V128::from_i32x4(map(self.to_f32x4(), |a| a.truncate_saturate_into()))
    }

    pub fn i32x4_trunc_sat_f32x4_u(self) -> V128 {
        V128::from_u32x4(map(self.to_f32x4(), |a| a.truncate_saturate_into()))
    }

    pub fn i32x4_trunc_sat_f64x2_s_zero(self) -> V128 {
        let lanes = self.to_f64x2();
        V128::from_i32x4([
            lanes[0].truncate_saturate_into(),
            lanes[1].truncate_saturate_into(),
            0,
            0,
        ])
    }

    pub fn i32x4_trunc_sat_f64x2_u_zero(self) -> V128 {
        let lanes = self.to_f64x2();
        V128::from_u32x4([
            lanes[0].truncate_saturate_into(),
            lanes[1].truncate_saturate_into(),
            0,
            0,
        ])
    }
}

// i64x2 lane ops.
impl V128 {
    pub fn i64x2_splat(x: i64) -> V128 {
        V128::from_i64x2([x; 2])
    }

    pub fn i64x2_extract_lane(self, lane: u8) -> i64 {
        self.to_i64x2()[lane as usize]
    }

    pub fn i64x2_replace_lane(self, lane: u8, x: i64) -> V128 {
        let mut lanes = self.to_i64x2();
        lanes[lane as usize] = x;
        V128::from_i64x2(lanes)
    }

    pub fn i64x2_abs(self) -> V128 {
        V128::from_i64x2(map(self.to_i64x2(), |a| a.wrapping_abs()))
    }

    pub fn i64x2_neg(self) -> V128 {
        V128::from_i64x2(map(self.to_i64x2(), |a| a.wrapping_neg()))
    }

    pub fn i64x2_all_true(self) -> bool {
        self.to_u64x2().iter().all(|&a| a != 0)
    }

    pub fn i64x2_bitmask(self) -> i32 {
        self.to_i64x2()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &a)| acc | (((a < 0) as i32) << i))
    }

    pub fn i64x2_extend_low_i32x4_s(self) -> V128 {
        let lanes = self.to_i32x4();
        V128::from_i64x2([lanes[0] as i64, lanes[1] as i64])
    }

    pub fn i64x2_extend_high_i32x4_s(self) -> V128 {
        let lanes = self.to_i32x4();
        V128::from_i64x2([lanes[2] as i64, lanes[3] as i64])
    }

    pub fn i64x2_extend_low_i32x4_u(self) -> V128 {
        let lanes = self.to_u32x4();
        V128::from_u64x2([lanes[0] as u64, lanes[1] as u64])
    }

    pub fn i64x2_extend_high_i32x4_u(self) -> V128 {
        let lanes = self.to_u32x4();
        V128::from_u64x2([lanes[2] as u64, lanes[3] as u64])
    }

    pub fn i64x2_shl(self, amount: u32) -> V128 {
        let amount = amount % 64;
        V128::from_u64x2(map(self.to_u64x2(), |a| a.wrapping_shl(amount)))
    }

    pub fn i64x2_shr_s(self, amount: u32) -> V128 {
        let amount = amount % 64;
        V128::from_i64x2(map(self.to_i64x2(), |a| a.wrapping_shr(amount)))
    }

    pub fn i64x2_shr_u(self, amount: u32) -> V128 {
        let amount = amount % 64;
        V128::from_u64x2(map(self.to_u64x2(), |a| a.wrapping_shr(amount)))
    }

    pub fn i64x2_add(self, rhs: V128) -> V128 {
        V128::from_i64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| a.wrapping_add(b)))
    }

    pub fn i64x2_sub(self, rhs: V128) -> V128 {
        V128::from_i64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| a.wrapping_sub(b)))
    }

    pub fn i64x2_mul(self, rhs: V128) -> V128 {
        V128::from_i64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| a.wrapping_mul(b)))
    }

    pub fn i64x2_eq(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a == b)))
    }

    pub fn i64x2_ne(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a != b)))
    }

    pub fn i64x2_lt_s(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a < b)))
    }

    pub fn i64x2_gt_s(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a > b)))
    }

    pub fn i64x2_le_s(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a <= b)))
    }

    pub fn i64x2_ge_s(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_i64x2(), rhs.to_i64x2(), |a, b| mask(a >= b)))
    }

    pub fn i64x2_extmul_low_i32x4_s(self, rhs: V128) -> V128 {
        let a = self.to_i32x4();
        let b = rhs.to_i32x4();
        V128::from_i64x2([a[0] as i64 * b[0] as i64, a[1] as i64 * b[1] as i64])
    }

    pub fn i64x2_extmul_high_i32x4_s(self, rhs: V128) -> V128 {
        let a = self.to_i32x4();
        let b = rhs.to_i32x4();
        V128::from_i64x2([a[2] as i64 * b[2] as i64, a[3] as i64 * b[3] as i64])
    }

    pub fn i64x2_extmul_low_i32x4_u(self, rhs: V128) -> V128 {
        let a = self.to_u32x4();
        let b = rhs.to_u32x4();
        V128::from_u64x2([a[0] as u64 * b[0] as u64, a[1] as u64 * b[1] as u64])
    }

    pub fn i64x2_extmul_high_i32x4_u(self, rhs: V128) -> V128 {
        let a = self.to_u32x4();
        let b = rhs.to_u32x4();
        V128::from_u64x2([a[2] as u64 * b[2] as u64, a[3] as u64 * b[3] as u64])
    }
}

// f32x4 lane ops.
impl V128 {
    pub fn f32x4_splat(x: f32) -> V128 {
        V128::from_f32x4([x; 4])
    }

    pub fn f32x4_extract_lane(self, lane: u8) -> f32 {
        self.to_f32x4()[lane as usize]
    }

    pub fn f32x4_replace_lane(self, lane: u8, x: f32) -> V128 {
        let mut lanes = self.to_f32x4();
        lanes[lane as usize] = x;
        V128::from_f32x4(lanes)
    }

    pub fn f32x4_eq(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a == b)))
    }

    pub fn f32x4_ne(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a != b)))
    }

    pub fn f32x4_lt(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a < b)))
    }

    pub fn f32x4_gt(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a > b)))
    }

    pub fn f32x4_le(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a <= b)))
    }

    pub fn f32x4_ge(self, rhs: V128) -> V128 {
        V128::from_u32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| mask(a >= b)))
    }

    pub fn f32x4_abs(self) -> V128 {
        V128::from_u32x4(map(self.to_u32x4(), |a| a & 0x7fff_ffff))
    }

    pub fn f32x4_neg(self) -> V128 {
        V128::from_u32x4(map(self.to_u32x4(), |a| a ^ 0x8000_0000))
    }

    pub fn f32x4_sqrt(self) -> V128 {
        V128::from_f32x4(map(self.to_f32x4(), <f32 as Float<f32>>::sqrt))
    }

    pub fn f32x4_ceil(self) -> V128 {
        V128::from_f32x4(map(self.to_f32x4(), <f32 as Float<f32>>::ceil))
    }

    pub fn f32x4_floor(self) -> V128 {
        V128::from_f32x4(map(self.to_f32x4(), <f32 as Float<f32>>::floor))
    }

    pub fn f32x4_trunc(self) -> V128 {
        V128::from_f32x4(map(self.to_f32x4(), <f32 as Float<f32>>::trunc))
    }

    pub fn f32x4_nearest(self) -> V128 {
        V128::from_f32x4(map(self.to_f32x4(), <f32 as Float<f32>>::nearest))
    }

    pub fn f32x4_add(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| a + b))
    }

    pub fn f32x4_sub(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| a - b))
    }

    pub fn f32x4_mul(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| a * b))
    }

    pub fn f32x4_div(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| a / b))
    }

    pub fn f32x4_min(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), <f32 as Float<f32>>::min))
    }

    pub fn f32x4_max(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), <f32 as Float<f32>>::max))
    }

    pub fn f32x4_pmin(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| {
            if b < a {
                b
            } else {
                a
            }
        }))
    }

    pub fn f32x4_pmax(self, rhs: V128) -> V128 {
        V128::from_f32x4(zip(self.to_f32x4(), rhs.to_f32x4(), |a, b| {
            if a < b {
                b
            } else {
                a
            }
        }))
    }

    pub fn f32x4_convert_i32x4_s(self) -> V128 {
        V128::from_f32x4(map(self.to_i32x4(), |a| a as f32))
    }

    pub fn f32x4_convert_i32x4_u(self) -> V128 {
        V128::from_f32x4(map(self.to_u32x4(), |a| a as f32))
    }

    pub fn f32x4_demote_f64x2_zero(self) -> V128 {
        let lanes = self.to_f64x2();
        V128::from_f32x4([lanes[0] as f32, lanes[1] as f32, 0.0, 0.0])
    }
}

// f64x2 lane ops.
impl V128 {
    pub fn f64x2_splat(x: f64) -> V128 {
        V128::from_f64x2([x; 2])
    }

    pub fn f64x2_extract_lane(self, lane: u8) -> f64 {
        self.to_f64x2()[lane as usize]
    }

    pub fn f64x2_replace_lane(self, lane: u8, x: f64) -> V128 {
        let mut lanes = self.to_f64x2();
        lanes[lane as usize] = x;
        V128::from_f64x2(lanes)
    }

    pub fn f64x2_eq(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a == b)))
    }

    pub fn f64x2_ne(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a != b)))
    }

    pub fn f64x2_lt(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a < b)))
    }

    pub fn f64x2_gt(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a > b)))
    }

    pub fn f64x2_le(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a <= b)))
    }

    pub fn f64x2_ge(self, rhs: V128) -> V128 {
        V128::from_u64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| mask(a >= b)))
    }

    pub fn f64x2_abs(self) -> V128 {
        V128::from_u64x2(map(self.to_u64x2(), |a| a & 0x7fff_ffff_ffff_ffff))
    }

    pub fn f64x2_neg(self) -> V128 {
        V128::from_u64x2(map(self.to_u64x2(), |a| a ^ 0x8000_0000_0000_0000))
    }

    pub fn f64x2_sqrt(self) -> V128 {
        V128::from_f64x2(map(self.to_f64x2(), <f64 as Float<f64>>::sqrt))
    }

    pub fn f64x2_ceil(self) -> V128 {
        V128::from_f64x2(map(self.to_f64x2(), <f64 as Float<f64>>::ceil))
    }

    pub fn f64x2_floor(self) -> V128 {
        V128::from_f64x2(map(self.to_f64x2(), <f64 as Float<f64>>::floor))
    }

    pub fn f64x2_trunc(self) -> V128 {
        V128::from_f64x2(map(self.to_f64x2(), <f64 as Float<f64>>::trunc))
    }

    pub fn f64x2_nearest(self) -> V128 {
        V128::from_f64x2(map(self.to_f64x2(), <f64 as Float<f64>>::nearest))
    }

    pub fn f64x2_add(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| a + b))
    }

    pub fn f64x2_sub(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| a - b))
    }

    pub fn f64x2_mul(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| a * b))
    }

    pub fn f64x2_div(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| a / b))
    }

    pub fn f64x2_min(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), <f64 as Float<f64>>::min))
    }

    pub fn f64x2_max(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), <f64 as Float<f64>>::max))
    }

    pub fn f64x2_pmin(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| {
            if b < a {
                b
            } else {
                a
            }
        }))
    }

    pub fn f64x2_pmax(self, rhs: V128) -> V128 {
        V128::from_f64x2(zip(self.to_f64x2(), rhs.to_f64x2(), |a, b| {
            if a < b {
                b
            } else {
                a
            }
        }))
    }

    pub fn f64x2_convert_low_i32x4_s(self) -> V128 {
        let lanes = self.to_i32x4();
        V128::from_f64x2([lanes[0] as f64, lanes[1] as f64])
    }

    pub fn f64x2_convert_low_i32x4_u(self) -> V128 {
        let lanes = self.to_u32x4();
        V128::from_f64x2([lanes[0] as f64, lanes[1] as f64])
    }

    pub fn f64x2_promote_low_f32x4(self) -> V128 {
        let lanes = self.to_f32x4();
        V128::from_f64x2([lanes[0] as f64, lanes[1] as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::V128;

    #[test]
    fn shift_amount_is_modulo_lane_width() {
        let ones = V128::from_u8x16([1; 16]);
        // 8 mod 8 == 0, so the vector is unchanged.
        assert_eq!(ones.i8x16_shl(8), ones);
        assert_eq!(ones.i8x16_shl(9), V128::from_u8x16([2; 16]));

        let v = V128::from_u32x4([0x8000_0000; 4]);
        assert_eq!(v.i32x4_shr_u(33), V128::from_u32x4([0x4000_0000; 4]));
        assert_eq!(v.i32x4_shr_s(33), V128::from_u32x4([0xc000_0000; 4]));

        let w = V128::from_u64x2([1 << 63; 2]);
        assert_eq!(w.i64x2_shr_u(65), V128::from_u64x2([1 << 62; 2]));
        assert_eq!(
            V128::from_u16x8([1; 8]).i16x8_shl(17),
            V128::from_u16x8([2; 8])
        );
    }

    #[test]
    fn narrow_clamps_to_target_range() {
        let a = V128::from_i16x8([300, -300, 127, -128, 0, 1, -1, 42]);
        let b = V128::from_i16x8([0; 8]);
        let narrowed = a.i8x16_narrow_i16x8_s(b).to_i8x16();
        assert_eq!(&narrowed[..8], &[127, -128, 127, -128, 0, 1, -1, 42]);

        let unsigned = a.i8x16_narrow_i16x8_u(b).to_u8x16();
        assert_eq!(&unsigned[..8], &[255, 0, 127, 0, 0, 1, 0, 42]);
    }

    #[test]
    fn extend_picks_half() {
        let v = V128::from_i8x16([-1, 2, -3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, -16]);
        assert_eq!(
            v.i16x8_extend_low_i8x16_s().to_i16x8(),
            [-1, 2, -3, 4, 5, 6, 7, 8]
        );
        assert_eq!(
            v.i16x8_extend_high_i8x16_s().to_i16x8(),
            [9, 10, 11, 12, 13, 14, 15, -16]
        );
        assert_eq!(
            v.i16x8_extend_low_i8x16_u().to_u16x8(),
            [255, 2, 253, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn splat_replicates() {
        assert_eq!(V128::i8x16_splat(0x1ff).to_u8x16(), [0xff; 16]);
        assert_eq!(V128::i32x4_splat(-7).to_i32x4(), [-7; 4]);
        assert_eq!(V128::f64x2_splat(1.5).to_f64x2(), [1.5; 2]);
    }

    #[test]
    fn bitselect_mixes_bits() {
        let a = V128::from_u32x4([0xffff_0000; 4]);
        let b = V128::from_u32x4([0x0000_ffff; 4]);
        let ctrl = V128::from_u32x4([0x00ff_ff00; 4]);
        assert_eq!(a.bitselect(b, ctrl).to_u32x4(), [0x00ff_00ff; 4]);
    }

    #[test]
    fn bitmask_collects_sign_bits() {
        let v = V128::from_i8x16([
            -1, 1, -1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -1,
        ]);
        assert_eq!(v.i8x16_bitmask(), 0b1000_0000_0000_0101);
        assert_eq!(V128::from_i64x2([-1, 1]).i64x2_bitmask(), 0b01);
    }

    #[test]
    fn swizzle_out_of_range_selects_zero() {
        let v = V128::from_u8x16([10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]);
        let sel = V128::from_u8x16([0, 15, 16, 255, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
        let out = v.i8x16_swizzle(sel).to_u8x16();
        assert_eq!(&out[..5], &[10, 25, 0, 0, 11]);
    }

    #[test]
    fn q15mulr_saturates() {
        let a = V128::from_i16x8([i16::MIN; 8]);
        let out = a.i16x8_q15mulr_sat_s(a).to_i16x8();
        assert_eq!(out, [i16::MAX; 8]);
    }

    #[test]
    fn float_min_propagates_nan_per_lane() {
        let a = V128::from_f32x4([f32::NAN, 1.0, 2.0, -0.0]);
        let b = V128::from_f32x4([1.0, f32::NAN, 1.0, 0.0]);
        let out = a.f32x4_min(b).to_f32x4();
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 1.0);
        assert_eq!(out[3].to_bits(), (-0.0f32).to_bits());
    }

    #[test]
    fn trunc_sat_lanes_clamp() {
        let v = V128::from_f32x4([1e10, -1e10, f32::NAN, 1.9]);
        assert_eq!(
            v.i32x4_trunc_sat_f32x4_s().to_i32x4(),
            [i32::MAX, i32::MIN, 0, 1]
        );
        assert_eq!(
            v.i32x4_trunc_sat_f32x4_u().to_u32x4(),
            [u32::MAX, 0, 0, 1]
        );
    }

    #[test]
    fn dot_sums_adjacent_products() {
        let a = V128::from_i16x8([1, 2, 3, 4, 5, 6, 7, 8]);
        let b = V128::from_i16x8([10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(
            a.i32x4_dot_i16x8_s(b).to_i32x4(),
            [10 + 40, 90 + 160, 250 + 360, 490 + 640]
        );
    }
}
