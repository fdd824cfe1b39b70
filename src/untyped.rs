//! The untyped 64-bit scalar cell and one method per scalar operator.
//!
//! Inside the interpreter scalar values are tag-free 64-bit cells; a
//! value narrower than 64 bits occupies the low bits. Types never get
//! lost because validation guarantees every operator sees operands of
//! the type it expects; a mismatch would be a logic error, not undefined
//! behaviour.

use crate::nan_preserving_float::{F32, F64};
use crate::value::{
    ArithmeticOps, ExtendInto, Float, Integer, SignExtendFrom, TransmuteInto,
    TruncateSaturateInto, TryTruncateInto, Value, ValueType, WrapInto,
};
use crate::TrapCode;
use core::ops::{Neg, Shl, Shr};

/// An untyped scalar value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UntypedValue {
    /// Wide enough for `i32`, `i64`, `f32` and `f64`; vectors and
    /// references live in their own cell representations.
    bits: u64,
}

impl UntypedValue {
    /// Returns the underlying bits.
    pub fn to_bits(self) -> u64 {
        self.bits
    }

    /// Creates an untyped value from raw bits.
    pub fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// Converts into a [`Value`] of the given scalar type.
    ///
    /// Vectors and references are not scalars and are marshalled by the
    /// value stack instead.
    pub fn with_type(self, value_type: ValueType) -> Value {
        match value_type {
            ValueType::I32 => Value::I32(<_>::from(self)),
            ValueType::I64 => Value::I64(<_>::from(self)),
            ValueType::F32 => Value::F32(<_>::from(self)),
            ValueType::F64 => Value::F64(<_>::from(self)),
            ValueType::V128 | ValueType::FuncRef | ValueType::ExternRef => {
                unreachable!("vectors and references are marshalled by the value stack")
            }
        }
    }
}

macro_rules! impl_from_untyped_for_int {
    ( $( $int:ty ),* $(,)? ) => {
        $(
            impl From<UntypedValue> for $int {
                fn from(untyped: UntypedValue) -> Self {
                    untyped.to_bits() as _
                }
            }
        )*
    };
}
impl_from_untyped_for_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_from_untyped_for_float {
    ( $( $float:ty ),* $(,)? ) => {
        $(
            impl From<UntypedValue> for $float {
                fn from(untyped: UntypedValue) -> Self {
                    Self::from_bits(untyped.to_bits() as _)
                }
            }
        )*
    };
}
impl_from_untyped_for_float!(f32, f64, F32, F64);

impl From<UntypedValue> for bool {
    fn from(untyped: UntypedValue) -> Self {
        untyped.to_bits() != 0
    }
}

macro_rules! impl_from_prim {
    ( $( $prim:ty ),* $(,)? ) => {
        $(
            impl From<$prim> for UntypedValue {
                fn from(value: $prim) -> Self {
                    Self { bits: value as u64 }
                }
            }
        )*
    };
}
#[rustfmt::skip]
impl_from_prim!(
    i8, i16, i32, i64,
    u8, u16, u32, u64,
);

impl From<bool> for UntypedValue {
    fn from(value: bool) -> Self {
        Self {
            bits: value as u64,
        }
    }
}

impl From<f32> for UntypedValue {
    fn from(value: f32) -> Self {
        Self {
            bits: value.to_bits() as u64,
        }
    }
}

impl From<f64> for UntypedValue {
    fn from(value: f64) -> Self {
        Self {
            bits: value.to_bits(),
        }
    }
}

impl From<F32> for UntypedValue {
    fn from(value: F32) -> Self {
        Self {
            bits: value.to_bits() as u64,
        }
    }
}

impl From<F64> for UntypedValue {
    fn from(value: F64) -> Self {
        Self {
            bits: value.to_bits(),
        }
    }
}

macro_rules! op {
    ( $operator:tt ) => {{
        |lhs, rhs| lhs $operator rhs
    }};
}

impl UntypedValue {
    /// Execute an infallible generic operation on `T` that returns an `R`.
    fn execute_unary<T, R>(self, op: fn(T) -> R) -> Self
    where
        T: From<Self>,
        R: Into<Self>,
    {
        op(T::from(self)).into()
    }

    /// Execute a fallible generic operation on `T` that returns an `R`.
    fn try_execute_unary<T, R>(self, op: fn(T) -> Result<R, TrapCode>) -> Result<Self, TrapCode>
    where
        T: From<Self>,
        R: Into<Self>,
    {
        op(T::from(self)).map(Into::into)
    }

    /// Execute an infallible generic operation on `T` that returns an `R`.
    fn execute_binary<T, R>(self, rhs: Self, op: fn(T, T) -> R) -> Self
    where
        T: From<Self>,
        R: Into<Self>,
    {
        op(T::from(self), T::from(rhs)).into()
    }

    /// Execute a fallible generic operation on `T` that returns an `R`.
    fn try_execute_binary<T, R>(
        self,
        rhs: Self,
        op: fn(T, T) -> Result<R, TrapCode>,
    ) -> Result<Self, TrapCode>
    where
        T: From<Self>,
        R: Into<Self>,
    {
        op(T::from(self), T::from(rhs)).map(Into::into)
    }
}

impl UntypedValue {
    // i32 and i64 comparisons.

    /// Execute the `i32.eqz` Wasm operator.
    pub fn i32_eqz(self) -> Self {
        self.execute_unary(|v: i32| v == 0)
    }

    /// Execute the `i64.eqz` Wasm operator.
    pub fn i64_eqz(self) -> Self {
        self.execute_unary(|v: i64| v == 0)
    }

    /// Execute the `i32.eq` Wasm operator.
    pub fn i32_eq(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(==))
    }

    /// Execute the `i64.eq` Wasm operator.
    pub fn i64_eq(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(==))
    }

    /// Execute the `f32.eq` Wasm operator.
    pub fn f32_eq(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(==))
    }

    /// Execute the `f64.eq` Wasm operator.
    pub fn f64_eq(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(==))
    }

    /// Execute the `i32.ne` Wasm operator.
    pub fn i32_ne(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(!=))
    }

    /// Execute the `i64.ne` Wasm operator.
    pub fn i64_ne(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(!=))
    }

    /// Execute the `f32.ne` Wasm operator.
    pub fn f32_ne(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(!=))
    }

    /// Execute the `f64.ne` Wasm operator.
    pub fn f64_ne(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(!=))
    }

    /// Execute the `i32.lt_s` Wasm operator.
    pub fn i32_lt_s(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(<))
    }

    /// Execute the `i64.lt_s` Wasm operator.
    pub fn i64_lt_s(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(<))
    }

    /// Execute the `i32.lt_u` Wasm operator.
    pub fn i32_lt_u(self, rhs: Self) -> Self {
        self.execute_binary::<u32, bool>(rhs, op!(<))
    }

    /// Execute the `i64.lt_u` Wasm operator.
    pub fn i64_lt_u(self, rhs: Self) -> Self {
        self.execute_binary::<u64, bool>(rhs, op!(<))
    }

    /// Execute the `f32.lt` Wasm operator.
    pub fn f32_lt(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(<))
    }

    /// Execute the `f64.lt` Wasm operator.
    pub fn f64_lt(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(<))
    }

    /// Execute the `i32.gt_s` Wasm operator.
    pub fn i32_gt_s(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(>))
    }

    /// Execute the `i64.gt_s` Wasm operator.
    pub fn i64_gt_s(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(>))
    }

    /// Execute the `i32.gt_u` Wasm operator.
    pub fn i32_gt_u(self, rhs: Self) -> Self {
        self.execute_binary::<u32, bool>(rhs, op!(>))
    }

    /// Execute the `i64.gt_u` Wasm operator.
    pub fn i64_gt_u(self, rhs: Self) -> Self {
        self.execute_binary::<u64, bool>(rhs, op!(>))
    }

    /// Execute the `f32.gt` Wasm operator.
    pub fn f32_gt(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(>))
    }

    /// Execute the `f64.gt` Wasm operator.
    pub fn f64_gt(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(>))
    }

    /// Execute the `i32.le_s` Wasm operator.
    pub fn i32_le_s(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(<=))
    }

    /// Execute the `i64.le_s` Wasm operator.
    pub fn i64_le_s(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(<=))
    }

    /// Execute the `i32.le_u` Wasm operator.
    pub fn i32_le_u(self, rhs: Self) -> Self {
        self.execute_binary::<u32, bool>(rhs, op!(<=))
    }

    /// Execute the `i64.le_u` Wasm operator.
    pub fn i64_le_u(self, rhs: Self) -> Self {
        self.execute_binary::<u64, bool>(rhs, op!(<=))
    }

    /// Execute the `f32.le` Wasm operator.
    pub fn f32_le(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(<=))
    }

    /// Execute the `f64.le` Wasm operator.
    pub fn f64_le(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(<=))
    }

    /// Execute the `i32.ge_s` Wasm operator.
    pub fn i32_ge_s(self, rhs: Self) -> Self {
        self.execute_binary::<i32, bool>(rhs, op!(>=))
    }

    /// Execute the `i64.ge_s` Wasm operator.
    pub fn i64_ge_s(self, rhs: Self) -> Self {
        self.execute_binary::<i64, bool>(rhs, op!(>=))
    }

    /// Execute the `i32.ge_u` Wasm operator.
    pub fn i32_ge_u(self, rhs: Self) -> Self {
        self.execute_binary::<u32, bool>(rhs, op!(>=))
    }

    /// Execute the `i64.ge_u` Wasm operator.
    pub fn i64_ge_u(self, rhs: Self) -> Self {
        self.execute_binary::<u64, bool>(rhs, op!(>=))
    }

    /// Execute the `f32.ge` Wasm operator.
    pub fn f32_ge(self, rhs: Self) -> Self {
        self.execute_binary::<F32, bool>(rhs, op!(>=))
    }

    /// Execute the `f64.ge` Wasm operator.
    pub fn f64_ge(self, rhs: Self) -> Self {
        self.execute_binary::<F64, bool>(rhs, op!(>=))
    }

    // Integer bit counting and rotation.

    /// Execute the `i32.clz` Wasm operator.
    pub fn i32_clz(self) -> Self {
        self.execute_unary(<i32 as Integer<i32>>::leading_zeros)
    }

    /// Execute the `i64.clz` Wasm operator.
    pub fn i64_clz(self) -> Self {
        self.execute_unary(<i64 as Integer<i64>>::leading_zeros)
    }

    /// Execute the `i32.ctz` Wasm operator.
    pub fn i32_ctz(self) -> Self {
        self.execute_unary(<i32 as Integer<i32>>::trailing_zeros)
    }

    /// Execute the `i64.ctz` Wasm operator.
    pub fn i64_ctz(self) -> Self {
        self.execute_unary(<i64 as Integer<i64>>::trailing_zeros)
    }

    /// Execute the `i32.popcnt` Wasm operator.
    pub fn i32_popcnt(self) -> Self {
        self.execute_unary(<i32 as Integer<i32>>::count_ones)
    }

    /// Execute the `i64.popcnt` Wasm operator.
    pub fn i64_popcnt(self) -> Self {
        self.execute_unary(<i64 as Integer<i64>>::count_ones)
    }

    /// Execute the `i32.rotl` Wasm operator.
    pub fn i32_rotl(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i32 as Integer<i32>>::rotl)
    }

    /// Execute the `i64.rotl` Wasm operator.
    pub fn i64_rotl(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i64 as Integer<i64>>::rotl)
    }

    /// Execute the `i32.rotr` Wasm operator.
    pub fn i32_rotr(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i32 as Integer<i32>>::rotr)
    }

    /// Execute the `i64.rotr` Wasm operator.
    pub fn i64_rotr(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i64 as Integer<i64>>::rotr)
    }

    // Integer arithmetic.

    /// Execute the `i32.add` Wasm operator.
    pub fn i32_add(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i32 as ArithmeticOps<i32>>::add)
    }

    /// Execute the `i64.add` Wasm operator.
    pub fn i64_add(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i64 as ArithmeticOps<i64>>::add)
    }

    /// Execute the `i32.sub` Wasm operator.
    pub fn i32_sub(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i32 as ArithmeticOps<i32>>::sub)
    }

    /// Execute the `i64.sub` Wasm operator.
    pub fn i64_sub(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i64 as ArithmeticOps<i64>>::sub)
    }

    /// Execute the `i32.mul` Wasm operator.
    pub fn i32_mul(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i32 as ArithmeticOps<i32>>::mul)
    }

    /// Execute the `i64.mul` Wasm operator.
    pub fn i64_mul(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <i64 as ArithmeticOps<i64>>::mul)
    }

    /// Execute the `i32.div_s` Wasm operator.
    pub fn i32_div_s(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <i32 as ArithmeticOps<i32>>::div)
    }

    /// Execute the `i64.div_s` Wasm operator.
    pub fn i64_div_s(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <i64 as ArithmeticOps<i64>>::div)
    }

    /// Execute the `i32.div_u` Wasm operator.
    pub fn i32_div_u(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <u32 as ArithmeticOps<u32>>::div)
    }

    /// Execute the `i64.div_u` Wasm operator.
    pub fn i64_div_u(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <u64 as ArithmeticOps<u64>>::div)
    }

    /// Execute the `i32.rem_s` Wasm operator.
    pub fn i32_rem_s(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <i32 as Integer<i32>>::rem)
    }

    /// Execute the `i64.rem_s` Wasm operator.
    pub fn i64_rem_s(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <i64 as Integer<i64>>::rem)
    }

    /// Execute the `i32.rem_u` Wasm operator.
    pub fn i32_rem_u(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <u32 as Integer<u32>>::rem)
    }

    /// Execute the `i64.rem_u` Wasm operator.
    pub fn i64_rem_u(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <u64 as Integer<u64>>::rem)
    }

    // Integer bitwise ops and shifts. The shift amount is taken modulo
    // the operand width.

    /// Execute the `i32.and` Wasm operator.
    pub fn i32_and(self, rhs: Self) -> Self {
        self.execute_binary::<i32, _>(rhs, op!(&))
    }

    /// Execute the `i64.and` Wasm operator.
    pub fn i64_and(self, rhs: Self) -> Self {
        self.execute_binary::<i64, _>(rhs, op!(&))
    }

    /// Execute the `i32.or` Wasm operator.
    pub fn i32_or(self, rhs: Self) -> Self {
        self.execute_binary::<i32, _>(rhs, op!(|))
    }

    /// Execute the `i64.or` Wasm operator.
    pub fn i64_or(self, rhs: Self) -> Self {
        self.execute_binary::<i64, _>(rhs, op!(|))
    }

    /// Execute the `i32.xor` Wasm operator.
    pub fn i32_xor(self, rhs: Self) -> Self {
        self.execute_binary::<i32, _>(rhs, op!(^))
    }

    /// Execute the `i64.xor` Wasm operator.
    pub fn i64_xor(self, rhs: Self) -> Self {
        self.execute_binary::<i64, _>(rhs, op!(^))
    }

    /// Execute the `i32.shl` Wasm operator.
    pub fn i32_shl(self, rhs: Self) -> Self {
        self.execute_binary::<i32, _>(rhs, |lhs, rhs| lhs.shl(rhs & 0x1F))
    }

    /// Execute the `i64.shl` Wasm operator.
    pub fn i64_shl(self, rhs: Self) -> Self {
        self.execute_binary::<i64, _>(rhs, |lhs, rhs| lhs.shl(rhs & 0x3F))
    }

    /// Execute the `i32.shr_s` Wasm operator.
    pub fn i32_shr_s(self, rhs: Self) -> Self {
        self.execute_binary::<i32, _>(rhs, |lhs, rhs| lhs.shr(rhs & 0x1F))
    }

    /// Execute the `i64.shr_s` Wasm operator.
    pub fn i64_shr_s(self, rhs: Self) -> Self {
        self.execute_binary::<i64, _>(rhs, |lhs, rhs| lhs.shr(rhs & 0x3F))
    }

    /// Execute the `i32.shr_u` Wasm operator.
    pub fn i32_shr_u(self, rhs: Self) -> Self {
        self.execute_binary::<u32, _>(rhs, |lhs, rhs| lhs.shr(rhs & 0x1F))
    }

    /// Execute the `i64.shr_u` Wasm operator.
    pub fn i64_shr_u(self, rhs: Self) -> Self {
        self.execute_binary::<u64, _>(rhs, |lhs, rhs| lhs.shr(rhs & 0x3F))
    }

    // Float ops.

    /// Execute the `f32.abs` Wasm operator.
    pub fn f32_abs(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::abs)
    }

    /// Execute the `f32.neg` Wasm operator.
    pub fn f32_neg(self) -> Self {
        self.execute_unary(<F32 as Neg>::neg)
    }

    /// Execute the `f32.ceil` Wasm operator.
    pub fn f32_ceil(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::ceil)
    }

    /// Execute the `f32.floor` Wasm operator.
    pub fn f32_floor(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::floor)
    }

    /// Execute the `f32.trunc` Wasm operator.
    pub fn f32_trunc(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::trunc)
    }

    /// Execute the `f32.nearest` Wasm operator.
    pub fn f32_nearest(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::nearest)
    }

    /// Execute the `f32.sqrt` Wasm operator.
    pub fn f32_sqrt(self) -> Self {
        self.execute_unary(<F32 as Float<F32>>::sqrt)
    }

    /// Execute the `f32.add` Wasm operator.
    pub fn f32_add(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as ArithmeticOps<F32>>::add)
    }

    /// Execute the `f32.sub` Wasm operator.
    pub fn f32_sub(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as ArithmeticOps<F32>>::sub)
    }

    /// Execute the `f32.mul` Wasm operator.
    pub fn f32_mul(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as ArithmeticOps<F32>>::mul)
    }

    /// Execute the `f32.div` Wasm operator.
    pub fn f32_div(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <F32 as ArithmeticOps<F32>>::div)
    }

    /// Execute the `f32.min` Wasm operator.
    pub fn f32_min(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as Float<F32>>::min)
    }

    /// Execute the `f32.max` Wasm operator.
    pub fn f32_max(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as Float<F32>>::max)
    }

    /// Execute the `f32.copysign` Wasm operator.
    pub fn f32_copysign(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F32 as Float<F32>>::copysign)
    }

    /// Execute the `f64.abs` Wasm operator.
    pub fn f64_abs(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::abs)
    }

    /// Execute the `f64.neg` Wasm operator.
    pub fn f64_neg(self) -> Self {
        self.execute_unary(<F64 as Neg>::neg)
    }

    /// Execute the `f64.ceil` Wasm operator.
    pub fn f64_ceil(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::ceil)
    }

    /// Execute the `f64.floor` Wasm operator.
    pub fn f64_floor(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::floor)
    }

    /// Execute the `f64.trunc` Wasm operator.
    pub fn f64_trunc(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::trunc)
    }

    /// Execute the `f64.nearest` Wasm operator.
    pub fn f64_nearest(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::nearest)
    }

    /// Execute the `f64.sqrt` Wasm operator.
    pub fn f64_sqrt(self) -> Self {
        self.execute_unary(<F64 as Float<F64>>::sqrt)
    }

    /// Execute the `f64.add` Wasm operator.
    pub fn f64_add(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as ArithmeticOps<F64>>::add)
    }

    /// Execute the `f64.sub` Wasm operator.
    pub fn f64_sub(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as ArithmeticOps<F64>>::sub)
    }

    /// Execute the `f64.mul` Wasm operator.
    pub fn f64_mul(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as ArithmeticOps<F64>>::mul)
    }

    /// Execute the `f64.div` Wasm operator.
    pub fn f64_div(self, rhs: Self) -> Result<Self, TrapCode> {
        self.try_execute_binary(rhs, <F64 as ArithmeticOps<F64>>::div)
    }

    /// Execute the `f64.min` Wasm operator.
    pub fn f64_min(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as Float<F64>>::min)
    }

    /// Execute the `f64.max` Wasm operator.
    pub fn f64_max(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as Float<F64>>::max)
    }

    /// Execute the `f64.copysign` Wasm operator.
    pub fn f64_copysign(self, rhs: Self) -> Self {
        self.execute_binary(rhs, <F64 as Float<F64>>::copysign)
    }

    // Conversions.

    /// Execute the `i32.wrap_i64` Wasm operator.
    pub fn i32_wrap_i64(self) -> Self {
        self.execute_unary(<i64 as WrapInto<i32>>::wrap_into)
    }

    /// Execute the `i32.trunc_f32_s` Wasm operator.
    pub fn i32_trunc_f32_s(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F32 as TryTruncateInto<i32, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i32.trunc_f32_u` Wasm operator.
    pub fn i32_trunc_f32_u(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F32 as TryTruncateInto<u32, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i32.trunc_f64_s` Wasm operator.
    pub fn i32_trunc_f64_s(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F64 as TryTruncateInto<i32, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i32.trunc_f64_u` Wasm operator.
    pub fn i32_trunc_f64_u(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F64 as TryTruncateInto<u32, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i64.extend_i32_s` Wasm operator.
    pub fn i64_extend_i32_s(self) -> Self {
        self.execute_unary(<i32 as ExtendInto<i64>>::extend_into)
    }

    /// Execute the `i64.extend_i32_u` Wasm operator.
    pub fn i64_extend_i32_u(self) -> Self {
        self.execute_unary(<u32 as ExtendInto<i64>>::extend_into)
    }

    /// Execute the `i64.trunc_f32_s` Wasm operator.
    pub fn i64_trunc_f32_s(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F32 as TryTruncateInto<i64, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i64.trunc_f32_u` Wasm operator.
    pub fn i64_trunc_f32_u(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F32 as TryTruncateInto<u64, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i64.trunc_f64_s` Wasm operator.
    pub fn i64_trunc_f64_s(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F64 as TryTruncateInto<i64, TrapCode>>::try_truncate_into)
    }

    /// Execute the `i64.trunc_f64_u` Wasm operator.
    pub fn i64_trunc_f64_u(self) -> Result<Self, TrapCode> {
        self.try_execute_unary(<F64 as TryTruncateInto<u64, TrapCode>>::try_truncate_into)
    }

    /// Execute the `f32.convert_i32_s` Wasm operator.
    pub fn f32_convert_i32_s(self) -> Self {
        self.execute_unary(<i32 as ExtendInto<F32>>::extend_into)
    }

    /// Execute the `f32.convert_i32_u` Wasm operator.
    pub fn f32_convert_i32_u(self) -> Self {
        self.execute_unary(<u32 as ExtendInto<F32>>::extend_into)
    }

    /// Execute the `f32.convert_i64_s` Wasm operator.
    pub fn f32_convert_i64_s(self) -> Self {
        self.execute_unary(<i64 as WrapInto<F32>>::wrap_into)
    }

    /// Execute the `f32.convert_i64_u` Wasm operator.
    pub fn f32_convert_i64_u(self) -> Self {
        self.execute_unary(<u64 as WrapInto<F32>>::wrap_into)
    }

    /// Execute the `f32.demote_f64` Wasm operator.
    pub fn f32_demote_f64(self) -> Self {
        self.execute_unary(<F64 as WrapInto<F32>>::wrap_into)
    }

    /// Execute the `f64.convert_i32_s` Wasm operator.
    pub fn f64_convert_i32_s(self) -> Self {
        self.execute_unary(<i32 as ExtendInto<F64>>::extend_into)
    }

    /// Execute the `f64.convert_i32_u` Wasm operator.
    pub fn f64_convert_i32_u(self) -> Self {
        self.execute_unary(<u32 as ExtendInto<F64>>::extend_into)
    }

    /// Execute the `f64.convert_i64_s` Wasm operator.
    pub fn f64_convert_i64_s(self) -> Self {
        self.execute_unary(<i64 as ExtendInto<F64>>::extend_into)
    }

    /// Execute the `f64.convert_i64_u` Wasm operator.
    pub fn f64_convert_i64_u(self) -> Self {
        self.execute_unary(<u64 as ExtendInto<F64>>::extend_into)
    }

    /// Execute the `f64.promote_f32` Wasm operator.
    pub fn f64_promote_f32(self) -> Self {
        self.execute_unary(<F32 as ExtendInto<F64>>::extend_into)
    }

    // Reinterpretations preserve the stored bit pattern exactly.

    /// Execute the `i32.reinterpret_f32` Wasm operator.
    pub fn i32_reinterpret_f32(self) -> Self {
        self.execute_unary(<F32 as TransmuteInto<i32>>::transmute_into)
    }

    /// Execute the `i64.reinterpret_f64` Wasm operator.
    pub fn i64_reinterpret_f64(self) -> Self {
        self.execute_unary(<F64 as TransmuteInto<i64>>::transmute_into)
    }

    /// Execute the `f32.reinterpret_i32` Wasm operator.
    pub fn f32_reinterpret_i32(self) -> Self {
        self.execute_unary(<i32 as TransmuteInto<F32>>::transmute_into)
    }

    /// Execute the `f64.reinterpret_i64` Wasm operator.
    pub fn f64_reinterpret_i64(self) -> Self {
        self.execute_unary(<i64 as TransmuteInto<F64>>::transmute_into)
    }

    // Sign extension within an integer type.

    /// Execute the `i32.extend8_s` Wasm operator.
    pub fn i32_extend8_s(self) -> Self {
        self.execute_unary(<i32 as SignExtendFrom<i8>>::sign_extend_from)
    }

    /// Execute the `i32.extend16_s` Wasm operator.
    pub fn i32_extend16_s(self) -> Self {
        self.execute_unary(<i32 as SignExtendFrom<i16>>::sign_extend_from)
    }

    /// Execute the `i64.extend8_s` Wasm operator.
    pub fn i64_extend8_s(self) -> Self {
        self.execute_unary(<i64 as SignExtendFrom<i8>>::sign_extend_from)
    }

    /// Execute the `i64.extend16_s` Wasm operator.
    pub fn i64_extend16_s(self) -> Self {
        self.execute_unary(<i64 as SignExtendFrom<i16>>::sign_extend_from)
    }

    /// Execute the `i64.extend32_s` Wasm operator.
    pub fn i64_extend32_s(self) -> Self {
        self.execute_unary(<i64 as SignExtendFrom<i32>>::sign_extend_from)
    }

    // Saturating truncations.

    /// Execute the `i32.trunc_sat_f32_s` Wasm operator.
    pub fn i32_trunc_sat_f32_s(self) -> Self {
        self.execute_unary(<F32 as TruncateSaturateInto<i32>>::truncate_saturate_into)
    }

    /// Execute the `i32.trunc_sat_f32_u` Wasm operator.
    pub fn i32_trunc_sat_f32_u(self) -> Self {
        self.execute_unary(<F32 as TruncateSaturateInto<u32>>::truncate_saturate_into)
    }

    /// Execute the `i32.trunc_sat_f64_s` Wasm operator.
    pub fn i32_trunc_sat_f64_s(self) -> Self {
        self.execute_unary(<F64 as TruncateSaturateInto<i32>>::truncate_saturate_into)
    }

    /// Execute the `i32.trunc_sat_f64_u` Wasm operator.
    pub fn i32_trunc_sat_f64_u(self) -> Self {
        self.execute_unary(<F64 as TruncateSaturateInto<u32>>::truncate_saturate_into)
    }

    /// Execute the `i64.trunc_sat_f32_s` Wasm operator.
    pub fn i64_trunc_sat_f32_s(self) -> Self {
        self.execute_unary(<F32 as TruncateSaturateInto<i64>>::truncate_saturate_into)
    }

    /// Execute the `i64.trunc_sat_f32_u` Wasm operator.
    pub fn i64_trunc_sat_f32_u(self) -> Self {
        self.execute_unary(<F32 as TruncateSaturateInto<u64>>::truncate_saturate_into)
    }

    /// Execute the `i64.trunc_sat_f64_s` Wasm operator.
    pub fn i64_trunc_sat_f64_s(self) -> Self {
        self.execute_unary(<F64 as TruncateSaturateInto<i64>>::truncate_saturate_into)
    }

    /// Execute the `i64.trunc_sat_f64_u` Wasm operator.
    pub fn i64_trunc_sat_f64_u(self) -> Self {
        self.execute_unary(<F64 as TruncateSaturateInto<u64>>::truncate_saturate_into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_ints_are_sign_extended_in_cells() {
        let cell = UntypedValue::from(-1i32);
        assert_eq!(i32::from(cell), -1);
        assert_eq!(u32::from(cell), u32::MAX);
    }

    #[test]
    fn shift_amounts_are_masked() {
        let v = UntypedValue::from(1i32);
        assert_eq!(i32::from(v.i32_shl(UntypedValue::from(33i32))), 2);
        let v = UntypedValue::from(1i64);
        assert_eq!(i64::from(v.i64_shl(UntypedValue::from(65i64))), 2);
        let v = UntypedValue::from(i32::MIN);
        assert_eq!(
            u32::from(v.i32_shr_u(UntypedValue::from(32i32))),
            0x8000_0000
        );
    }

    #[test]
    fn div_s_overflow_traps() {
        let min = UntypedValue::from(i32::MIN);
        let minus_one = UntypedValue::from(-1i32);
        assert!(matches!(
            min.i32_div_s(minus_one),
            Err(TrapCode::IntegerOverflow)
        ));
        assert_eq!(i32::from(min.i32_rem_s(minus_one).unwrap()), 0);
    }

    #[test]
    fn reinterpret_preserves_bits() {
        let nan_bits = 0x7fc0_1234u32;
        let v = UntypedValue::from(F32::from_bits(nan_bits));
        assert_eq!(u32::from(v.i32_reinterpret_f32()), nan_bits);
        assert_eq!(F32::from(v.f32_reinterpret_i32()).to_bits(), nan_bits);
    }

    #[test]
    fn extend_within_type() {
        let v = UntypedValue::from(0x80u32 as i32);
        assert_eq!(i32::from(v.i32_extend8_s()), -128);
        let v = UntypedValue::from(0x8000_0000u64 as i64);
        assert_eq!(i64::from(v.i64_extend32_s()), i32::MIN as i64);
    }
}
