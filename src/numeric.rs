//! # Scalar
//!
//! Networks and populations are generic over a numeric type that is either a
//! fixed-width signed integer or a real. The [`Scalar`] trait collects what
//! both components need from such a type:
//!
//! - unchecked arithmetic for forward propagation (integers wrap, reals follow
//!   IEEE rules),
//! - overflow-aware arithmetic for roulette weights and crossover intervals,
//! - the minimum crossover spread (`1` for integers, `2ε` for reals),
//! - an optional sigmoid kernel, only present for reals,
//! - native-endian encoding for persistence.

use std::fmt::{Debug, Display};
use std::io::{self, Read, Write};

use rand::distributions::uniform::SampleUniform;

/// Numeric element type of network weights, genes and fitness values.
pub trait Scalar:
    Copy + PartialOrd + Debug + Display + Default + Send + Sync + SampleUniform + 'static
{
    const ZERO: Self;
    const ONE: Self;
    /// Width of the native-endian encoding, in bytes.
    const WIDTH: usize;
    /// Type name used in error messages.
    const NAME: &'static str;
    const IS_INTEGER: bool;
    /// Logistic kernel `1 / (1 + e^x)`; `None` for integer types.
    const SIGMOID: Option<fn(Self) -> Self>;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;

    fn saturating_add(self, rhs: Self) -> Self;
    fn saturating_sub(self, rhs: Self) -> Self;

    /// `None` on integer overflow or a non-finite real result.
    fn checked_add(self, rhs: Self) -> Option<Self>;
    /// `None` on integer overflow or a non-finite real result.
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    /// `|a - b| / 2`, computed without intermediate overflow.
    fn half_distance(a: Self, b: Self) -> Self;

    /// Smallest half-width a crossover interval may have.
    fn min_spread() -> Self;

    fn is_finite(self) -> bool;

    /// Whether `[min, max]` can be sampled uniformly. Any ordered integer
    /// range can; a real range additionally needs a finite width.
    fn is_sampleable(min: Self, max: Self) -> bool;

    fn write_ne<W: Write>(self, writer: &mut W) -> io::Result<()>;
    fn read_ne<R: Read>(reader: &mut R) -> io::Result<Self>;
}

/// Lesser of two partially ordered values, preferring `a` on ties.
pub(crate) fn min_of<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

/// Greater of two partially ordered values, preferring `a` on ties.
pub(crate) fn max_of<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

macro_rules! impl_integer_scalar {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const WIDTH: usize = std::mem::size_of::<$ty>();
            const NAME: &'static str = stringify!($ty);
            const IS_INTEGER: bool = true;
            const SIGMOID: Option<fn(Self) -> Self> = None;

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_mul(self, rhs: Self) -> Self {
                <$ty>::wrapping_mul(self, rhs)
            }

            fn saturating_add(self, rhs: Self) -> Self {
                <$ty>::saturating_add(self, rhs)
            }

            fn saturating_sub(self, rhs: Self) -> Self {
                <$ty>::saturating_sub(self, rhs)
            }

            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_add(self, rhs)
            }

            fn checked_sub(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_sub(self, rhs)
            }

            fn half_distance(a: Self, b: Self) -> Self {
                // abs_diff / 2 always fits back into the signed type.
                (a.abs_diff(b) / 2) as $ty
            }

            fn min_spread() -> Self {
                1
            }

            fn is_finite(self) -> bool {
                true
            }

            fn is_sampleable(min: Self, max: Self) -> bool {
                min <= max
            }

            fn write_ne<W: Write>(self, writer: &mut W) -> io::Result<()> {
                writer.write_all(&self.to_ne_bytes())
            }

            fn read_ne<R: Read>(reader: &mut R) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                reader.read_exact(&mut bytes)?;
                Ok(<$ty>::from_ne_bytes(bytes))
            }
        }
    )*};
}

macro_rules! impl_real_scalar {
    ($($ty:ident),*) => {$(
        impl Scalar for $ty {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const WIDTH: usize = std::mem::size_of::<$ty>();
            const NAME: &'static str = stringify!($ty);
            const IS_INTEGER: bool = false;
            const SIGMOID: Option<fn(Self) -> Self> = Some(|x: $ty| 1.0 / (1.0 + x.exp()));

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn wrapping_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            fn saturating_add(self, rhs: Self) -> Self {
                self + rhs
            }

            fn saturating_sub(self, rhs: Self) -> Self {
                self - rhs
            }

            fn checked_add(self, rhs: Self) -> Option<Self> {
                Some(self + rhs).filter(|sum| sum.is_finite())
            }

            fn checked_sub(self, rhs: Self) -> Option<Self> {
                Some(self - rhs).filter(|diff| diff.is_finite())
            }

            fn half_distance(a: Self, b: Self) -> Self {
                (a / 2.0 - b / 2.0).abs()
            }

            fn min_spread() -> Self {
                $ty::EPSILON * 2.0
            }

            fn is_finite(self) -> bool {
                $ty::is_finite(self)
            }

            fn is_sampleable(min: Self, max: Self) -> bool {
                // rand scales the width by 1 / (1 - ε) and rejects an infinite result.
                min <= max && ((max - min) / (1.0 - $ty::EPSILON)).is_finite()
            }

            fn write_ne<W: Write>(self, writer: &mut W) -> io::Result<()> {
                writer.write_all(&self.to_ne_bytes())
            }

            fn read_ne<R: Read>(reader: &mut R) -> io::Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                reader.read_exact(&mut bytes)?;
                Ok($ty::from_ne_bytes(bytes))
            }
        }
    )*};
}

impl_integer_scalar!(i32, i64);
impl_real_scalar!(f32, f64);
