//! # Tolerance-aware equality for change detection.
//!
//! [`NearlyEqual`] decides whether a freshly fetched value is different enough
//! from the cached one to be worth broadcasting.
//!
//! - `f64`: absolute tolerance [`F64_EPSILON`]
//! - `f32`: absolute tolerance [`F32_EPSILON`]
//! - integers, `bool`, `char`, `String`, `Duration`, `()`: exact equality
//! - [`Exact<T>`]: exact equality for any `PartialEq` type
//!
//! Floating point drift below the tolerance would otherwise cause a broadcast
//! on every refresh.

use std::time::Duration;

use crate::config::{F32_EPSILON, F64_EPSILON};

/// Equality with a tolerance that depends on the value's type.
///
/// Implement it for your own types to control when a
/// [`LiveValueCache`](crate::LiveValueCache) broadcasts:
///
/// ```
/// use relaykit::NearlyEqual;
///
/// #[derive(Clone, Default)]
/// struct Price { cents: i64 }
///
/// impl NearlyEqual for Price {
///     // Moves under a dollar are noise.
///     fn nearly_equal(&self, other: &Self) -> bool {
///         (self.cents - other.cents).abs() < 100
///     }
/// }
///
/// assert!(Price { cents: 1000 }.nearly_equal(&Price { cents: 1050 }));
/// assert!(!Price { cents: 1000 }.nearly_equal(&Price { cents: 1200 }));
/// ```
pub trait NearlyEqual {
    /// Returns `true` if `self` and `other` should be treated as the same value.
    fn nearly_equal(&self, other: &Self) -> bool;
}

impl NearlyEqual for f64 {
    fn nearly_equal(&self, other: &Self) -> bool {
        self == other
            || (self - other).abs() <= F64_EPSILON
            || (self.is_nan() && other.is_nan())
    }
}

impl NearlyEqual for f32 {
    fn nearly_equal(&self, other: &Self) -> bool {
        self == other
            || (self - other).abs() <= F32_EPSILON
            || (self.is_nan() && other.is_nan())
    }
}

macro_rules! impl_exact {
    ($($t:ty),* $(,)?) => {
        $(
            impl NearlyEqual for $t {
                #[inline]
                fn nearly_equal(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_exact!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String,
    Duration, ()
);

impl<T: NearlyEqual> NearlyEqual for Option<T> {
    fn nearly_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.nearly_equal(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: NearlyEqual> NearlyEqual for Vec<T> {
    fn nearly_equal(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.nearly_equal(b))
    }
}

/// Wrapper that compares any `PartialEq` value exactly.
///
/// ```
/// use relaykit::{Exact, NearlyEqual};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// enum Mode { #[default] Idle, Busy }
///
/// assert!(Exact(Mode::Idle).nearly_equal(&Exact(Mode::Idle)));
/// assert!(!Exact(Mode::Idle).nearly_equal(&Exact(Mode::Busy)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Exact<T>(pub T);

impl<T: PartialEq> NearlyEqual for Exact<T> {
    fn nearly_equal(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
