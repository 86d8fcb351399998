#![allow(non_snake_case)]
use num_traits::{Float, FloatConst, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display, LowerExp};

/// Core traits for internal floating point values.
///
/// This trait defines the bounds required of every scalar flowing through
/// the ADMM iteration.  `Send + Sync` are required since per-partition
/// updates may run on a thread pool.
pub trait CoreFloatT:
    'static
    + Send
    + Sync
    + Float
    + FloatConst
    + NumAssign
    + Default
    + FromPrimitive
    + Display
    + LowerExp
    + Debug
    + Sized
{
}

impl<T> CoreFloatT for T where
    T: 'static
        + Send
        + Sync
        + Float
        + FloatConst
        + NumAssign
        + Default
        + FromPrimitive
        + Display
        + LowerExp
        + Debug
        + Sized
{
}

cfg_if::cfg_if! {
    if #[cfg(feature="serde")] {
        /// Main trait for floating point types used in the solver.
        ///
        /// Implementations are provided for every type satisfying the
        /// bounds of `CoreFloatT`, which in practice means f32 and f64.
        /// With the "serde" feature, values must also be serializable so
        /// that problems and settings can be written to JSON.
        pub trait FloatT: CoreFloatT + serde::Serialize + serde::de::DeserializeOwned {}
        impl<T> FloatT for T where T: CoreFloatT + serde::Serialize + serde::de::DeserializeOwned {}
    } else {
        /// Main trait for floating point types used in the solver.
        ///
        /// Implementations are provided for every type satisfying the
        /// bounds of `CoreFloatT`, which in practice means f32 and f64.
        pub trait FloatT: CoreFloatT {}
        impl<T> FloatT for T where T: CoreFloatT {}
    }
}

/// Trait for converting Rust primitives to [`FloatT`](crate::algebra::FloatT)
///
/// Implemented on f32/64, u32/64 and usize so that constants can be written
/// as `(1e-5).as_T()` rather than `T::from_f64(1e-5).unwrap()`.  It is also
/// used by the [solver settings](crate::solver::AdmmSettings) for converting
/// builder defaults to [`FloatT`](crate::algebra::FloatT).
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! impl_as_FloatT {
    ($ty:ty, $ident:ident) => {
        impl<T> AsFloatT<T> for $ty
        where
            T: std::ops::Mul<T, Output = T> + FromPrimitive + 'static,
        {
            #[inline]
            fn as_T(&self) -> T {
                T::$ident(*self).unwrap()
            }
        }
    };
}
impl_as_FloatT!(u32, from_u32);
impl_as_FloatT!(u64, from_u64);
impl_as_FloatT!(usize, from_usize);
impl_as_FloatT!(f32, from_f32);
impl_as_FloatT!(f64, from_f64);
