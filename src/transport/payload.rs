/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use num_complex::Complex;

/// Element types that may be placed in a message.
///
/// # Safety
///
/// Implementors must be plain old data: no padding-sensitive invariants, no
/// pointers, and every bit pattern produced by a send must be valid on the
/// receiving end.  Byte-oriented backends copy these values as raw memory.
pub unsafe trait Payload: Copy + Send + Default + 'static {}

macro_rules! impl_payload {
    ($($T:ty),* $(,)*) => { $( unsafe impl Payload for $T {} )* };
}

impl_payload!{
    u8, u16, u32, u64, usize,
    i8, i16, i32, i64, isize,
    f32, f64,
    Complex<f32>, Complex<f64>,
}

/// Commutative, associative operators accepted by the reducing collectives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReduceOp { Sum, Max, Min }

/// Element types that can be combined by a [`ReduceOp`].
pub trait Reduce: Payload {
    fn combine(op: ReduceOp, a: Self, b: Self) -> Self;
}

macro_rules! impl_reduce_int {
    ($($T:ty),*) => {$(
        impl Reduce for $T {
            fn combine(op: ReduceOp, a: Self, b: Self) -> Self {
                match op {
                    // checksums rely on this wrapping rather than panicking
                    ReduceOp::Sum => a.wrapping_add(b),
                    ReduceOp::Max => a.max(b),
                    ReduceOp::Min => a.min(b),
                }
            }
        }
    )*};
}

macro_rules! impl_reduce_float {
    ($($T:ty),*) => {$(
        impl Reduce for $T {
            fn combine(op: ReduceOp, a: Self, b: Self) -> Self {
                match op {
                    ReduceOp::Sum => a + b,
                    ReduceOp::Max => if b > a { b } else { a },
                    ReduceOp::Min => if b < a { b } else { a },
                }
            }
        }
    )*};
}

impl_reduce_int!(u32, u64, usize, i32, i64);
impl_reduce_float!(f32, f64);
