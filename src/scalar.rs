/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use gridmat_transport::{Payload, Reduce};

use num_complex::Complex;
use num_traits::{One, Zero};

use std::fmt::Debug;
use std::ops::{AddAssign, MulAssign, Neg, Sub};

/// Element types of distributed matrices.
///
/// The redistribution engine only needs `Payload`; the rest is what the
/// elementwise operations and norms use.
pub trait Ring
    : Payload + Debug + PartialEq
    + Zero + One + Neg<Output=Self> + Sub<Output=Self>
    + AddAssign + MulAssign
{
    /// The type of absolute values.
    type Real: Ring + Reduce + PartialOrd;

    fn conj(self) -> Self;
    fn abs(self) -> Self::Real;
    /// `|x|^2`, without the square root.
    fn abs_sqr(self) -> Self::Real;
    fn from_real(x: Self::Real) -> Self;
}

macro_rules! impl_real_ring {
    ($($T:ty),*) => {$(
        impl Ring for $T {
            type Real = $T;

            #[inline] fn conj(self) -> Self { self }
            #[inline] fn abs(self) -> Self { <$T>::abs(self) }
            #[inline] fn abs_sqr(self) -> Self { self * self }
            #[inline] fn from_real(x: Self) -> Self { x }
        }
    )*};
}

impl_real_ring!(f32, f64, i32, i64);

macro_rules! impl_complex_ring {
    ($($F:ty),*) => {$(
        impl Ring for Complex<$F> {
            type Real = $F;

            #[inline] fn conj(self) -> Self { Complex::conj(&self) }
            #[inline] fn abs(self) -> $F { self.norm() }
            #[inline] fn abs_sqr(self) -> $F { self.norm_sqr() }
            #[inline] fn from_real(x: $F) -> Self { Complex::new(x, 0.0) }
        }
    )*};
}

impl_complex_ring!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_ring() {
        let z = Complex::new(3.0_f64, -4.0);
        assert_eq!(Ring::abs(z), 5.0);
        assert_eq!(z.abs_sqr(), 25.0);
        assert_eq!(Ring::conj(z), Complex::new(3.0, 4.0));
        assert_eq!(Complex::<f64>::from_real(2.0), Complex::new(2.0, 0.0));
    }

    #[test]
    fn integer_ring() {
        assert_eq!(Ring::abs(-3_i64), 3);
        assert_eq!((-3_i32).abs_sqr(), 9);
    }
}
