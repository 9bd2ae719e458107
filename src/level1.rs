/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Entrywise operations.
//!
//! None of these communicate.  Operations on two matrices need compatible
//! descriptors (see [`DistMatrix::align_with`]), and fail with
//! [`AlignmentError`] otherwise.  Operands from grids of different shapes
//! fail with `GridMismatchError`.

use crate::FailResult;
use crate::dist_matrix::DistMatrix;
use crate::errors::{AlignmentError, BoundsError};
use crate::scalar::Ring;

use gridmat_transport::Transport;

pub fn fill<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>, value: T) -> FailResult<()>
{Ok({
    a.local_mut()?.fill(value);
})}

pub fn zero<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{ fill(a, T::zero()) }

/// `a *= alpha`
pub fn scale<T: Ring, C: Transport>(alpha: T, a: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{ entrywise_map(a, |x| alpha * x) }

/// Adds `alpha` to every entry.
pub fn shift<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>, alpha: T) -> FailResult<()>
{ entrywise_map(a, |x| x + alpha) }

/// Adds `alpha` to every diagonal entry.
pub fn shift_diagonal<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>, alpha: T) -> FailResult<()>
{Ok({
    let (rows, cols) = a.local_globals();
    a.local_mut()?.for_each_mut(|i, j, x| if rows[i] == cols[j] {
        *x += alpha;
    });
})}

pub fn entrywise_map<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>, f: impl Fn(T) -> T) -> FailResult<()>
{Ok({
    a.local_mut()?.for_each_mut(|_, _, x| *x = f(*x));
})}

pub fn conjugate<T: Ring, C: Transport>(a: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{ entrywise_map(a, Ring::conj) }

/// `y += alpha * x`
pub fn axpy<T: Ring, C: Transport>(alpha: T, x: &DistMatrix<'_, T, C>, y: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{Ok({
    check_conformal(x, y)?;
    let x_local = x.local();
    y.local_mut()?.for_each_mut(|i, j, entry| *entry += alpha * x_local[(i, j)]);
})}

/// Hadamard product, `y[i,j] *= x[i,j]`.
pub fn hadamard<T: Ring, C: Transport>(x: &DistMatrix<'_, T, C>, y: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{Ok({
    check_conformal(x, y)?;
    let x_local = x.local();
    y.local_mut()?.for_each_mut(|i, j, entry| *entry *= x_local[(i, j)]);
})}

fn check_conformal<T: Ring, C: Transport>(x: &DistMatrix<'_, T, C>, y: &DistMatrix<'_, T, C>) -> FailResult<()>
{Ok({
    x.grid().check_same(y.grid().shape())?;
    if x.dims() != y.dims() {
        throw!(BoundsError::new(format!(
            "operands are {}x{} and {}x{}", x.height(), x.width(), y.height(), y.width(),
        )));
    }
    if !x.dist_data().compatible(y.dist_data()) {
        throw!(AlignmentError::new(format!(
            "{} operand with alignments ({}, {}) and {} operand with alignments ({}, {})",
            x.pair(), x.col_align(), x.row_align(),
            y.pair(), y.col_align(), y.row_align(),
        )));
    }
})}
