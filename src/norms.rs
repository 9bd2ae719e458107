/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Norms and extrema.
//!
//! All of these are collective, and every process gets the same value.
//! Partial results are combined first among the processes that split the
//! rows, then among those that split the columns; processes that hold
//! nothing receive the result from one that does.

use crate::FailResult;
use crate::dist_matrix::DistMatrix;
use crate::errors::BoundsError;
use crate::scalar::Ring;

use gridmat_grid::{Dim, Dist, Scope};
use gridmat_transport::{Reduce, ReduceOp, Transport};

use num_traits::{Bounded, Float, Zero};

fn dim_scope(dist: Dist, root: usize) -> Scope
{
    match dist {
        Dist::Mc => Scope::Mc,
        Dist::Mr => Scope::Mr,
        Dist::Vc => Scope::Vc,
        Dist::Vr => Scope::Vr,
        Dist::Md => Scope::Md(root),
        Dist::Star | Dist::Circ => Scope::Own,
    }
}

/// Combines `data` over the processes that hold different indices along `dim`.
fn combine<X: Reduce, T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>, dim: Dim, data: Vec<X>, op: ReduceOp) -> FailResult<Vec<X>>
{
    let scope = dim_scope(a.dist_data().dim(dim).dist, a.root());
    if scope == Scope::Own || !a.participating() {
        return Ok(data);
    }
    a.grid().comm(scope)?.all_reduce(data, op)
}

fn combine_one<X: Reduce, T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>, dim: Dim, value: X, op: ReduceOp) -> FailResult<X>
{ Ok(combine(a, dim, vec![value], op)?[0]) }

/// Hands the participants' result to everybody else.
fn finish<X: Reduce, T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>, value: X) -> FailResult<X>
{Ok({
    let data = a.dist_data();
    let everyone = (0..data.grid.size()).all(|rank| data.participates(data.grid.coord(rank)));
    if everyone {
        return Ok(value);
    }
    let lead = data.grid.rank(data.lead());
    let world = a.grid().comm(Scope::Vc)?;
    let value = match world.rank() == lead {
        true => Some(vec![value]),
        false => None,
    };
    world.broadcast(lead, value)?[0]
})}

/// Largest absolute value of any entry; zero for an empty matrix.
pub fn max_abs<T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>) -> FailResult<T::Real>
{Ok({
    let mut local = T::Real::zero();
    for column in a.local().columns() {
        for &x in column {
            let x = x.abs();
            if x > local {
                local = x;
            }
        }
    }
    let value = combine_one(a, Dim::Height, local, ReduceOp::Max)?;
    let value = combine_one(a, Dim::Width, value, ReduceOp::Max)?;
    finish(a, value)?
})}

/// Largest entry.  Fails with [`BoundsError`] for an empty matrix.
pub fn max<T, C>(a: &DistMatrix<'_, T, C>) -> FailResult<T>
where
    T: Ring + Reduce + PartialOrd + Bounded,
    C: Transport,
{Ok({
    if a.height() == 0 || a.width() == 0 {
        throw!(BoundsError::new("the maximum of an empty matrix"));
    }
    let mut local = T::min_value();
    for column in a.local().columns() {
        for &x in column {
            if x > local {
                local = x;
            }
        }
    }
    let value = combine_one(a, Dim::Height, local, ReduceOp::Max)?;
    let value = combine_one(a, Dim::Width, value, ReduceOp::Max)?;
    finish(a, value)?
})}

/// Largest absolute column sum.
pub fn one_norm<T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>) -> FailResult<T::Real>
{Ok({
    let local = a.local();
    let sums: Vec<T::Real> = local.columns().map(|column| {
        column.iter().fold(T::Real::zero(), |acc, &x| acc + x.abs())
    }).collect();
    let sums = combine(a, Dim::Height, sums, ReduceOp::Sum)?;
    let local_max = sums.into_iter().fold(T::Real::zero(), |acc, x| if x > acc { x } else { acc });
    let value = combine_one(a, Dim::Width, local_max, ReduceOp::Max)?;
    finish(a, value)?
})}

/// Largest absolute row sum.
pub fn infinity_norm<T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>) -> FailResult<T::Real>
{Ok({
    let local = a.local();
    let mut sums = vec![T::Real::zero(); local.height()];
    for column in local.columns() {
        for (sum, &x) in sums.iter_mut().zip(column) {
            *sum += x.abs();
        }
    }
    let sums = combine(a, Dim::Width, sums, ReduceOp::Sum)?;
    let local_max = sums.into_iter().fold(T::Real::zero(), |acc, x| if x > acc { x } else { acc });
    let value = combine_one(a, Dim::Height, local_max, ReduceOp::Max)?;
    finish(a, value)?
})}

pub fn frobenius_norm<T, C>(a: &DistMatrix<'_, T, C>) -> FailResult<T::Real>
where
    T: Ring,
    T::Real: Float,
    C: Transport,
{Ok({
    let mut local = T::Real::zero();
    for column in a.local().columns() {
        for &x in column {
            local += x.abs_sqr();
        }
    }
    let value = combine_one(a, Dim::Height, local, ReduceOp::Sum)?;
    let value = combine_one(a, Dim::Width, value, ReduceOp::Sum)?;
    finish(a, value)?.sqrt()
})}
