/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Moving a matrix from one distribution to another.
//!
//! A redistribution looks up the route for its pair of distributions and
//! runs it step by step, staging through temporary matrices.  Temporaries are
//! aligned after the destination where that is possible, so that the final
//! step moves as little as it can.

pub use self::routes::{Route, Shape, Step, direct, route};

mod routes;
mod shapes;
mod transfer;

use crate::FailResult;
use crate::dist_matrix::{DistMatrix, adopt_root, derived_dim};
use crate::errors::{ConfigurationError, ViewError};
use crate::scalar::Ring;

use gridmat_grid::{Dim, Dist, DistData, Pair};
use gridmat_transport::Transport;

impl<'a, T: Ring, C: Transport> DistMatrix<'a, T, C> {
    /// Collective: copies every entry into `dest`, in `dest`'s distribution.
    ///
    /// `dest` is resized to match.  Alignments of `dest` that were never
    /// constrained are first adopted from `self` where that is free.
    pub fn redistribute_into(&self, dest: &mut DistMatrix<'_, T, C>) -> FailResult<()>
    { redistribute(self, dest) }

    /// Collective: a new matrix with the given distribution and the same entries.
    pub fn redistribute(&self, pair: Pair) -> FailResult<DistMatrix<'a, T, C>>
    {Ok({
        let mut out = DistMatrix::new(self.grid(), pair)?;
        redistribute(self, &mut out)?;
        out
    })}
}

/// See [`DistMatrix::redistribute_into`].
pub fn redistribute<T: Ring, C: Transport>(src: &DistMatrix<'_, T, C>, dest: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{Ok({
    let grid = src.grid();
    grid.check_same(dest.grid().shape())?;
    if dest.is_locked() {
        throw!(ViewError::new(format!("cannot redistribute into a locked {} view", dest.pair())));
    }
    dest.adopt_unconstrained(src.dist_data())?;
    dest.resize(src.height(), src.width())?;

    if src.height() == 0 || src.width() == 0 {
        return Ok(());
    }
    if grid.size() == 1 {
        trace!("Copying a {}x{} {} matrix to {} locally", src.height(), src.width(), src.pair(), dest.pair());
        dest.local_mut()?.copy_from(&src.local());
        return Ok(());
    }

    let route = route(src.pair(), dest.pair(), grid.shape().is_square());
    if route.general_purpose {
        if !grid.policy().allow_general_purpose {
            throw!(ConfigurationError::new(format!(
                "{} to {} needs the general-purpose route, which is disabled",
                src.pair(), dest.pair(),
            )));
        }
        warn!("{} to {} goes through a single process", src.pair(), dest.pair());
    }
    debug!("Redistributing a {}x{} matrix: {}", src.height(), src.width(), route);

    let last = route.steps.len() - 1;
    let mut staged: Option<DistMatrix<'_, T, C>> = None;
    for (index, step) in route.steps.iter().enumerate() {
        let from = staged.as_ref().unwrap_or(src);
        if index == last {
            shapes::execute(step.shape, from, dest)?;
        } else {
            let data = intermediate_data(step.to, from.dist_data(), dest.dist_data());
            let mut next = DistMatrix::from_data(grid, data)?;
            next.resize(src.height(), src.width())?;
            shapes::execute(step.shape, from, &mut next)?;
            staged = Some(next);
        }
    }
})}

/// Descriptor for a temporary of the given pair between `src` and `dest`.
///
/// Block sizes come from `src`.  Each alignment follows `dest` when some
/// dimension of `dest` determines it, and `src` otherwise.
pub(crate) fn intermediate_data(pair: Pair, src: &DistData, dest: &DistData) -> DistData
{
    let mut data = DistData::new(pair, src.grid)
        .with_blocks(src.block_height, src.block_width)
        .with_cuts(src.col_cut, src.row_cut);

    for &dim in &Dim::BOTH {
        let target = data.dim(dim);
        if target.dist == Dist::Star || target.dist == Dist::Circ {
            continue;
        }
        let fits = |other: &DistData| derived_dim(target.dist, other)
            .filter(|derived| (derived.block, derived.cut) == (target.block, target.cut))
            .map(|derived| derived.align);
        if let Some(align) = fits(dest).or_else(|| fits(src)) {
            data.set_align(dim, align);
        }
    }
    if !adopt_root(&mut data, dest) {
        adopt_root(&mut data, src);
    }
    data
}
