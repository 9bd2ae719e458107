/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Moving whole matrices between one process and the grid.

use crate::FailResult;
use crate::dist_matrix::DistMatrix;
use crate::local::Matrix;
use crate::scalar::Ring;

use gridmat_grid::{DistData, Grid, Pair};
use gridmat_transport::Transport;

/// Collective: the entire matrix on world rank `root`, and `None` elsewhere.
pub fn to_serial<T: Ring, C: Transport>(a: &DistMatrix<'_, T, C>, root: usize) -> FailResult<Option<Matrix<T>>>
{Ok({
    let grid = a.grid();
    let data = DistData::new(Pair::CIRC_CIRC, grid.shape()).with_root(root);
    let mut circ = DistMatrix::from_data(grid, data)?;
    a.redistribute_into(&mut circ)?;
    match grid.rank() == root {
        true => Some(circ.into_local()),
        false => None,
    }
})}

/// Collective: distributes a matrix that only world rank `root` has.
///
/// Other processes pass `None`; they learn the size from the root.
pub fn from_serial<'a, T: Ring, C: Transport>(
    grid: &'a Grid<C>,
    pair: Pair,
    root: usize,
    matrix: Option<&Matrix<T>>,
) -> FailResult<DistMatrix<'a, T, C>>
{Ok({
    let data = DistData::new(Pair::CIRC_CIRC, grid.shape()).with_root(root);
    let mut circ = DistMatrix::from_data(grid, data)?;
    let is_root = grid.rank() == root;
    let matrix = match (is_root, matrix) {
        (true, Some(matrix)) => Some(matrix),
        (true, None) => bail!("rank {} is the root, but has no matrix to distribute", root),
        (false, _) => None,
    };
    if let Some(matrix) = matrix {
        circ.resize(matrix.height(), matrix.width())?;
    }
    circ.make_size_consistent(root)?;
    if let Some(matrix) = matrix {
        circ.local_mut()?.copy_from(&matrix.as_ref());
    }

    let mut out = DistMatrix::new(grid, pair)?;
    circ.redistribute_into(&mut out)?;
    out
})}
