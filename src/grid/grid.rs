/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{ConfigurationError, FailResult, GridMismatchError};

use gridmat_config::{RedistributionSettings, Settings};
use gridmat_transport::{Communicator, Transport};

use num_integer::Integer;

use std::fmt;

/// The shape of an r×c process grid, together with the pure functions that
/// relate ranks to grid coordinates.
///
/// World ranks are assigned to coordinates column-major, so the world rank
/// of a process is also its VC rank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub height: usize,
    pub width: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self { Coord { row, col } }

    pub fn get(&self, axis: Axis) -> usize
    { match axis { Axis::Row => self.row, Axis::Col => self.col } }
}

/// A direction in the process grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis { Row, Col }

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::Row, Axis::Col];
}

/// Named orderings of all the processes of a grid.
///
/// `Mc` and `Vr` enumerate the grid row by row; `Mr` and `Vc` enumerate it
/// column by column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Linearization { Mc, Mr, Vc, Vr }

impl GridShape {
    pub fn new(height: usize, width: usize) -> FailResult<Self>
    {Ok({
        if height == 0 || width == 0 {
            throw!(ConfigurationError::new(format!("a {}x{} process grid is empty", height, width)));
        }
        GridShape { height, width }
    })}

    pub fn size(&self) -> usize { self.height * self.width }

    pub fn extent(&self, axis: Axis) -> usize
    { match axis { Axis::Row => self.height, Axis::Col => self.width } }

    pub fn is_square(&self) -> bool { self.height == self.width }

    /// Number of distinct diagonal paths.
    pub fn gcd(&self) -> usize { self.height.gcd(&self.width) }

    /// Number of processes on each diagonal path.
    pub fn lcm(&self) -> usize { self.height.lcm(&self.width) }

    pub fn coord(&self, rank: usize) -> Coord
    { Coord { row: rank % self.height, col: rank / self.height } }

    pub fn rank(&self, coord: Coord) -> usize
    { coord.row + coord.col * self.height }

    pub fn linear_rank(&self, order: Linearization, coord: Coord) -> usize
    {
        match order {
            Linearization::Mc | Linearization::Vr => coord.col + coord.row * self.width,
            Linearization::Mr | Linearization::Vc => coord.row + coord.col * self.height,
        }
    }

    pub fn vc_rank(&self, coord: Coord) -> usize
    { self.linear_rank(Linearization::Vc, coord) }

    pub fn vr_rank(&self, coord: Coord) -> usize
    { self.linear_rank(Linearization::Vr, coord) }

    pub fn vc_coord(&self, vc: usize) -> Coord
    { Coord { row: vc % self.height, col: vc / self.height } }

    pub fn vr_coord(&self, vr: usize) -> Coord
    { Coord { row: vr / self.width, col: vr % self.width } }

    /// The diagonal path a process lies on.
    ///
    /// Path `p` visits the processes `(k mod r, (p + k) mod c)` for `k` in `0..lcm`.
    pub fn diag_path(&self, coord: Coord) -> usize
    {
        let g = self.gcd();
        (coord.col + g - coord.row % g) % g
    }

    /// The `k`-th process along diagonal path `path`.
    pub fn diag_coord(&self, path: usize, k: usize) -> Coord
    { Coord { row: k % self.height, col: (path + k) % self.width } }

    /// Position of a process along a diagonal path, if it lies on it.
    pub fn diag_rank(&self, path: usize, coord: Coord) -> Option<usize>
    {
        if self.diag_path(coord) != path % self.gcd() {
            return None;
        }
        (0..self.lcm() / self.height)
            .map(|t| coord.row + t * self.height)
            .find(|&k| (path + k) % self.width == coord.col)
    }

    /// Picks the squarest grid for a process count.
    pub fn squarest(size: usize) -> FailResult<Self>
    {
        let mut height = (size as f64).sqrt() as usize;
        while height > 1 && size % height != 0 {
            height -= 1;
        }
        GridShape::new(height.max(1), size / height.max(1))
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    { write!(f, "{}x{}", self.height, self.width) }
}

/// Grid-wide rules for the redistribution engine.
///
/// These must be identical on every process.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RedistPolicy {
    pub allow_general_purpose: bool,
}

impl Default for RedistPolicy {
    fn default() -> Self
    { RedistPolicy::from(&RedistributionSettings::default()) }
}

impl<'a> From<&'a RedistributionSettings> for RedistPolicy {
    fn from(settings: &'a RedistributionSettings) -> Self
    { RedistPolicy { allow_general_purpose: settings.allow_general_purpose } }
}

/// The groups of processes that collectives can be scoped to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Just this process.
    Own,
    /// The processes in this process's grid column, ordered by row.
    Mc,
    /// The processes in this process's grid row, ordered by column.
    Mr,
    /// Every process, in VC order.
    Vc,
    /// Every process, in VR order.
    Vr,
    /// The processes on a diagonal path, in path order.
    Md(usize),
}

impl Scope {
    fn context(self) -> u16 {
        match self {
            Scope::Vc => 1,
            Scope::Vr => 2,
            Scope::Mc => 3,
            Scope::Mr => 4,
            Scope::Md(_) => 5,
            Scope::Own => 6,
        }
    }

    /// The grid axes along which members of this scope differ.
    pub fn varies(self, axis: Axis) -> bool
    {
        match (self, axis) {
            (Scope::Own, _) => false,
            (Scope::Mc, Axis::Row) => true,
            (Scope::Mc, Axis::Col) => false,
            (Scope::Mr, Axis::Row) => false,
            (Scope::Mr, Axis::Col) => true,
            (Scope::Vc, _) | (Scope::Vr, _) | (Scope::Md(_), _) => true,
        }
    }
}

/// An r×c arrangement of the processes of a transport.
///
/// Every distributed matrix refers to (and never copies) the grid it lives on.
pub struct Grid<C> {
    transport: C,
    shape: GridShape,
    policy: RedistPolicy,
}

impl<C: Transport> Grid<C> {
    /// Fails if `height * width` is not the number of processes.
    pub fn with_shape(transport: C, height: usize, width: usize) -> FailResult<Self>
    {Ok({
        let shape = GridShape::new(height, width)?;
        if shape.size() != transport.size() {
            throw!(ConfigurationError::new(format!(
                "a {} grid needs {} processes, but there are {}",
                shape, shape.size(), transport.size(),
            )));
        }
        debug!("rank {} joins a {} process grid", transport.rank(), shape);
        Grid { transport, shape, policy: RedistPolicy::default() }
    })}

    /// A grid of the given height; the width follows from the process count.
    pub fn new(transport: C, height: usize) -> FailResult<Self>
    {
        let size = transport.size();
        if height == 0 || size % height != 0 {
            throw!(ConfigurationError::new(format!(
                "{} processes cannot be arranged into {} rows", size, height,
            )));
        }
        Grid::with_shape(transport, height, size / height)
    }

    pub fn squarest(transport: C) -> FailResult<Self>
    {
        let shape = GridShape::squarest(transport.size())?;
        Grid::with_shape(transport, shape.height, shape.width)
    }

    pub fn from_settings(transport: C, settings: &Settings) -> FailResult<Self>
    {Ok({
        let grid = match settings.grid.height {
            Some(height) => Grid::new(transport, height)?,
            None => Grid::squarest(transport)?,
        };
        grid.with_policy(RedistPolicy::from(&settings.redistribution))
    })}

    pub fn with_policy(mut self, policy: RedistPolicy) -> Self
    { self.policy = policy; self }

    pub fn policy(&self) -> RedistPolicy { self.policy }
    pub fn shape(&self) -> GridShape { self.shape }
    pub fn height(&self) -> usize { self.shape.height }
    pub fn width(&self) -> usize { self.shape.width }
    pub fn size(&self) -> usize { self.shape.size() }
    pub fn transport(&self) -> &C { &self.transport }

    /// This process's world rank (which is also its VC rank).
    pub fn rank(&self) -> usize { self.transport.rank() }

    pub fn coord(&self) -> Coord { self.shape.coord(self.rank()) }

    /// Fails with [`GridMismatchError`] unless `other` has this grid's shape.
    pub fn check_same(&self, other: GridShape) -> FailResult<()>
    {Ok({
        if other != self.shape {
            throw!(GridMismatchError::new(self.shape, other));
        }
    })}

    /// Processes of a scope, as world ranks in communicator order.
    pub fn members(&self, scope: Scope) -> Vec<usize>
    {
        let shape = self.shape;
        let me = self.coord();
        match scope {
            Scope::Own => vec![self.rank()],
            Scope::Mc => (0..shape.height).map(|row| shape.rank(Coord { row, col: me.col })).collect(),
            Scope::Mr => (0..shape.width).map(|col| shape.rank(Coord { row: me.row, col })).collect(),
            Scope::Vc => (0..shape.size()).map(|vc| shape.rank(shape.vc_coord(vc))).collect(),
            Scope::Vr => (0..shape.size()).map(|vr| shape.rank(shape.vr_coord(vr))).collect(),
            Scope::Md(path) => (0..shape.lcm()).map(|k| shape.rank(shape.diag_coord(path, k))).collect(),
        }
    }

    /// A communicator over one of this process's scopes.
    ///
    /// Fails for a diagonal path this process is not on.
    pub fn comm(&self, scope: Scope) -> FailResult<Communicator<'_, C>>
    { Communicator::new(&self.transport, scope.context(), self.members(scope)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmat_transport::ThreadComm;
    use std::collections::BTreeSet;

    #[test]
    fn coordinates_round_trip() {
        let shape = GridShape::new(2, 3).unwrap();
        for rank in 0..6 {
            assert_eq!(shape.rank(shape.coord(rank)), rank);
        }
        assert_eq!(shape.coord(3), Coord::new(1, 1));
        assert_eq!(shape.vr_rank(Coord::new(1, 0)), 3);
        assert_eq!(shape.vc_rank(Coord::new(1, 0)), 1);
    }

    #[test]
    fn linearizations_are_bijections() {
        for &(r, c) in &[(1, 1), (2, 2), (2, 3), (3, 2), (1, 5), (4, 6)] {
            let shape = GridShape::new(r, c).unwrap();
            for &order in &[Linearization::Mc, Linearization::Mr, Linearization::Vc, Linearization::Vr] {
                let ranks: BTreeSet<_> = (0..r).flat_map(|row| (0..c).map(move |col| Coord { row, col }))
                    .map(|coord| shape.linear_rank(order, coord))
                    .collect();
                assert_eq!(ranks, (0..r * c).collect(), "{:?} on {}", order, shape);
            }
        }
    }

    #[test]
    fn diagonal_paths_partition_the_grid() {
        for &(r, c) in &[(2, 2), (2, 3), (4, 6), (3, 3), (1, 4)] {
            let shape = GridShape::new(r, c).unwrap();
            let mut seen = BTreeSet::new();
            for path in 0..shape.gcd() {
                for k in 0..shape.lcm() {
                    let coord = shape.diag_coord(path, k);
                    assert_eq!(shape.diag_path(coord), path);
                    assert_eq!(shape.diag_rank(path, coord), Some(k));
                    assert!(seen.insert(coord));
                }
            }
            assert_eq!(seen.len(), shape.size());
        }
    }

    #[test]
    fn squarest_shapes() {
        let shapes: Vec<_> = [1, 2, 4, 6, 7, 12].iter()
            .map(|&p| GridShape::squarest(p).unwrap())
            .map(|s| (s.height, s.width))
            .collect();
        assert_eq!(shapes, vec![(1, 1), (1, 2), (2, 2), (2, 3), (1, 7), (3, 4)]);
    }

    #[test]
    fn wrong_size_is_a_configuration_error() {
        let transport = ThreadComm::world(4).pop().unwrap();
        let err = Grid::with_shape(transport, 3, 1).err().unwrap();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());

        let transport = ThreadComm::world(4).pop().unwrap();
        assert!(Grid::new(transport, 3).is_err());
    }

    #[test]
    fn mismatched_grids() {
        let transport = ThreadComm::world(6).pop().unwrap();
        let grid = Grid::new(transport, 2).unwrap();
        grid.check_same(GridShape::new(2, 3).unwrap()).unwrap();
        let err = grid.check_same(GridShape::new(3, 2).unwrap()).unwrap_err();
        assert!(err.downcast_ref::<GridMismatchError>().is_some());
    }

    #[test]
    fn scope_members() {
        // rank 3 of a 2x3 grid is at (1, 1)
        let transport = ThreadComm::world(6).remove(3);
        let grid = Grid::new(transport, 2).unwrap();
        assert_eq!(grid.coord(), Coord::new(1, 1));
        assert_eq!(grid.members(Scope::Mc), vec![2, 3]);
        assert_eq!(grid.members(Scope::Mr), vec![1, 3, 5]);
        assert_eq!(grid.members(Scope::Vr), vec![0, 2, 4, 1, 3, 5]);
        assert_eq!(grid.members(Scope::Own), vec![3]);
        assert_eq!(grid.comm(Scope::Mr).unwrap().rank(), 1);
        assert_eq!(grid.comm(Scope::Vr).unwrap().rank(), 4);
    }
}
