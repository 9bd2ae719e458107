/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Distribution descriptors.

use crate::{Axis, BlockCyclic, ConfigurationError, Coord, Dist, FailResult, GridShape, Pair, Scope};

/// Where a process keeps its local entries.
///
/// Only host memory is implemented; the field exists so that descriptors can
/// say so, and it is deliberately ignored by [`DistData::compatible`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Device { Cpu }

impl Default for Device {
    fn default() -> Self { Device::Cpu }
}

/// A dimension of a matrix.
///
/// `Height` is indexed by row indices and governed by the column
/// distribution; `Width` is indexed by column indices and governed by the
/// row distribution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Dim { Height, Width }

impl Dim {
    pub const BOTH: [Dim; 2] = [Dim::Height, Dim::Width];
}

/// The part of a descriptor that concerns one dimension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DimData {
    pub dist: Dist,
    pub block: usize,
    pub cut: usize,
    pub align: usize,
}

/// How the coordinate of an entry's holder along one grid axis is determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Projection {
    /// Every coordinate along the axis holds the entry.
    Free,
    /// Only this coordinate holds anything.
    Fixed(usize),
    /// `(block index of the entry along dim + offset) mod modulus`
    Cyclic { dim: Dim, modulus: usize, offset: usize, block: usize, cut: usize },
    /// Determined by the index, but not in a form shared with other distributions.
    Opaque { dim: Dim, dist: Dist, align: usize, block: usize, cut: usize },
}

/// Everything needed to say which process holds which entry of a matrix.
///
/// `root` is the world rank of the owner for `[CIRC,CIRC]` and the diagonal
/// path for the `MD` distributions.  Processes off the root (or off the path)
/// hold nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DistData {
    pub col_dist: Dist,
    pub row_dist: Dist,
    pub block_height: usize,
    pub block_width: usize,
    pub col_align: usize,
    pub row_align: usize,
    pub col_cut: usize,
    pub row_cut: usize,
    pub root: usize,
    pub grid: GridShape,
    pub device: Device,
}

impl DistData {
    /// Element-cyclic, aligned at zero, rooted at zero.
    pub fn new(pair: Pair, grid: GridShape) -> Self
    {
        DistData {
            col_dist: pair.col,
            row_dist: pair.row,
            block_height: 1,
            block_width: 1,
            col_align: 0,
            row_align: 0,
            col_cut: 0,
            row_cut: 0,
            root: 0,
            grid,
            device: Device::Cpu,
        }
    }

    pub fn with_aligns(mut self, col_align: usize, row_align: usize) -> Self
    { self.col_align = col_align; self.row_align = row_align; self }

    pub fn with_blocks(mut self, block_height: usize, block_width: usize) -> Self
    { self.block_height = block_height; self.block_width = block_width; self }

    pub fn with_cuts(mut self, col_cut: usize, row_cut: usize) -> Self
    { self.col_cut = col_cut; self.row_cut = row_cut; self }

    pub fn with_root(mut self, root: usize) -> Self
    { self.root = root; self }

    pub fn pair(&self) -> Pair
    { Pair { col: self.col_dist, row: self.row_dist } }

    pub fn dim(&self, dim: Dim) -> DimData
    {
        match dim {
            Dim::Height => DimData { dist: self.col_dist, block: self.block_height, cut: self.col_cut, align: self.col_align },
            Dim::Width => DimData { dist: self.row_dist, block: self.block_width, cut: self.row_cut, align: self.row_align },
        }
    }

    pub fn align(&self, dim: Dim) -> usize
    { self.dim(dim).align }

    pub fn set_align(&mut self, dim: Dim, align: usize)
    {
        match dim {
            Dim::Height => self.col_align = align,
            Dim::Width => self.row_align = align,
        }
    }

    pub fn set_cut(&mut self, dim: Dim, cut: usize)
    {
        match dim {
            Dim::Height => self.col_cut = cut,
            Dim::Width => self.row_cut = cut,
        }
    }

    pub fn stride(&self, dim: Dim) -> usize
    { self.dim(dim).dist.stride(self.grid) }

    pub fn layout(&self, dim: Dim) -> BlockCyclic
    {
        let DimData { block, cut, align, .. } = self.dim(dim);
        BlockCyclic { block, cut, align, stride: self.stride(dim) }
    }

    /// Checks the ranges of every field.
    pub fn validate(&self) -> FailResult<()>
    {Ok({
        let pair = Pair::new(self.col_dist, self.row_dist)?;
        for &dim in &Dim::BOTH {
            let DimData { dist, block, cut, align } = self.dim(dim);
            let stride = self.stride(dim);
            if block == 0 {
                throw!(ConfigurationError::new(format!("{:?} block size of {} is zero", dim, pair)));
            }
            if cut >= block {
                throw!(ConfigurationError::new(format!("{:?} cut {} of {} is not less than the block size {}", dim, cut, pair, block)));
            }
            if align >= stride {
                throw!(ConfigurationError::new(format!("{} alignment {} is out of range for a stride of {}", dist, align, stride)));
            }
        }
        match pair {
            Pair::CIRC_CIRC => if self.root >= self.grid.size() {
                throw!(ConfigurationError::new(format!("root {} is not a rank of a {} grid", self.root, self.grid)));
            },
            Pair::MD_STAR | Pair::STAR_MD => if self.root >= self.grid.gcd() {
                throw!(ConfigurationError::new(format!("a {} grid has no diagonal path {}", self.grid, self.root)));
            },
            _ => {},
        }
    })}

    /// Whether two matrices may be combined entry by entry without moving data.
    ///
    /// This compares every field except the device.
    pub fn compatible(&self, other: &DistData) -> bool
    {
        let other = DistData { device: self.device, ..*other };
        *self == other
    }

    /// The rank of a process within the distribution of one dimension, or
    /// `None` if it holds nothing along that dimension.
    pub fn dist_rank(&self, dim: Dim, coord: Coord) -> Option<usize>
    {
        let shape = self.grid;
        match self.dim(dim).dist {
            Dist::Mc => Some(coord.row),
            Dist::Mr => Some(coord.col),
            Dist::Vc => Some(shape.vc_rank(coord)),
            Dist::Vr => Some(shape.vr_rank(coord)),
            Dist::Md => shape.diag_rank(self.root, coord),
            Dist::Star => Some(0),
            Dist::Circ => match shape.rank(coord) == self.root {
                true => Some(0),
                false => None,
            },
        }
    }

    pub fn shift(&self, dim: Dim, coord: Coord) -> Option<usize>
    { self.dist_rank(dim, coord).map(|rank| self.layout(dim).shift(rank)) }

    pub fn participates(&self, coord: Coord) -> bool
    { Dim::BOTH.iter().all(|&dim| self.dist_rank(dim, coord).is_some()) }

    /// How many of the `n` indices along `dim` a process holds.
    pub fn local_length(&self, dim: Dim, coord: Coord, n: usize) -> usize
    {
        match self.shift(dim, coord) {
            Some(shift) => self.layout(dim).local_length(n, shift),
            None => 0,
        }
    }

    /// The distribution rank owning index `g` along `dim`.
    pub fn owner(&self, dim: Dim, g: usize) -> usize
    { self.layout(dim).owner(g) }

    pub fn is_local(&self, dim: Dim, coord: Coord, g: usize) -> bool
    { self.dist_rank(dim, coord) == Some(self.owner(dim, g)) }

    /// Number of indices before `g` that a process holds along `dim`.
    pub fn local_offset(&self, dim: Dim, coord: Coord, g: usize) -> usize
    {
        match self.shift(dim, coord) {
            Some(shift) => self.layout(dim).local_offset(g, shift),
            None => 0,
        }
    }

    /// The global index of a process's `local`-th index along `dim`.
    pub fn global_index(&self, dim: Dim, coord: Coord, local: usize) -> Option<usize>
    { self.shift(dim, coord).map(|shift| self.layout(dim).global_index(local, shift)) }

    /// Grid coordinates (row, column) pinned down by owning `rank` along `dim`.
    pub fn implied_coords(&self, dim: Dim, rank: usize) -> (Option<usize>, Option<usize>)
    {
        let shape = self.grid;
        let both = |coord: Coord| (Some(coord.row), Some(coord.col));
        match self.dim(dim).dist {
            Dist::Mc => (Some(rank), None),
            Dist::Mr => (None, Some(rank)),
            Dist::Vc => both(shape.vc_coord(rank)),
            Dist::Vr => both(shape.vr_coord(rank)),
            Dist::Md => both(shape.diag_coord(self.root, rank)),
            Dist::Star => (None, None),
            Dist::Circ => both(shape.coord(self.root)),
        }
    }

    /// The process that holds entry `(i, j)` and agrees with `free` on every
    /// grid axis along which the entry is replicated.
    pub fn holder(&self, i: usize, j: usize, free: Coord) -> Coord
    {
        let mut coord = free;
        for &(dim, g) in &[(Dim::Height, i), (Dim::Width, j)] {
            let (row, col) = self.implied_coords(dim, self.owner(dim, g));
            if let Some(row) = row { coord.row = row; }
            if let Some(col) = col { coord.col = col; }
        }
        coord
    }

    /// World rank of the designated owner of `(i, j)`: the holder with
    /// redundant rank zero.
    pub fn owner_rank(&self, i: usize, j: usize) -> usize
    { self.grid.rank(self.holder(i, j, Coord::new(0, 0))) }

    /// Every process holding `(i, j)`.
    pub fn holders(&self, i: usize, j: usize) -> Vec<Coord>
    {
        (0..self.grid.size())
            .map(|rank| self.grid.coord(rank))
            .filter(|&coord| self.is_local(Dim::Height, coord, i) && self.is_local(Dim::Width, coord, j))
            .collect()
    }

    fn dim_projection(&self, dim: Dim, axis: Axis) -> Projection
    {
        let DimData { dist, block, cut, align } = self.dim(dim);
        let extent = self.grid.extent(axis);
        let cyclic = |offset: usize| match extent {
            1 => Projection::Fixed(0),
            _ => Projection::Cyclic { dim, modulus: extent, offset: offset % extent, block, cut },
        };
        match (dist, axis) {
            (Dist::Star, _) => Projection::Free,
            (Dist::Circ, _) => Projection::Fixed(self.grid.coord(self.root).get(axis)),
            (Dist::Mc, Axis::Col) | (Dist::Mr, Axis::Row) => Projection::Free,
            (Dist::Mc, Axis::Row) | (Dist::Vc, Axis::Row) | (Dist::Md, Axis::Row) => cyclic(align),
            (Dist::Mr, Axis::Col) | (Dist::Vr, Axis::Col) => cyclic(align),
            (Dist::Md, Axis::Col) => cyclic(align + self.root),
            (Dist::Vc, Axis::Col) | (Dist::Vr, Axis::Row) => match extent {
                1 => Projection::Fixed(0),
                _ => Projection::Opaque { dim, dist, align, block, cut },
            },
        }
    }

    /// How the holders of an entry are placed along a grid axis.
    pub fn projection(&self, axis: Axis) -> Projection
    {
        match self.dim_projection(Dim::Height, axis) {
            Projection::Free => self.dim_projection(Dim::Width, axis),
            constrained => constrained,
        }
    }

    /// Whether `sender` is the process that should supply `receiver` with
    /// entries of a matrix distributed like `self`.
    ///
    /// Among the processes holding a copy of an entry, the designated one
    /// shares the receiver's coordinate along every replicated axis.
    pub fn designates(&self, sender: Coord, receiver: Coord) -> bool
    {
        Axis::BOTH.iter().all(|&axis| match self.projection(axis) {
            Projection::Free => sender.get(axis) == receiver.get(axis),
            _ => true,
        })
    }

    /// Whether, for every process of `scope`, the designated sender of every
    /// entry it needs under `dest` is also in that scope.
    pub fn covers(&self, dest: &DistData, scope: Scope) -> bool
    {
        Axis::BOTH.iter().all(|&axis| {
            if scope.varies(axis) || self.grid.extent(axis) == 1 {
                return true;
            }
            match self.projection(axis) {
                Projection::Free => true,
                constrained => constrained == dest.projection(axis),
            }
        })
    }

    /// Position of a process among the processes that hold the same entries.
    pub fn redundant_rank(&self, coord: Coord) -> Option<usize>
    {
        if !self.participates(coord) {
            return None;
        }
        Some(match self.free_axes() {
            (false, false) => 0,
            (true, false) => coord.row,
            (false, true) => coord.col,
            (true, true) => self.grid.vc_rank(coord),
        })
    }

    /// Number of processes holding each entry.
    pub fn redundant_size(&self) -> usize
    {
        match self.free_axes() {
            (false, false) => 1,
            (true, false) => self.grid.height,
            (false, true) => self.grid.width,
            (true, true) => self.grid.size(),
        }
    }

    fn free_axes(&self) -> (bool, bool)
    {(
        self.projection(Axis::Row) == Projection::Free,
        self.projection(Axis::Col) == Projection::Free,
    )}

    /// A process that holds data whenever anybody does.
    ///
    /// Results computed by the participating processes are broadcast from here
    /// to those that do not participate.
    pub fn lead(&self) -> Coord
    {
        match (self.col_dist, self.row_dist) {
            (Dist::Circ, _) | (_, Dist::Circ) => self.grid.coord(self.root),
            (Dist::Md, _) | (_, Dist::Md) => self.grid.diag_coord(self.root, 0),
            _ => Coord::new(0, 0),
        }
    }
}
