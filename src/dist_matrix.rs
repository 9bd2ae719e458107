/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::FailResult;
use crate::errors::{AlignmentError, BoundsError, ViewError};
use crate::local::{Matrix, MatrixMut, MatrixRef};
use crate::scalar::Ring;

use gridmat_grid::{Coord, Dim, DimData, Dist, DistData, Grid, Pair, Scope};
use gridmat_transport::Transport;

use std::ops::Range;

pub(crate) enum Local<'a, T> {
    Owned(Matrix<T>),
    View(MatrixMut<'a, T>),
    Locked(MatrixRef<'a, T>),
}

/// Whether a [`DistMatrix`] owns its local entries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewKind { Owner, View, LockedView }

/// A matrix spread over the processes of a [`Grid`].
///
/// Every process holds a `DistMatrix` with the same global size and
/// distribution; each one stores the entries assigned to it in a column-major
/// local matrix.  Methods documented as collective must be called by every
/// process of the grid, in the same order.
///
/// A matrix that has not been explicitly aligned (through [`DistMatrix::from_data`]
/// or one of the `align` methods) is free to adopt the alignments of whatever
/// is redistributed into it.
pub struct DistMatrix<'a, T, C> {
    grid: &'a Grid<C>,
    data: DistData,
    height: usize,
    width: usize,
    local: Local<'a, T>,
    col_constrained: bool,
    row_constrained: bool,
    root_constrained: bool,
    pub(crate) updates: Vec<(usize, usize, T)>,
    pub(crate) pulls: Vec<(usize, usize)>,
}

impl<'a, T: Ring, C: Transport> DistMatrix<'a, T, C> {
    fn raw(grid: &'a Grid<C>, data: DistData) -> Self
    {
        DistMatrix {
            grid, data,
            height: 0,
            width: 0,
            local: Local::Owned(Matrix::new()),
            col_constrained: false,
            row_constrained: false,
            root_constrained: false,
            updates: vec![],
            pulls: vec![],
        }
    }

    /// An empty, unaligned matrix.
    pub fn new(grid: &'a Grid<C>, pair: Pair) -> FailResult<Self>
    { DistMatrix::with_size(grid, pair, 0, 0) }

    pub fn with_size(grid: &'a Grid<C>, pair: Pair, height: usize, width: usize) -> FailResult<Self>
    {Ok({
        let pair = Pair::new(pair.col, pair.row)?;
        let mut out = DistMatrix::raw(grid, DistData::new(pair, grid.shape()));
        out.resize(height, width)?;
        out
    })}

    /// An empty matrix with a fully specified (and constrained) descriptor.
    pub fn from_data(grid: &'a Grid<C>, data: DistData) -> FailResult<Self>
    {Ok({
        grid.check_same(data.grid)?;
        data.validate()?;
        let mut out = DistMatrix::raw(grid, data);
        out.col_constrained = true;
        out.row_constrained = true;
        out.root_constrained = true;
        out
    })}

    /// Fills every local entry from a function of its global indices.
    ///
    /// Needs no communication.
    pub fn from_fn(
        grid: &'a Grid<C>,
        data: DistData,
        height: usize,
        width: usize,
        f: impl Fn(usize, usize) -> T,
    ) -> FailResult<Self>
    {Ok({
        let mut out = DistMatrix::from_data(grid, data)?;
        out.resize(height, width)?;
        let (rows, cols) = out.local_globals();
        out.local_mut()?.for_each_mut(|i, j, x| *x = f(rows[i], cols[j]));
        out
    })}

    // global indices of every local row and column
    pub(crate) fn local_globals(&self) -> (Vec<usize>, Vec<usize>)
    {
        let coord = self.coord();
        let indices = |dim, len| {
            (0..len).filter_map(|l| self.data.global_index(dim, coord, l)).collect::<Vec<_>>()
        };
        (indices(Dim::Height, self.local_height()), indices(Dim::Width, self.local_width()))
    }

    pub fn grid(&self) -> &'a Grid<C> { self.grid }
    pub fn dist_data(&self) -> &DistData { &self.data }
    pub fn pair(&self) -> Pair { self.data.pair() }
    pub fn height(&self) -> usize { self.height }
    pub fn width(&self) -> usize { self.width }
    pub fn dims(&self) -> (usize, usize) { (self.height, self.width) }
    pub fn coord(&self) -> Coord { self.grid.coord() }

    pub fn local_height(&self) -> usize { self.local().height() }
    pub fn local_width(&self) -> usize { self.local().width() }

    pub fn col_align(&self) -> usize { self.data.col_align }
    pub fn row_align(&self) -> usize { self.data.row_align }
    pub fn root(&self) -> usize { self.data.root }
    pub fn col_stride(&self) -> usize { self.data.stride(Dim::Height) }
    pub fn row_stride(&self) -> usize { self.data.stride(Dim::Width) }

    /// First global row index held here, counted in blocks for blocked
    /// distributions.  `None` if this process holds nothing.
    pub fn col_shift(&self) -> Option<usize> { self.data.shift(Dim::Height, self.coord()) }
    pub fn row_shift(&self) -> Option<usize> { self.data.shift(Dim::Width, self.coord()) }

    pub fn col_constrained(&self) -> bool { self.col_constrained }
    pub fn row_constrained(&self) -> bool { self.row_constrained }
    pub fn root_constrained(&self) -> bool { self.root_constrained }

    /// Whether this process holds entries (for an empty matrix: would hold).
    pub fn participating(&self) -> bool { self.data.participates(self.coord()) }

    pub fn redundant_rank(&self) -> Option<usize> { self.data.redundant_rank(self.coord()) }
    pub fn redundant_size(&self) -> usize { self.data.redundant_size() }

    pub fn view_kind(&self) -> ViewKind
    {
        match self.local {
            Local::Owned(_) => ViewKind::Owner,
            Local::View(_) => ViewKind::View,
            Local::Locked(_) => ViewKind::LockedView,
        }
    }

    pub fn is_view(&self) -> bool { self.view_kind() != ViewKind::Owner }
    pub fn is_locked(&self) -> bool { self.view_kind() == ViewKind::LockedView }

    //----------------------------------------------------------------------------
    // index arithmetic

    /// Distribution rank of the owner of row `i`.
    pub fn row_owner(&self, i: usize) -> usize { self.data.owner(Dim::Height, i) }
    /// Distribution rank of the owner of column `j`.
    pub fn col_owner(&self, j: usize) -> usize { self.data.owner(Dim::Width, j) }

    /// World rank of the designated owner of entry `(i, j)`.
    pub fn owner(&self, i: usize, j: usize) -> usize { self.data.owner_rank(i, j) }

    pub fn is_local_row(&self, i: usize) -> bool { self.data.is_local(Dim::Height, self.coord(), i) }
    pub fn is_local_col(&self, j: usize) -> bool { self.data.is_local(Dim::Width, self.coord(), j) }
    pub fn is_local(&self, i: usize, j: usize) -> bool { self.is_local_row(i) && self.is_local_col(j) }

    /// Number of local rows whose global index is below `i`.
    pub fn local_row_offset(&self, i: usize) -> usize { self.data.local_offset(Dim::Height, self.coord(), i) }
    pub fn local_col_offset(&self, j: usize) -> usize { self.data.local_offset(Dim::Width, self.coord(), j) }

    /// Local index of global row `i`, which must be held here.
    pub fn local_row(&self, i: usize) -> FailResult<usize>
    { self.local_index(Dim::Height, i) }

    pub fn local_col(&self, j: usize) -> FailResult<usize>
    { self.local_index(Dim::Width, j) }

    fn local_index(&self, dim: Dim, g: usize) -> FailResult<usize>
    {Ok({
        let n = match dim { Dim::Height => self.height, Dim::Width => self.width };
        if g >= n {
            throw!(BoundsError::new(format!("index {} along a {:?} of {}", g, dim, n)));
        }
        if !self.data.is_local(dim, self.coord(), g) {
            throw!(BoundsError::new(format!("index {} along {:?} is not held by rank {}", g, dim, self.grid.rank())));
        }
        self.data.local_offset(dim, self.coord(), g)
    })}

    /// Global index of local row `i_loc`.
    pub fn global_row(&self, i_loc: usize) -> FailResult<usize>
    { self.global_index(Dim::Height, i_loc, self.local_height()) }

    pub fn global_col(&self, j_loc: usize) -> FailResult<usize>
    { self.global_index(Dim::Width, j_loc, self.local_width()) }

    fn global_index(&self, dim: Dim, local: usize, len: usize) -> FailResult<usize>
    {Ok({
        if local >= len {
            throw!(BoundsError::new(format!("local index {} along a local {:?} of {}", local, dim, len)));
        }
        match self.data.global_index(dim, self.coord(), local) {
            Some(g) => g,
            None => throw!(BoundsError::new(format!("rank {} holds nothing", self.grid.rank()))),
        }
    })}

    fn check_bounds(&self, i: usize, j: usize) -> FailResult<()>
    {Ok({
        if i >= self.height || j >= self.width {
            throw!(BoundsError::new(format!("entry ({}, {}) of a {}x{} matrix", i, j, self.height, self.width)));
        }
    })}

    fn check_local_bounds(&self, i_loc: usize, j_loc: usize) -> FailResult<()>
    {Ok({
        let (height, width) = self.local().dims();
        if i_loc >= height || j_loc >= width {
            throw!(BoundsError::new(format!("local entry ({}, {}) of a local {}x{} matrix", i_loc, j_loc, height, width)));
        }
    })}

    //----------------------------------------------------------------------------
    // entries

    pub fn local(&self) -> MatrixRef<'_, T>
    {
        match &self.local {
            Local::Owned(m) => m.as_ref(),
            Local::View(m) => m.reborrow(),
            Local::Locked(m) => m.reborrow(),
        }
    }

    /// Fails with [`ViewError`] on a locked view.
    pub fn local_mut(&mut self) -> FailResult<MatrixMut<'_, T>>
    {Ok({
        match &mut self.local {
            Local::Owned(m) => m.as_mut(),
            Local::View(m) => m.reborrow_mut(),
            Local::Locked(_) => throw!(ViewError::new("cannot write through a locked view")),
        }
    })}

    pub fn get_local(&self, i_loc: usize, j_loc: usize) -> FailResult<T>
    {Ok({
        self.check_local_bounds(i_loc, j_loc)?;
        self.local()[(i_loc, j_loc)]
    })}

    pub fn set_local(&mut self, i_loc: usize, j_loc: usize, value: T) -> FailResult<()>
    {Ok({
        self.check_local_bounds(i_loc, j_loc)?;
        self.local_mut()?[(i_loc, j_loc)] = value;
    })}

    /// Adds `value` to a local entry.
    pub fn update_local(&mut self, i_loc: usize, j_loc: usize, value: T) -> FailResult<()>
    {Ok({
        self.check_local_bounds(i_loc, j_loc)?;
        self.local_mut()?[(i_loc, j_loc)] += value;
    })}

    /// Collective: every process gets entry `(i, j)`.
    ///
    /// The owner broadcasts it over the whole grid, unless every process
    /// already holds it.
    pub fn get(&self, i: usize, j: usize) -> FailResult<T>
    {Ok({
        self.check_bounds(i, j)?;
        if self.data.redundant_size() == self.grid.size() {
            return self.get_local(self.local_row_offset(i), self.local_col_offset(j));
        }
        let owner = self.owner(i, j);
        let world = self.grid.comm(Scope::Vc)?;
        let value = match self.grid.rank() == owner {
            true => Some(vec![self.get_local(self.local_row(i)?, self.local_col(j)?)?]),
            false => None,
        };
        world.broadcast(owner, value)?[0]
    })}

    /// Sets entry `(i, j)` on every process that holds it.
    ///
    /// Not collective; other processes do nothing.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> FailResult<()>
    {Ok({
        self.check_bounds(i, j)?;
        if self.is_local(i, j) {
            let (i_loc, j_loc) = (self.local_row_offset(i), self.local_col_offset(j));
            self.set_local(i_loc, j_loc, value)?;
        }
    })}

    /// Adds to entry `(i, j)` on every process that holds it.
    pub fn update(&mut self, i: usize, j: usize, value: T) -> FailResult<()>
    {Ok({
        self.check_bounds(i, j)?;
        if self.is_local(i, j) {
            let (i_loc, j_loc) = (self.local_row_offset(i), self.local_col_offset(j));
            self.update_local(i_loc, j_loc, value)?;
        }
    })}

    //----------------------------------------------------------------------------
    // sizing

    /// Sets the global size; local entries are unspecified afterwards.
    ///
    /// Views can only be "resized" to their current size.
    pub fn resize(&mut self, height: usize, width: usize) -> FailResult<()>
    {Ok({
        let coord = self.coord();
        let local_height = self.data.local_length(Dim::Height, coord, height);
        let local_width = self.data.local_length(Dim::Width, coord, width);
        match &mut self.local {
            Local::Owned(m) => m.resize(local_height, local_width),
            _ => if (height, width) != (self.height, self.width) {
                throw!(ViewError::new(format!(
                    "cannot resize a {}x{} view to {}x{}", self.height, self.width, height, width,
                )));
            },
        }
        self.height = height;
        self.width = width;
    })}

    /// Releases the entries and every alignment constraint.  A view stops
    /// being one.
    pub fn empty(&mut self)
    {
        self.local = Local::Owned(Matrix::new());
        self.height = 0;
        self.width = 0;
        self.col_constrained = false;
        self.row_constrained = false;
        self.root_constrained = false;
        self.updates.clear();
        self.pulls.clear();
    }

    /// Collective: adopts the global size held by world rank `root`.
    pub fn make_size_consistent(&mut self, root: usize) -> FailResult<()>
    {Ok({
        let world = self.grid.comm(Scope::Vc)?;
        let dims = world.broadcast(root, match world.rank() == root {
            true => Some(vec![self.height, self.width]),
            false => None,
        })?;
        self.resize(dims[0], dims[1])?;
    })}

    //----------------------------------------------------------------------------
    // alignment

    /// Collective when the matrix holds data, which is moved to match.
    pub fn align(&mut self, col_align: usize, row_align: usize) -> FailResult<()>
    {Ok({
        self.realign(self.data.with_aligns(col_align, row_align))?;
        self.col_constrained = true;
        self.row_constrained = true;
    })}

    pub fn align_cols(&mut self, col_align: usize) -> FailResult<()>
    {Ok({
        self.realign(DistData { col_align, ..self.data })?;
        self.col_constrained = true;
    })}

    pub fn align_rows(&mut self, row_align: usize) -> FailResult<()>
    {Ok({
        self.realign(DistData { row_align, ..self.data })?;
        self.row_constrained = true;
    })}

    /// Moves a `[CIRC,CIRC]` matrix to another process, or an `MD` matrix to
    /// another diagonal path.
    pub fn set_root(&mut self, root: usize) -> FailResult<()>
    {Ok({
        self.realign(self.data.with_root(root))?;
        self.root_constrained = true;
    })}

    /// Arranges for entries to line up with those of a matrix distributed
    /// like `other`, so that the two can be combined locally.
    ///
    /// Fails with [`AlignmentError`] when some distributed dimension has no
    /// counterpart in `other`, and with `GridMismatchError` when `other`
    /// belongs to a grid of another shape.
    pub fn align_with(&mut self, other: &DistData) -> FailResult<()>
    {Ok({
        self.grid.check_same(other.grid)?;
        let mut target = self.data;
        adopt(&mut target, Dim::Height, other)?;
        adopt(&mut target, Dim::Width, other)?;
        let adopted_root = adopt_root(&mut target, other);
        self.realign(target)?;
        self.col_constrained = true;
        self.row_constrained = true;
        self.root_constrained |= adopted_root;
    })}

    pub fn align_cols_with(&mut self, other: &DistData) -> FailResult<()>
    {Ok({
        self.grid.check_same(other.grid)?;
        let mut target = self.data;
        adopt(&mut target, Dim::Height, other)?;
        self.realign(target)?;
        self.col_constrained = true;
    })}

    pub fn align_rows_with(&mut self, other: &DistData) -> FailResult<()>
    {Ok({
        self.grid.check_same(other.grid)?;
        let mut target = self.data;
        adopt(&mut target, Dim::Width, other)?;
        self.realign(target)?;
        self.row_constrained = true;
    })}

    fn realign(&mut self, target: DistData) -> FailResult<()>
    {Ok({
        target.validate()?;
        if target == self.data {
            return Ok(());
        }
        if self.is_view() {
            throw!(ViewError::new(format!("cannot realign a view of a {} matrix", self.pair())));
        }
        let (height, width) = self.dims();
        if height == 0 || width == 0 {
            self.data = target;
            self.resize(height, width)?;
            return Ok(());
        }
        trace!("Realigning a {}x{} {} matrix", height, width, self.pair());
        let mut moved = DistMatrix::from_data(self.grid, target)?;
        crate::redist::redistribute(self, &mut moved)?;
        self.data = target;
        self.local = Local::Owned(moved.into_local());
    })}

    /// Adopts the alignments of `src` along the dimensions that are not
    /// constrained, when that costs nothing.
    pub(crate) fn adopt_unconstrained(&mut self, src: &DistData) -> FailResult<()>
    {Ok({
        if self.is_view() {
            return Ok(());
        }
        let mut target = self.data;
        for &(dim, constrained) in &[(Dim::Height, self.col_constrained), (Dim::Width, self.row_constrained)] {
            let current = target.dim(dim);
            if constrained || !is_distributed(current.dist) {
                continue;
            }
            if let Some(derived) = derived_dim(current.dist, src) {
                if (derived.block, derived.cut) == (current.block, current.cut) {
                    target.set_align(dim, derived.align);
                }
            }
        }
        if !self.root_constrained {
            adopt_root(&mut target, src);
        }
        if target != self.data {
            let (height, width) = self.dims();
            self.data = target;
            self.resize(height, width)?;
        }
    })}

    pub(crate) fn into_local(self) -> Matrix<T>
    {
        match self.local {
            Local::Owned(m) => m,
            Local::View(m) => m.to_owned_matrix(),
            Local::Locked(m) => m.to_owned_matrix(),
        }
    }

    //----------------------------------------------------------------------------
    // views

    fn view_data(&self, rows: &Range<usize>, cols: &Range<usize>) -> FailResult<(DistData, Range<usize>, Range<usize>)>
    {Ok({
        if rows.start > rows.end || rows.end > self.height || cols.start > cols.end || cols.end > self.width {
            throw!(BoundsError::new(format!(
                "view of rows {:?} and columns {:?} of a {}x{} matrix", rows, cols, self.height, self.width,
            )));
        }
        let coord = self.coord();
        let mut data = self.data;
        let mut window = |dim: Dim, range: &Range<usize>| {
            let layout = self.data.layout(dim);
            data.set_align(dim, layout.owner(range.start));
            data.set_cut(dim, (range.start + layout.cut) % layout.block);
            let start = self.data.local_offset(dim, coord, range.start);
            let end = self.data.local_offset(dim, coord, range.end);
            start..end
        };
        let local_rows = window(Dim::Height, rows);
        let local_cols = window(Dim::Width, cols);
        (data, local_rows, local_cols)
    })}

    /// A read-only window onto a contiguous range of global rows and columns.
    ///
    /// The view shares storage with `self`; its alignments are chosen so that
    /// every process keeps exactly the entries of the window it already has.
    pub fn locked_view(&self, rows: Range<usize>, cols: Range<usize>) -> FailResult<DistMatrix<'_, T, C>>
    {Ok({
        let (data, local_rows, local_cols) = self.view_data(&rows, &cols)?;
        let local = self.local().into_submatrix(local_rows, local_cols);
        self.make_view(data, rows.len(), cols.len(), Local::Locked(local))
    })}

    /// A writable window.  Fails with [`ViewError`] on a locked view.
    pub fn view_mut(&mut self, rows: Range<usize>, cols: Range<usize>) -> FailResult<DistMatrix<'_, T, C>>
    {Ok({
        let (data, local_rows, local_cols) = self.view_data(&rows, &cols)?;
        let grid = self.grid;
        let local = self.local_mut()?.into_submatrix_mut(local_rows, local_cols);
        DistMatrix {
            local: Local::View(local),
            ..DistMatrix::view_shell(grid, data, rows.len(), cols.len())
        }
    })}

    /// Same as [`DistMatrix::view_mut`].
    pub fn view(&mut self, rows: Range<usize>, cols: Range<usize>) -> FailResult<DistMatrix<'_, T, C>>
    { self.view_mut(rows, cols) }

    fn make_view<'s>(&'s self, data: DistData, height: usize, width: usize, local: Local<'s, T>) -> DistMatrix<'s, T, C>
    { DistMatrix { local, ..DistMatrix::view_shell(self.grid, data, height, width) } }

    fn view_shell<'s>(grid: &'s Grid<C>, data: DistData, height: usize, width: usize) -> DistMatrix<'s, T, C>
    {
        DistMatrix {
            height, width,
            col_constrained: true,
            row_constrained: true,
            root_constrained: true,
            ..DistMatrix::raw(grid, data)
        }
    }
}

impl<'a, T: Ring, C: Transport> ::std::fmt::Debug for DistMatrix<'a, T, C> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result
    {
        f.debug_struct("DistMatrix")
            .field("pair", &self.pair())
            .field("height", &self.height)
            .field("width", &self.width)
            .field("data", &self.data)
            .field("view_kind", &self.view_kind())
            .finish()
    }
}

fn is_distributed(dist: Dist) -> bool
{
    match dist {
        Dist::Star | Dist::Circ => false,
        _ => true,
    }
}

/// Distribution parameters for a `target` dimension that place each index on
/// the same processes as some dimension of `other` does.
pub(crate) fn derived_dim(target: Dist, other: &DistData) -> Option<DimData>
{
    let shape = other.grid;
    for &dim in &Dim::BOTH {
        let source = other.dim(dim);
        let align = match (target, source.dist) {
            (Dist::Star, _) | (Dist::Circ, _) => return None,
            (t, s) if t == s => source.align,
            (Dist::Mc, Dist::Vc) | (Dist::Mc, Dist::Md) => source.align % shape.height,
            (Dist::Mr, Dist::Vr) => source.align % shape.width,
            (Dist::Mr, Dist::Md) => (source.align + other.root) % shape.width,
            (Dist::Vc, Dist::Mc) | (Dist::Vr, Dist::Mr) => source.align,
            _ => continue,
        };
        return Some(DimData { dist: target, align, ..source });
    }
    None
}

fn adopt(target: &mut DistData, dim: Dim, other: &DistData) -> FailResult<()>
{Ok({
    let current = target.dim(dim);
    if !is_distributed(current.dist) {
        return Ok(());
    }
    let derived = match derived_dim(current.dist, other) {
        Some(derived) => derived,
        None => throw!(AlignmentError::new(format!(
            "a {} dimension cannot be aligned with a {} matrix", current.dist, other.pair(),
        ))),
    };
    target.set_align(dim, derived.align);
    target.set_cut(dim, derived.cut);
    match dim {
        Dim::Height => target.block_height = derived.block,
        Dim::Width => target.block_width = derived.block,
    }
})}

// rooted distributions of the same kind can share a root
pub(crate) fn adopt_root(target: &mut DistData, other: &DistData) -> bool
{
    let rooted = |data: &DistData| match data.pair() {
        Pair::CIRC_CIRC => Some(Dist::Circ),
        Pair::MD_STAR | Pair::STAR_MD => Some(Dist::Md),
        _ => None,
    };
    match (rooted(target), rooted(other)) {
        (Some(a), Some(b)) if a == b => {
            target.root = other.root;
            true
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmat_grid::GridShape;

    fn shape(r: usize, c: usize) -> GridShape { GridShape::new(r, c).unwrap() }

    #[test]
    fn derived_alignments() {
        let grid = shape(2, 3);
        let vc = DistData::new(Pair::VC_STAR, grid).with_aligns(5, 0);
        assert_eq!(derived_dim(Dist::Mc, &vc).map(|d| d.align), Some(1));
        assert_eq!(derived_dim(Dist::Vc, &vc).map(|d| d.align), Some(5));
        assert_eq!(derived_dim(Dist::Mr, &vc), None);

        // transposed: the row distribution of [STAR,MC] lines up with MC rows
        let star_mc = DistData::new(Pair::STAR_MC, grid).with_aligns(0, 1);
        assert_eq!(derived_dim(Dist::Mc, &star_mc).map(|d| d.align), Some(1));
        assert_eq!(derived_dim(Dist::Vc, &star_mc).map(|d| d.align), Some(1));

        let md = DistData::new(Pair::MD_STAR, grid).with_root(0).with_aligns(4, 0);
        assert_eq!(derived_dim(Dist::Mc, &md).map(|d| d.align), Some(0));
        assert_eq!(derived_dim(Dist::Mr, &md).map(|d| d.align), Some(1));
    }

    #[test]
    fn adopting_needs_a_counterpart() {
        let grid = shape(2, 2);
        let mut target = DistData::new(Pair::MC_MR, grid);
        let other = DistData::new(Pair::VR_STAR, grid).with_aligns(3, 0);
        assert!(adopt(&mut target, Dim::Height, &other).is_err());
        adopt(&mut target, Dim::Width, &other).unwrap();
        assert_eq!(target.row_align, 1);

        let mut star = DistData::new(Pair::STAR_STAR, grid);
        adopt(&mut star, Dim::Height, &other).unwrap();
        assert_eq!(star, DistData::new(Pair::STAR_STAR, grid));
    }

    #[test]
    fn roots_are_shared_between_like_distributions() {
        let grid = shape(2, 2);
        let mut circ = DistData::new(Pair::CIRC_CIRC, grid);
        assert!(adopt_root(&mut circ, &DistData::new(Pair::CIRC_CIRC, grid).with_root(3)));
        assert_eq!(circ.root, 3);
        assert!(!adopt_root(&mut circ, &DistData::new(Pair::MD_STAR, grid).with_root(1)));
        assert_eq!(circ.root, 3);
    }
}
