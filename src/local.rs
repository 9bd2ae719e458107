/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Column-major local matrices.

use crate::FailResult;
use crate::errors::BoundsError;
use crate::storage::{HostStorage, Storage};

use std::marker::PhantomData;
use std::ops::{Index, IndexMut, Range};

/// Owned column-major matrix.
///
/// Entry `(i, j)` lives at `i + j * ldim`, where the leading dimension is
/// `max(height, 1)`.  Shrinking keeps the allocation.
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    storage: HostStorage<T>,
    height: usize,
    width: usize,
    ldim: usize,
}

// same layout as Matrix, but borrowed, and possibly a window into a bigger matrix
pub struct MatrixRef_<T, Vs> {
    slice: Vs,
    dims: (usize, usize),
    ldim: usize,
    _dummy: PhantomData<T>,
}
pub type MatrixRef<'a, T> = MatrixRef_<T, &'a [T]>;
pub type MatrixMut<'a, T> = MatrixRef_<T, &'a mut [T]>;

// number of slice elements spanned by a window
fn span((height, width): (usize, usize), ldim: usize) -> usize
{
    match height == 0 || width == 0 {
        true => 0,
        false => (width - 1) * ldim + height,
    }
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new() -> Self
    { Matrix::zeros(0, 0) }

    /// Default-initialized; for the numeric types that is zero.
    pub fn zeros(height: usize, width: usize) -> Self
    {
        let ldim = height.max(1);
        let storage = HostStorage::allocate(ldim * width);
        Matrix { storage, height, width, ldim }
    }

    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> T) -> Self
    {
        let mut out = Matrix::zeros(height, width);
        for j in 0..width {
            for i in 0..height {
                out[(i, j)] = f(i, j);
            }
        }
        out
    }

    /// `data` lists the entries column by column, with no padding.
    pub fn from_column_major((height, width): (usize, usize), data: &[T]) -> FailResult<Self>
    {Ok({
        if data.len() != height * width {
            throw!(BoundsError::new(format!(
                "{} entries for a {}x{} matrix", data.len(), height, width,
            )));
        }
        let mut out = Matrix::zeros(height, width);
        out.storage.copy_in(data);
        out
    })}

    /// Entries column by column, with no padding.
    pub fn to_column_major(&self) -> Vec<T>
    {
        let mut out = vec![T::default(); self.height * self.width];
        if out.is_empty() {
            return out;
        }
        match self.ldim == self.height || self.width <= 1 {
            true => self.storage.copy_out(&mut out),
            false => for (j, chunk) in out.chunks_mut(self.height).enumerate() {
                chunk.copy_from_slice(self.as_ref().column(j));
            },
        }
        out
    }

    /// Entries row by row.  Mostly useful for comparing against literals.
    pub fn to_row_major(&self) -> Vec<T>
    {
        let mut out = Vec::with_capacity(self.height * self.width);
        for i in 0..self.height {
            for j in 0..self.width {
                out.push(self[(i, j)]);
            }
        }
        out
    }

    /// Changes the shape, reallocating only when the current buffer is too
    /// small.  Entries are unspecified afterwards.
    pub fn resize(&mut self, height: usize, width: usize)
    {
        let ldim = height.max(1);
        if ldim * width > self.storage.len() {
            self.storage = HostStorage::allocate(ldim * width);
        }
        self.height = height;
        self.width = width;
        self.ldim = ldim;
    }

    pub fn capacity(&self) -> usize { self.storage.len() }
}

impl<T: Copy + Default> Default for Matrix<T> {
    fn default() -> Self { Matrix::new() }
}

impl<T> Matrix<T> {
    pub fn height(&self) -> usize { self.height }
    pub fn width(&self) -> usize { self.width }
    pub fn dims(&self) -> (usize, usize) { (self.height, self.width) }
    pub fn ldim(&self) -> usize { self.ldim }
}

impl<T: Copy + Default> Matrix<T> {
    pub fn as_ref(&self) -> MatrixRef<'_, T>
    {
        let dims = self.dims();
        let slice = &self.storage.host()[..span(dims, self.ldim)];
        MatrixRef_ { slice, dims, ldim: self.ldim, _dummy: PhantomData }
    }

    pub fn as_mut(&mut self) -> MatrixMut<'_, T>
    {
        let dims = self.dims();
        let ldim = self.ldim;
        let slice = &mut self.storage.host_mut()[..span(dims, ldim)];
        MatrixRef_ { slice, dims, ldim, _dummy: PhantomData }
    }
}

impl<T, Vs: AsRef<[T]>> MatrixRef_<T, Vs> {
    pub fn dims(&self) -> (usize, usize) { self.dims }
    pub fn height(&self) -> usize { self.dims.0 }
    pub fn width(&self) -> usize { self.dims.1 }
    pub fn ldim(&self) -> usize { self.ldim }

    pub fn reborrow(&self) -> MatrixRef<'_, T>
    {
        let MatrixRef_ { dims, ldim, .. } = *self;
        MatrixRef_ { slice: self.slice.as_ref(), dims, ldim, _dummy: PhantomData }
    }

    /// The contiguous entries of one column.
    pub fn column(&self, j: usize) -> &[T]
    {
        assert!(j < self.width(), "column {} of a matrix of width {}", j, self.width());
        // a window with no rows spans nothing
        if self.height() == 0 {
            return &[];
        }
        let start = j * self.ldim;
        &self.slice.as_ref()[start..start + self.height()]
    }

    pub fn columns(&self) -> impl Iterator<Item=&[T]> + '_
    { (0..self.width()).map(move |j| self.column(j)) }

    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> MatrixRef<'_, T>
    {
        let (dims, offset) = self.window(&rows, &cols);
        let slice = &self.slice.as_ref()[offset..offset + span(dims, self.ldim)];
        MatrixRef_ { slice, dims, ldim: self.ldim, _dummy: PhantomData }
    }

    fn window(&self, rows: &Range<usize>, cols: &Range<usize>) -> ((usize, usize), usize)
    {
        assert!(rows.start <= rows.end && rows.end <= self.height(), "rows {:?} of a matrix of height {}", rows, self.height());
        assert!(cols.start <= cols.end && cols.end <= self.width(), "cols {:?} of a matrix of width {}", cols, self.width());
        let dims = (rows.len(), cols.len());
        let offset = match span(dims, self.ldim) {
            0 => 0,
            _ => rows.start + cols.start * self.ldim,
        };
        (dims, offset)
    }
}

impl<'a, T> MatrixRef<'a, T> {
    /// Like `submatrix`, but keeps the original borrow.
    pub fn into_submatrix(self, rows: Range<usize>, cols: Range<usize>) -> MatrixRef<'a, T>
    {
        let (dims, offset) = self.window(&rows, &cols);
        let MatrixRef_ { slice, ldim, .. } = self;
        let slice = &slice[offset..offset + span(dims, ldim)];
        MatrixRef_ { slice, dims, ldim, _dummy: PhantomData }
    }
}

impl<'a, T> MatrixMut<'a, T> {
    /// Like `submatrix_mut`, but keeps the original borrow.
    pub fn into_submatrix_mut(self, rows: Range<usize>, cols: Range<usize>) -> MatrixMut<'a, T>
    {
        let (dims, offset) = self.window(&rows, &cols);
        let MatrixRef_ { slice, ldim, .. } = self;
        let slice = &mut slice[offset..offset + span(dims, ldim)];
        MatrixRef_ { slice, dims, ldim, _dummy: PhantomData }
    }
}

impl<T: Copy + Default, Vs: AsRef<[T]>> MatrixRef_<T, Vs> {
    pub fn to_owned_matrix(&self) -> Matrix<T>
    {
        let mut out = Matrix::zeros(self.height(), self.width());
        out.as_mut().copy_from(&self.reborrow());
        out
    }
}

impl<T, Vs: AsMut<[T]>> MatrixRef_<T, Vs> {
    pub fn reborrow_mut(&mut self) -> MatrixMut<'_, T>
    {
        let MatrixRef_ { dims, ldim, .. } = *self;
        MatrixRef_ { slice: self.slice.as_mut(), dims, ldim, _dummy: PhantomData }
    }

    pub fn column_mut(&mut self, j: usize) -> &mut [T]
    {
        assert!(j < self.dims.1, "column {} of a matrix of width {}", j, self.dims.1);
        let height = self.dims.0;
        if height == 0 {
            return &mut [];
        }
        let start = j * self.ldim;
        &mut self.slice.as_mut()[start..start + height]
    }

    /// Calls `f` on every entry along with its local indices.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(usize, usize, &mut T))
    {
        for j in 0..self.dims.1 {
            for (i, x) in self.column_mut(j).iter_mut().enumerate() {
                f(i, j, x);
            }
        }
    }
}

impl<T, Vs: AsRef<[T]> + AsMut<[T]>> MatrixRef_<T, Vs> {
    pub fn submatrix_mut(&mut self, rows: Range<usize>, cols: Range<usize>) -> MatrixMut<'_, T>
    {
        let (dims, offset) = self.window(&rows, &cols);
        let ldim = self.ldim;
        let slice = &mut self.slice.as_mut()[offset..offset + span(dims, ldim)];
        MatrixRef_ { slice, dims, ldim, _dummy: PhantomData }
    }
}

impl<T: Copy, Vs: AsRef<[T]> + AsMut<[T]>> MatrixRef_<T, Vs> {
    pub fn fill(&mut self, value: T)
    { self.for_each_mut(|_, _, x| *x = value) }

    /// Panics if the shapes differ.
    pub fn copy_from(&mut self, other: &MatrixRef<'_, T>)
    {
        assert_eq!(self.dims, other.dims(), "copy between matrices of different shapes");
        for j in 0..self.dims.1 {
            self.column_mut(j).copy_from_slice(other.column(j));
        }
    }
}

impl<T: Copy + Default> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &T
    {
        debug_assert!(i < self.height && j < self.width);
        &self.storage.host()[i + j * self.ldim]
    }
}

impl<T: Copy + Default> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T
    {
        debug_assert!(i < self.height && j < self.width);
        &mut self.storage.host_mut()[i + j * self.ldim]
    }
}

impl<T, Vs: AsRef<[T]>> Index<(usize, usize)> for MatrixRef_<T, Vs> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &T
    {
        debug_assert!(i < self.dims.0 && j < self.dims.1);
        &self.slice.as_ref()[i + j * self.ldim]
    }
}

impl<T, Vs: AsRef<[T]> + AsMut<[T]>> IndexMut<(usize, usize)> for MatrixRef_<T, Vs> {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T
    {
        debug_assert!(i < self.dims.0 && j < self.dims.1);
        &mut self.slice.as_mut()[i + j * self.ldim]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_layout() {
        let m = Matrix::from_fn(3, 2, |i, j| (10 * i + j) as i32);
        assert_eq!(m.ldim(), 3);
        assert_eq!(m.to_column_major(), vec![0, 10, 20, 1, 11, 21]);
        assert_eq!(m.to_row_major(), vec![0, 1, 10, 11, 20, 21]);
        assert_eq!(m.as_ref().column(1), &[1, 11, 21]);
    }

    #[test]
    fn empty_matrices_keep_a_positive_leading_dimension() {
        let m = Matrix::<f64>::zeros(0, 5);
        assert_eq!(m.ldim(), 1);
        assert_eq!(m.to_column_major(), Vec::<f64>::new());
    }

    #[test]
    fn zero_height_matrices_have_empty_columns() {
        let mut m = Matrix::<i32>::zeros(0, 3);
        m.as_mut().fill(7);
        m.as_mut().for_each_mut(|_, _, _| panic!("no entries"));
        assert_eq!(m.as_ref().columns().map(|c| c.len()).collect::<Vec<_>>(), vec![0, 0, 0]);
        assert_eq!(m.as_ref().column(2), &[] as &[i32]);
        assert_eq!(m.as_mut().column_mut(2).len(), 0);

        let src = Matrix::<i32>::zeros(0, 3);
        m.as_mut().copy_from(&src.as_ref());
        assert_eq!(m.to_column_major(), Vec::<i32>::new());

        let m_ref = m.as_ref();
        let sub = m_ref.submatrix(0..0, 1..3);
        assert_eq!(sub.dims(), (0, 2));
        assert_eq!(sub.column(1).len(), 0);
        assert_eq!(sub.to_owned_matrix().dims(), (0, 2));
        assert_eq!(m.as_mut().submatrix_mut(0..0, 0..3).column_mut(2).len(), 0);

        // rows cut away from a taller matrix
        let tall = Matrix::from_fn(4, 3, |i, j| (i + j) as i32);
        let tall_ref = tall.as_ref();
        let win = tall_ref.submatrix(4..4, 0..3);
        assert_eq!(win.columns().count(), 3);
        assert!(win.columns().all(|c| c.is_empty()));
    }

    #[test]
    fn column_major_data_must_fill_the_matrix() {
        let m = Matrix::from_column_major((2, 2), &[1, 2, 3, 4]).unwrap();
        assert_eq!(m.to_row_major(), vec![1, 3, 2, 4]);
        assert_eq!(Matrix::<u8>::from_column_major((0, 4), &[]).unwrap().dims(), (0, 4));

        let err = Matrix::from_column_major((2, 3), &[1, 2, 3, 4]).unwrap_err();
        assert!(err.downcast_ref::<BoundsError>().is_some());
    }

    #[test]
    fn resize_only_grows_the_buffer() {
        let mut m = Matrix::<f64>::zeros(4, 4);
        m.resize(2, 3);
        assert_eq!(m.dims(), (2, 3));
        assert_eq!(m.ldim(), 2);
        assert_eq!(m.capacity(), 16);
        m.resize(5, 5);
        assert_eq!(m.capacity(), 25);
    }

    #[test]
    fn windows_share_storage() {
        let mut m = Matrix::from_fn(4, 3, |i, j| (10 * i + j) as i64);
        {
            let mut all = m.as_mut();
            let mut win = all.submatrix_mut(1..3, 1..3);
            assert_eq!(win.dims(), (2, 2));
            assert_eq!(win[(0, 0)], 11);
            win.fill(-1);
        }
        assert_eq!(m.to_row_major(), vec![
            0, 1, 2,
            10, -1, -1,
            20, -1, -1,
            30, 31, 32,
        ]);

        let sub = m.as_ref().submatrix(3..4, 0..3).to_owned_matrix();
        assert_eq!(sub.to_row_major(), vec![30, 31, 32]);
        assert_eq!(m.as_ref().submatrix(2..2, 0..3).dims(), (0, 3));
    }

    #[test]
    fn copy_between_windows() {
        let src = Matrix::from_fn(2, 2, |i, j| (i + 2 * j) as u8);
        let mut dest = Matrix::<u8>::zeros(3, 3);
        dest.as_mut().submatrix_mut(1..3, 0..2).copy_from(&src.as_ref());
        assert_eq!(dest.to_row_major(), vec![0, 0, 0, 0, 2, 0, 1, 3, 0]);
    }
}
