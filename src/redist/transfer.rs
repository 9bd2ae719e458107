/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Which entries one process sends another during a redistribution step.
//!
//! Sender `p` supplies receiver `q` when `p` is designated for `q` by the
//! source descriptor, and sends every entry it holds that `q` holds under
//! the destination descriptor.  Entries travel column-major by global index,
//! so both ends can compute the layout of a buffer on their own.

use crate::FailResult;
use crate::local::{MatrixMut, MatrixRef};

use gridmat_grid::{Coord, Dim, DistData};
use gridmat_transport::TransportError;

pub(crate) struct Transfer<'m> {
    pub src: &'m DistData,
    pub dest: &'m DistData,
    pub height: usize,
    pub width: usize,
}

/// Global rows and columns making up one message.
pub(crate) struct Selection {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl Selection {
    fn empty() -> Self { Selection { rows: vec![], cols: vec![] } }

    pub fn len(&self) -> usize { self.rows.len() * self.cols.len() }
}

impl<'m> Transfer<'m> {
    pub fn selection(&self, sender: Coord, receiver: Coord) -> Selection
    {
        if !self.src.designates(sender, receiver) || !self.dest.participates(receiver) {
            return Selection::empty();
        }
        let rows = self.indices(Dim::Height, sender, receiver, self.height);
        let cols = self.indices(Dim::Width, sender, receiver, self.width);
        Selection { rows, cols }
    }

    fn indices(&self, dim: Dim, sender: Coord, receiver: Coord, n: usize) -> Vec<usize>
    {
        let (shift, wanted) = match (self.src.shift(dim, sender), self.dest.dist_rank(dim, receiver)) {
            (Some(shift), Some(wanted)) => (shift, wanted),
            _ => return vec![],
        };
        let held = self.src.layout(dim);
        let needed = self.dest.layout(dim);
        (0..held.local_length(n, shift))
            .map(|local| held.global_index(local, shift))
            .filter(|&g| needed.owner(g) == wanted)
            .collect()
    }

    pub fn count(&self, sender: Coord, receiver: Coord) -> usize
    { self.selection(sender, receiver).len() }

    /// The buffer that `sender` (this process) sends to `receiver`.
    pub fn pack<T: Copy>(&self, local: &MatrixRef<'_, T>, sender: Coord, receiver: Coord) -> Vec<T>
    {
        let Selection { rows, cols } = self.selection(sender, receiver);
        let mut buf = Vec::with_capacity(rows.len() * cols.len());
        if rows.is_empty() {
            return buf;
        }
        let held_rows = self.src.layout(Dim::Height);
        let held_cols = self.src.layout(Dim::Width);
        let local_rows: Vec<_> = rows.iter().map(|&i| held_rows.local_index(i)).collect();
        for &j in &cols {
            let column = local.column(held_cols.local_index(j));
            buf.extend(local_rows.iter().map(|&i| column[i]));
        }
        buf
    }

    /// Writes a buffer from `sender` into the local entries of `receiver`
    /// (this process).
    pub fn unpack<T: Copy>(&self, local: &mut MatrixMut<'_, T>, sender: Coord, receiver: Coord, buf: &[T]) -> FailResult<()>
    {Ok({
        let Selection { rows, cols } = self.selection(sender, receiver);
        let expected = rows.len() * cols.len();
        if buf.len() != expected {
            let member = self.src.grid.rank(sender);
            throw!(TransportError::Count { member, expected, actual: buf.len() });
        }
        if expected == 0 {
            return Ok(());
        }
        let needed_rows = self.dest.layout(Dim::Height);
        let needed_cols = self.dest.layout(Dim::Width);
        let local_rows: Vec<_> = rows.iter().map(|&i| needed_rows.local_index(i)).collect();
        for (&j, chunk) in cols.iter().zip(buf.chunks(rows.len())) {
            let column = local.column_mut(needed_cols.local_index(j));
            for (&i, &x) in local_rows.iter().zip(chunk) {
                column[i] = x;
            }
        }
    })}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::Matrix;
    use gridmat_grid::{GridShape, Pair};

    #[test]
    fn column_to_row_panels() {
        // 4x4 on a 2x2 grid, [MC,MR] to [VC,STAR]
        let grid = GridShape::new(2, 2).unwrap();
        let src = DistData::new(Pair::MC_MR, grid);
        let dest = DistData::new(Pair::VC_STAR, grid);
        let transfer = Transfer { src: &src, dest: &dest, height: 4, width: 4 };

        // (1,0) holds rows {1,3} and columns {0,2}; VC rank 1 is (1,0) itself
        // and wants row 1; VC rank 3 is (1,1) and wants row 3
        let me = Coord::new(1, 0);
        let to_self = transfer.selection(me, me);
        assert_eq!((to_self.rows, to_self.cols), (vec![1], vec![0, 2]));
        let to_other = transfer.selection(me, Coord::new(1, 1));
        assert_eq!((to_other.rows, to_other.cols), (vec![3], vec![0, 2]));
        // another grid row needs nothing from here
        assert_eq!(transfer.count(me, Coord::new(0, 1)), 0);

        let local = Matrix::from_fn(2, 2, |i, j| 10 * (2 * i + 1) + 2 * j);
        let buf = transfer.pack(&local.as_ref(), me, Coord::new(1, 1));
        assert_eq!(buf, vec![30, 32]);

        let mut received = Matrix::zeros(1, 4);
        transfer.unpack(&mut received.as_mut(), me, Coord::new(1, 1), &buf).unwrap();
        assert_eq!(received.to_row_major(), vec![30, 0, 32, 0]);
        assert!(transfer.unpack(&mut received.as_mut(), me, Coord::new(1, 1), &buf[..1]).is_err());
    }

    #[test]
    fn replicated_senders_only_serve_their_own_column() {
        let grid = GridShape::new(2, 3).unwrap();
        let src = DistData::new(Pair::MC_STAR, grid);
        let dest = DistData::new(Pair::MC_MR, grid);
        let transfer = Transfer { src: &src, dest: &dest, height: 5, width: 6 };

        assert_eq!(transfer.count(Coord::new(0, 1), Coord::new(0, 2)), 0);
        let sel = transfer.selection(Coord::new(0, 1), Coord::new(0, 1));
        assert_eq!(sel.rows, vec![0, 2, 4]);
        assert_eq!(sel.cols, vec![1, 4]);
    }
}
