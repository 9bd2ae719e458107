/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Index arithmetic for one block-cyclically distributed matrix dimension.
//!
//! A dimension of extent `n` is cut into blocks of `block` indices, except that
//! the first block is short by `cut` indices.  Block `b` lives on rank
//! `(b + align) mod stride`.  With `block == 1` (and therefore `cut == 0`)
//! this is the plain element-cyclic distribution.
//!
//! Everything here is a pure function of its arguments; no grid is involved.

/// One dimension of a block-cyclic distribution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockCyclic {
    pub block: usize,
    pub cut: usize,
    pub align: usize,
    pub stride: usize,
}

impl BlockCyclic {
    pub fn element(align: usize, stride: usize) -> Self
    { BlockCyclic { block: 1, cut: 0, align, stride } }

    /// Index of the block containing `g`.
    #[inline]
    pub fn block_of(&self, g: usize) -> usize
    { (g + self.cut) / self.block }

    /// The rank owning global index `g`.
    #[inline]
    pub fn owner(&self, g: usize) -> usize
    { (self.block_of(g) + self.align) % self.stride }

    /// How far `rank` sits past the rank owning index 0.
    #[inline]
    pub fn shift(&self, rank: usize) -> usize
    { (rank + self.stride - self.align % self.stride) % self.stride }

    /// Number of indices in `0..n` held by the rank with the given shift.
    pub fn local_length(&self, n: usize, shift: usize) -> usize
    {
        if n == 0 {
            return 0;
        }
        let adjusted = n + self.cut;
        let num_blocks = (adjusted + self.block - 1) / self.block;
        if shift >= num_blocks {
            return 0;
        }

        let owned_blocks = (num_blocks - 1 - shift) / self.stride + 1;
        let mut len = owned_blocks * self.block;
        if shift == 0 {
            len -= self.cut;
        }
        if (num_blocks - 1) % self.stride == shift {
            // the last block may be short
            len -= num_blocks * self.block - adjusted;
        }
        len
    }

    /// Number of indices before `g` held by the rank with the given shift.
    ///
    /// When that rank owns `g`, this is its local index.
    #[inline]
    pub fn local_offset(&self, g: usize, shift: usize) -> usize
    { self.local_length(g, shift) }

    /// Local index of `g` on its owner.
    #[inline]
    pub fn local_index(&self, g: usize) -> usize
    {
        let adjusted = g + self.cut;
        let local_block = adjusted / self.block / self.stride;
        let within = adjusted % self.block;
        let first_cut = if self.shift(self.owner(g)) == 0 { self.cut } else { 0 };
        local_block * self.block + within - first_cut
    }

    /// Global index of the `local`-th index held by the rank with the given shift.
    #[inline]
    pub fn global_index(&self, local: usize, shift: usize) -> usize
    {
        let adjusted = local + if shift == 0 { self.cut } else { 0 };
        let block = shift + (adjusted / self.block) * self.stride;
        block * self.block + adjusted % self.block - self.cut
    }
}
