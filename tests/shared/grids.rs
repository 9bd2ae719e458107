/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Running SPMD tests on thread-backed process grids.

use gridmat::{
    spmd_with, Dim, DistData, DistMatrix, FailResult, Grid, GridShape,
    Pair, RedistPolicy, ReduceOp, Ring, Scope, ThreadComm, Transport,
};
use rand::Rng;
use std::time::Duration;

/// Long enough for any test here; short enough that a deadlock fails the test.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `f` on every rank of a `height x width` grid and returns the results
/// in rank order.  An error on any rank fails the test.
pub fn on_grid<R, F>(height: usize, width: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(&Grid<ThreadComm>) -> FailResult<R> + Sync,
{ on_grid_with(height, width, RedistPolicy::default(), f) }

pub fn on_grid_with<R, F>(height: usize, width: usize, policy: RedistPolicy, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(&Grid<ThreadComm>) -> FailResult<R> + Sync,
{
    let world = ThreadComm::world(height * width).into_iter()
        .map(|comm| comm.with_stall_timeout(Some(STALL_TIMEOUT)))
        .collect();

    spmd_with(world, |comm| {
        let rank = comm.rank();
        let grid = Grid::with_shape(comm, height, width)
            .unwrap_or_else(|e| panic!("rank {}: {}", rank, e))
            .with_policy(policy);
        f(&grid).unwrap_or_else(|e| panic!("rank {}: {}\n{}", rank, e, e.backtrace()))
    })
}

/// Asserts that every locally held entry equals `f` of its global indices.
pub fn check_entries<T, C>(a: &DistMatrix<'_, T, C>, f: impl Fn(usize, usize) -> T)
where
    T: Ring,
    C: Transport,
{
    let data = a.dist_data();
    let coord = a.coord();
    assert_eq!(a.local_height(), data.local_length(Dim::Height, coord, a.height()));
    assert_eq!(a.local_width(), data.local_length(Dim::Width, coord, a.width()));

    for j_loc in 0..a.local_width() {
        for i_loc in 0..a.local_height() {
            let i = a.global_row(i_loc).unwrap();
            let j = a.global_col(j_loc).unwrap();
            assert_eq!(
                a.get_local(i_loc, j_loc).unwrap(), f(i, j),
                "entry ({}, {}) of a {} matrix on {:?}", i, j, a.pair(), coord,
            );
        }
    }
}

/// Mixes an entry's global position into its value, so that a value landing
/// in the wrong place changes [`checksum`].
pub fn entry_hash(i: usize, j: usize, x: i64) -> i64
{
    let pos = ((i as i64) << 32 | j as i64).wrapping_mul(0x9E37_79B9_7F4A_7C15_u64 as i64);
    (x ^ pos).wrapping_mul(31).wrapping_add(pos)
}

/// Wrapping sum of [`entry_hash`] over every entry, counting each once no
/// matter how many processes hold it.  Collective.
pub fn checksum<C: Transport>(a: &DistMatrix<'_, i64, C>) -> FailResult<i64>
{Ok({
    let mut mine = 0i64;
    if a.redundant_rank() == Some(0) {
        for j_loc in 0..a.local_width() {
            let j = a.global_col(j_loc)?;
            for i_loc in 0..a.local_height() {
                let i = a.global_row(i_loc)?;
                mine = mine.wrapping_add(entry_hash(i, j, a.get_local(i_loc, j_loc)?));
            }
        }
    }
    a.grid().comm(Scope::Vc)?.all_reduce_one(mine, ReduceOp::Sum)?
})}

/// What [`checksum`] gives for a `height x width` matrix of `f`.
pub fn checksum_of(height: usize, width: usize, f: impl Fn(usize, usize) -> i64) -> i64
{
    let mut sum = 0i64;
    for j in 0..width {
        for i in 0..height {
            sum = sum.wrapping_add(entry_hash(i, j, f(i, j)));
        }
    }
    sum
}

/// A valid descriptor with arbitrary alignments, blocks, cuts and root.
pub fn random_data<R: Rng>(rng: &mut R, pair: Pair, shape: GridShape) -> DistData
{
    let mut data = DistData::new(pair, shape)
        .with_blocks(rng.gen_range(1, 4), rng.gen_range(1, 4));
    for &dim in &Dim::BOTH {
        let block = data.dim(dim).block;
        let stride = data.stride(dim);
        data.set_cut(dim, rng.gen_range(0, block));
        data.set_align(dim, rng.gen_range(0, stride));
    }
    data.root = match pair {
        Pair::CIRC_CIRC => rng.gen_range(0, shape.size()),
        Pair::MD_STAR | Pair::STAR_MD => rng.gen_range(0, shape.gcd()),
        _ => 0,
    };
    data
}

/// An element-cyclic matrix holding [`entry`](super::util::entry).
pub fn filled<'a>(grid: &'a Grid<ThreadComm>, data: DistData, height: usize, width: usize) -> FailResult<DistMatrix<'a, i64, ThreadComm>>
{ DistMatrix::from_fn(grid, data, height, width, super::util::entry) }
