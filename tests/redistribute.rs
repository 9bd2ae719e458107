/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Redistribution between every pair of distributions, on thread-backed grids.

#[macro_use] extern crate pretty_assertions;

mod shared;

use crate::shared::grids::{check_entries, checksum, checksum_of, filled, on_grid, on_grid_with, random_data};
use crate::shared::util::{entry, sorted};
use gridmat::{
    Collective, ConfigurationError, DistData, DistMatrix, GridMismatchError,
    GridShape, Pair, RedistPolicy, ViewError,
};
use gridmat::redist::route;
use itertools::iproduct;
use rand::{SeedableRng, XorShiftRng};

fn expected_checksum(height: usize, width: usize) -> i64
{ checksum_of(height, width, entry) }

#[test]
fn mc_mr_on_a_two_by_two_grid() {
    let results = on_grid(2, 2, |grid| Ok({
        let data = DistData::new(Pair::MC_MR, grid.shape());
        let a = DistMatrix::from_fn(grid, data, 4, 4, |i, j| (4 * i + j) as i64)?;
        let mine = sorted(a.local().to_owned_matrix().to_column_major());

        let everything = a.redistribute(Pair::STAR_STAR)?;
        (mine, everything.local().to_owned_matrix().to_row_major())
    }));

    // rank 1 is the process at grid row 1, column 0
    assert_eq!(results[0].0, vec![0, 2, 8, 10]);
    assert_eq!(results[1].0, vec![4, 6, 12, 14]);
    assert_eq!(results[2].0, vec![1, 3, 9, 11]);
    assert_eq!(results[3].0, vec![5, 7, 13, 15]);
    for (_, everything) in &results {
        assert_eq!(*everything, (0..16).collect::<Vec<i64>>());
    }
}

#[test]
fn vc_to_star_is_a_single_all_gather() {
    let stats = on_grid(1, 3, |grid| Ok({
        let a = filled(grid, DistData::new(Pair::VC_STAR, grid.shape()), 6, 1)?;
        grid.transport().reset_stats();
        let b = a.redistribute(Pair::STAR_STAR)?;
        let stats = grid.transport().stats();
        check_entries(&b, entry);
        stats
    }));

    for stats in stats {
        assert_eq!(stats.calls(Collective::AllGather), 1);
        assert_eq!(stats.contributed(Collective::AllGather), 2);
        assert_eq!(stats.total_calls(), 1);
    }
}

fn round_trip_every_pair(height: usize, width: usize, seed: [u32; 4]) {
    let shape = GridShape::new(height, width).unwrap();
    let mut rng = XorShiftRng::from_seed(seed);
    let cases: Vec<(DistData, DistData)> = {
        iproduct!(Pair::ALL.iter(), Pair::ALL.iter())
            .map(|(&a, &b)| (random_data(&mut rng, a, shape), random_data(&mut rng, b, shape)))
            .collect()
    };
    let (m, n) = (7, 5);

    on_grid(height, width, |grid| Ok({
        for &(a_data, b_data) in &cases {
            let a = filled(grid, a_data, m, n)?;

            let mut b = DistMatrix::from_data(grid, b_data)?;
            a.redistribute_into(&mut b)?;
            assert_eq!(b.dims(), (m, n));
            assert_eq!(*b.dist_data(), b_data);
            check_entries(&b, entry);

            let mut back = DistMatrix::new(grid, a_data.pair())?;
            b.redistribute_into(&mut back)?;
            check_entries(&back, entry);
            assert_eq!(checksum(&back)?, expected_checksum(m, n));
        }
    }));
}

#[test]
fn round_trips_on_a_square_grid() { round_trip_every_pair(2, 2, [1, 2, 3, 4]); }

#[test]
fn round_trips_on_a_wide_grid() { round_trip_every_pair(2, 3, [5, 6, 7, 8]); }

#[test]
fn round_trips_with_several_diagonals() { round_trip_every_pair(2, 4, [9, 10, 11, 12]); }

#[test]
fn round_trips_on_a_tall_grid() { round_trip_every_pair(3, 2, [13, 14, 15, 16]); }

#[test]
fn checksum_notices_misplaced_entries() {
    on_grid(2, 2, |grid| Ok({
        let data = DistData::new(Pair::MC_MR, grid.shape());
        let swapped = DistMatrix::from_fn(grid, data, 4, 4, |i, j| match (i, j) {
            (0, 1) => entry(1, 0),
            (1, 0) => entry(0, 1),
            _ => entry(i, j),
        })?;
        assert_ne!(checksum(&swapped)?, expected_checksum(4, 4));

        let transposed = DistMatrix::from_fn(grid, data, 4, 4, |i, j| entry(j, i))?;
        assert_ne!(checksum(&transposed)?, expected_checksum(4, 4));
        assert_eq!(checksum(&transposed)?, checksum_of(4, 4, |i, j| entry(j, i)));
    }));
}

#[test]
fn checksum_survives_a_chain() {
    on_grid(2, 3, |grid| Ok({
        let mut current = filled(grid, DistData::new(Pair::MC_MR, grid.shape()).with_aligns(1, 2), 9, 8)?;
        let chain = [
            Pair::VR_STAR, Pair::MD_STAR, Pair::STAR_MC, Pair::CIRC_CIRC,
            Pair::STAR_VC, Pair::MR_MC, Pair::STAR_MD, Pair::MC_STAR,
        ];
        for &pair in &chain {
            current = current.redistribute(pair)?;
            assert_eq!(checksum(&current)?, expected_checksum(9, 8), "after {}", pair);
        }
        check_entries(&current, entry);
    }));
}

#[test]
fn source_alignment_does_not_change_the_result() {
    let gathered = on_grid(2, 3, |grid| Ok({
        let mut out = vec![];
        for (col_align, row_align) in iproduct!(0..2, 0..3) {
            let data = DistData::new(Pair::MC_MR, grid.shape()).with_aligns(col_align, row_align);
            let a = filled(grid, data, 5, 7)?;
            let b = a.redistribute(Pair::STAR_STAR)?;
            out.push(b.local().to_owned_matrix().to_column_major());
        }
        out
    }));

    for per_rank in gathered {
        for everything in &per_rank {
            assert_eq!(everything, &per_rank[0]);
        }
    }
}

#[test]
fn unconstrained_destinations_adopt_alignment() {
    on_grid(2, 3, |grid| Ok({
        let data = DistData::new(Pair::MC_MR, grid.shape()).with_aligns(1, 2);
        let a = filled(grid, data, 6, 6)?;
        let b = a.redistribute(Pair::MC_STAR)?;
        assert_eq!(b.col_align(), 1);
        check_entries(&b, entry);

        // constrained alignments are kept
        let mut c = DistMatrix::from_data(grid, DistData::new(Pair::MC_STAR, grid.shape()))?;
        a.redistribute_into(&mut c)?;
        assert_eq!(c.col_align(), 0);
        check_entries(&c, entry);
    }));
}

#[test]
fn empty_matrices_move_nothing() {
    let stats = on_grid(2, 2, |grid| Ok({
        let a = filled(grid, DistData::new(Pair::MC_MR, grid.shape()), 0, 5)?;
        grid.transport().reset_stats();
        for &pair in Pair::ALL.iter() {
            let b = a.redistribute(pair)?;
            assert_eq!(b.dims(), (0, 5));
        }
        grid.transport().stats()
    }));
    for stats in stats {
        assert_eq!(stats.total_calls(), 0);
        assert_eq!(stats.messages_sent, 0);
    }
}

#[test]
fn one_process_moves_nothing() {
    let stats = on_grid(1, 1, |grid| Ok({
        grid.transport().reset_stats();
        for (&a, &b) in iproduct!(Pair::ALL.iter(), Pair::ALL.iter()) {
            let src = filled(grid, DistData::new(a, grid.shape()), 3, 4)?;
            let dest = src.redistribute(b)?;
            check_entries(&dest, entry);
        }
        grid.transport().stats()
    }));
    assert_eq!(stats[0].total_calls(), 0);
    assert_eq!(stats[0].messages_sent, 0);
}

#[test]
fn blocks_larger_than_the_matrix() {
    on_grid(2, 2, |grid| Ok({
        let data = DistData::new(Pair::MC_MR, grid.shape()).with_blocks(10, 10);
        let a = filled(grid, data, 3, 3)?;
        let coord = grid.coord();
        let expected_local = (
            if coord.row == 0 { 3 } else { 0 },
            if coord.col == 0 { 3 } else { 0 },
        );
        assert_eq!((a.local_height(), a.local_width()), expected_local);

        for &pair in Pair::ALL.iter() {
            let b = a.redistribute(pair)?;
            check_entries(&b, entry);
            let back = b.redistribute(Pair::MC_MR)?;
            check_entries(&back, entry);
        }
    }));
}

#[test]
fn general_purpose_route_can_be_disabled() {
    let (from, to) = iproduct!(Pair::ALL.iter(), Pair::ALL.iter())
        .map(|(&a, &b)| (a, b))
        .find(|&(a, b)| route(a, b, true).general_purpose)
        .expect("some pair has no dedicated route");

    let policy = RedistPolicy { allow_general_purpose: false };
    on_grid_with(2, 2, policy, |grid| Ok({
        let a = filled(grid, DistData::new(from, grid.shape()), 4, 4)?;
        let err = a.redistribute(to).unwrap_err();
        assert!(err.downcast_ref::<ConfigurationError>().is_some(), "{}", err);

        // dedicated routes are unaffected
        let b = a.redistribute(Pair::STAR_STAR)?;
        check_entries(&b, entry);
    }));

    on_grid(2, 2, |grid| Ok({
        let a = filled(grid, DistData::new(from, grid.shape()), 4, 4)?;
        check_entries(&a.redistribute(to)?, entry);
    }));
}

#[test]
fn descriptors_must_match_the_grid() {
    on_grid(1, 1, |grid| Ok({
        let elsewhere = DistData::new(Pair::MC_MR, GridShape::new(1, 2)?);
        let err = DistMatrix::<i64, _>::from_data(grid, elsewhere).unwrap_err();
        assert!(err.downcast_ref::<GridMismatchError>().is_some(), "{}", err);
    }));
}

#[test]
fn locked_views_cannot_be_written() {
    on_grid(2, 2, |grid| Ok({
        let a = filled(grid, DistData::new(Pair::MC_MR, grid.shape()), 4, 4)?;
        let b = filled(grid, DistData::new(Pair::STAR_STAR, grid.shape()), 4, 4)?;
        let mut view = b.locked_view(0..2, 0..2)?;
        let err = a.locked_view(0..2, 0..2)?.redistribute_into(&mut view).unwrap_err();
        assert!(err.downcast_ref::<ViewError>().is_some(), "{}", err);
    }));
}

#[test]
fn views_as_source_and_destination() {
    on_grid(2, 3, |grid| Ok({
        let shape = grid.shape();
        let a = filled(grid, DistData::new(Pair::MC_MR, shape).with_blocks(2, 1), 6, 7)?;
        let mut b = DistMatrix::from_fn(grid, DistData::new(Pair::VR_STAR, shape), 5, 5, |_, _| -1i64)?;
        {
            let src = a.locked_view(3..6, 1..4)?;
            check_entries(&src, |i, j| entry(i + 3, j + 1));
            let mut dest = b.view(1..4, 2..5)?;
            src.redistribute_into(&mut dest)?;
            check_entries(&dest, |i, j| entry(i + 3, j + 1));
        }
        check_entries(&b, |i, j| match (i, j) {
            (1..=3, 2..=4) => entry(i + 2, j - 1),
            _ => -1,
        });
    }));
}
