/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! One function per communication shape.
//!
//! Each takes the same `Transfer` and falls back to a personalized exchange
//! when the descriptors at hand do not meet the shape's preconditions.  All
//! such decisions depend only on descriptors, so every process makes the
//! same one.

use super::routes::Shape;
use super::transfer::Transfer;

use crate::FailResult;
use crate::dist_matrix::DistMatrix;
use crate::scalar::Ring;

use gridmat_grid::{Axis, Coord, Dim, DistData, GridShape, Pair, Projection, Scope};
use gridmat_transport::Transport;

pub(crate) fn execute<T: Ring, C: Transport>(
    shape: Shape,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{
    let src_data = *src.dist_data();
    let dest_data = *dest.dist_data();
    let transfer = Transfer { src: &src_data, dest: &dest_data, height: src.height(), width: src.width() };
    match shape {
        Shape::LocalCopy if src_data.compatible(&dest_data) => local_copy(src, dest),
        Shape::LocalCopy | Shape::Filter => personalized(&transfer, Scope::Own, src, dest),
        Shape::Exchange => exchange(&transfer, src, dest),
        Shape::AllGather(scope) => all_gather(&transfer, scope, src, dest),
        Shape::AllToAll(scope) => personalized(&transfer, scope, src, dest),
        Shape::Gather => gather(&transfer, src, dest),
        Shape::Scatter => scatter(&transfer, src, dest),
        Shape::Broadcast => broadcast(&transfer, src, dest),
    }
}

fn local_copy<T: Ring, C: Transport>(src: &DistMatrix<'_, T, C>, dest: &mut DistMatrix<'_, T, C>) -> FailResult<()>
{Ok({
    dest.local_mut()?.copy_from(&src.local());
})}

/// The requested scope if it suffices, else the narrowest one that does.
fn covering_scope(transfer: &Transfer<'_>, requested: Scope) -> Scope
{
    if transfer.src.covers(transfer.dest, requested) {
        return requested;
    }
    let widened = [Scope::Own, Scope::Mc, Scope::Mr, Scope::Vc].iter().cloned()
        .find(|&scope| transfer.src.covers(transfer.dest, scope))
        .unwrap_or(Scope::Vc);
    debug!(
        "{} to {}: alignments rule out {:?}, communicating over {:?}",
        transfer.src.pair(), transfer.dest.pair(), requested, widened,
    );
    widened
}

fn personalized<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    scope: Scope,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    let grid = src.grid();
    let shape = grid.shape();
    let me = grid.coord();
    let local = src.local();

    let scope = covering_scope(transfer, scope);
    if scope == Scope::Own {
        let buf = transfer.pack(&local, me, me);
        transfer.unpack(&mut dest.local_mut()?, me, me, &buf)?;
        return Ok(());
    }

    let comm = grid.comm(scope)?;
    let members: Vec<Coord> = comm.members().iter().map(|&rank| shape.coord(rank)).collect();
    let sends: Vec<Vec<T>> = members.iter().map(|&q| transfer.pack(&local, me, q)).collect();
    let counts: Vec<_> = members.iter().map(|&p| transfer.count(p, me)).collect();
    trace!(
        "{:?}: sending {} messages, receiving {}",
        scope,
        sends.iter().filter(|buf| !buf.is_empty()).count(),
        counts.iter().filter(|&&n| n > 0).count(),
    );
    let received = comm.all_to_all_v(sends, &counts)?;

    let mut out = dest.local_mut()?;
    for (&p, buf) in members.iter().zip(&received) {
        transfer.unpack(&mut out, p, me, buf)?;
    }
})}

fn everyone_participates(data: &DistData) -> bool
{ (0..data.grid.size()).all(|rank| data.participates(data.grid.coord(rank))) }

fn all_gather<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    scope: Scope,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    let grid = src.grid();
    let shape = grid.shape();

    // members must hold disjoint pieces and each need all of them
    let disjoint = Axis::BOTH.iter().all(|&axis| {
        !scope.varies(axis)
            || shape.extent(axis) == 1
            || (transfer.src.projection(axis) != Projection::Free
                && transfer.dest.projection(axis) == Projection::Free)
    });
    if !disjoint || !everyone_participates(transfer.dest) || !transfer.src.covers(transfer.dest, scope) {
        debug!("{} to {}: not an all-gather over {:?}", transfer.src.pair(), transfer.dest.pair(), scope);
        return personalized(transfer, scope, src, dest);
    }

    let me = grid.coord();
    let comm = grid.comm(scope)?;
    let mine = transfer.pack(&src.local(), me, me);
    let received = comm.all_gather_v(mine)?;

    let mut out = dest.local_mut()?;
    for (&rank, buf) in comm.members().iter().zip(&received) {
        transfer.unpack(&mut out, shape.coord(rank), me, buf)?;
    }
})}

// one-to-one exchanges need matching strides and blocks, and no replication
fn exchange_valid(src: &DistData, dest: &DistData) -> bool
{
    let shape = src.grid;
    let dims_match = Dim::BOTH.iter().all(|&dim| {
        let (a, b) = (src.dim(dim), dest.dim(dim));
        (a.block, a.cut) == (b.block, b.cut) && src.stride(dim) == dest.stride(dim)
    });
    let determined = |data: &DistData| Axis::BOTH.iter().all(|&axis| {
        shape.extent(axis) == 1 || data.projection(axis) != Projection::Free
    });
    dims_match
        && determined(src) && determined(dest)
        && everyone_participates(src) && everyone_participates(dest)
}

/// The process that needs, under `needed`, what `me` holds under `held`.
fn partner(held: &DistData, needed: &DistData, shape: GridShape, me: Coord) -> Option<Coord>
{
    let (mut row, mut col) = (None, None);
    for &dim in &Dim::BOTH {
        let first = held.global_index(dim, me, 0)?;
        let (r, c) = needed.implied_coords(dim, needed.owner(dim, first));
        row = row.or(r);
        col = col.or(c);
    }
    let coord = Coord::new(row.unwrap_or(0), col.unwrap_or(0));
    match (row, col) {
        (Some(_), Some(_)) => Some(coord),
        (None, _) if shape.height == 1 => col.map(|col| Coord::new(0, col)),
        (_, None) if shape.width == 1 => row.map(|row| Coord::new(row, 0)),
        _ => None,
    }
}

fn exchange<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    if !exchange_valid(transfer.src, transfer.dest) {
        debug!("{} to {}: not a permutation, exchanging over the world", transfer.src.pair(), transfer.dest.pair());
        return personalized(transfer, Scope::Vc, src, dest);
    }
    let grid = src.grid();
    let shape = grid.shape();
    let me = grid.coord();

    let to = partner(transfer.src, transfer.dest, shape, me);
    let from = partner(transfer.dest, transfer.src, shape, me);
    let (to, from) = match (to, from) {
        (Some(to), Some(from)) => (to, from),
        _ => bail!("rank {} has no exchange partner for {} to {}", grid.rank(), transfer.src.pair(), transfer.dest.pair()),
    };

    let world = grid.comm(Scope::Vc)?;
    let buf = transfer.pack(&src.local(), me, to);
    let count = transfer.count(from, me);
    let received = world.send_recv(shape.rank(to), buf, shape.rank(from), count)?;
    transfer.unpack(&mut dest.local_mut()?, from, me, &received)?;
})}

fn gather<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    if transfer.dest.pair() != Pair::CIRC_CIRC {
        return personalized(transfer, Scope::Vc, src, dest);
    }
    let grid = src.grid();
    let shape = grid.shape();
    let me = grid.coord();
    let root = transfer.dest.root;
    let root_coord = shape.coord(root);

    let world = grid.comm(Scope::Vc)?;
    let mine = transfer.pack(&src.local(), me, root_coord);
    if let Some(parts) = world.gather_v(root, mine)? {
        let mut out = dest.local_mut()?;
        for (rank, buf) in parts.iter().enumerate() {
            transfer.unpack(&mut out, shape.coord(rank), root_coord, buf)?;
        }
    }
})}

fn scatter<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    if transfer.src.pair() != Pair::CIRC_CIRC {
        return personalized(transfer, Scope::Vc, src, dest);
    }
    let grid = src.grid();
    let shape = grid.shape();
    let me = grid.coord();
    let root = transfer.src.root;
    let root_coord = shape.coord(root);

    let world = grid.comm(Scope::Vc)?;
    let parts = match grid.rank() == root {
        true => {
            let local = src.local();
            Some((0..shape.size()).map(|rank| transfer.pack(&local, root_coord, shape.coord(rank))).collect())
        },
        false => None,
    };
    let buf = world.scatter_v(root, parts)?;
    transfer.unpack(&mut dest.local_mut()?, root_coord, me, &buf)?;
})}

fn broadcast<T: Ring, C: Transport>(
    transfer: &Transfer<'_>,
    src: &DistMatrix<'_, T, C>,
    dest: &mut DistMatrix<'_, T, C>,
) -> FailResult<()>
{Ok({
    if transfer.src.pair() != Pair::CIRC_CIRC || transfer.dest.pair() != Pair::STAR_STAR {
        return personalized(transfer, Scope::Vc, src, dest);
    }
    let grid = src.grid();
    let shape = grid.shape();
    let me = grid.coord();
    let root = transfer.src.root;
    let root_coord = shape.coord(root);

    let world = grid.comm(Scope::Vc)?;
    let data = match grid.rank() == root {
        true => Some(transfer.pack(&src.local(), root_coord, root_coord)),
        false => None,
    };
    let buf = world.broadcast(root, data)?;
    transfer.unpack(&mut dest.local_mut()?, root_coord, me, &buf)?;
})}
