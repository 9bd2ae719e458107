/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Batched access to remote entries.

use crate::FailResult;
use crate::dist_matrix::DistMatrix;
use crate::errors::BoundsError;
use crate::scalar::Ring;

use gridmat_grid::Scope;
use gridmat_transport::{Communicator, Transport};

impl<'a, T: Ring, C: Transport> DistMatrix<'a, T, C> {
    /// Records an addition to entry `(i, j)`, to be applied on every process
    /// holding it by the next [`DistMatrix::process_queues`].
    pub fn queue_update(&mut self, i: usize, j: usize, value: T) -> FailResult<()>
    {Ok({
        self.check_queued(i, j)?;
        self.updates.push((i, j, value));
    })}

    /// Records a request for entry `(i, j)`, to be answered by the next
    /// [`DistMatrix::process_pull_queue`].
    pub fn queue_pull(&mut self, i: usize, j: usize) -> FailResult<()>
    {Ok({
        self.check_queued(i, j)?;
        self.pulls.push((i, j));
    })}

    fn check_queued(&self, i: usize, j: usize) -> FailResult<()>
    {Ok({
        if i >= self.height() || j >= self.width() {
            throw!(BoundsError::new(format!(
                "queued entry ({}, {}) of a {}x{} matrix", i, j, self.height(), self.width(),
            )));
        }
    })}

    /// Collective: applies every process's queued updates.
    ///
    /// Updates are added in the order they arrive, which is by sending rank
    /// and then by the order they were queued.
    pub fn process_queues(&mut self) -> FailResult<()>
    {Ok({
        let grid = self.grid();
        let world = grid.comm(Scope::Vc)?;
        let size = world.size();

        let mut rows = vec![vec![]; size];
        let mut cols = vec![vec![]; size];
        let mut values = vec![vec![]; size];
        let updates = ::std::mem::replace(&mut self.updates, vec![]);
        for (i, j, value) in updates {
            for holder in self.dist_data().holders(i, j) {
                let dest = grid.shape().rank(holder);
                rows[dest].push(i);
                cols[dest].push(j);
                values[dest].push(value);
            }
        }
        trace!("Sending {} queued updates", values.iter().map(Vec::len).sum::<usize>());

        let counts = exchange_counts(&world, &rows)?;
        let rows = world.all_to_all_v(rows, &counts)?;
        let cols = world.all_to_all_v(cols, &counts)?;
        let values = world.all_to_all_v(values, &counts)?;

        for ((rows, cols), values) in rows.into_iter().zip(cols).zip(values) {
            for ((i, j), value) in rows.into_iter().zip(cols).zip(values) {
                let (i_loc, j_loc) = (self.local_row(i)?, self.local_col(j)?);
                self.update_local(i_loc, j_loc, value)?;
            }
        }
    })}

    /// Collective: answers every process's queued pulls.  Returns this
    /// process's requested values in the order they were queued.
    pub fn process_pull_queue(&mut self) -> FailResult<Vec<T>>
    {Ok({
        let grid = self.grid();
        let world = grid.comm(Scope::Vc)?;
        let size = world.size();

        let pulls = ::std::mem::replace(&mut self.pulls, vec![]);
        let owners: Vec<_> = pulls.iter().map(|&(i, j)| self.owner(i, j)).collect();

        let mut rows = vec![vec![]; size];
        let mut cols = vec![vec![]; size];
        for (&(i, j), &owner) in pulls.iter().zip(&owners) {
            rows[owner].push(i);
            cols[owner].push(j);
        }
        let asked: Vec<_> = rows.iter().map(Vec::len).collect();

        let counts = exchange_counts(&world, &rows)?;
        let rows = world.all_to_all_v(rows, &counts)?;
        let cols = world.all_to_all_v(cols, &counts)?;

        let mut replies = Vec::with_capacity(size);
        for (rows, cols) in rows.into_iter().zip(cols) {
            let mut reply = Vec::with_capacity(rows.len());
            for (i, j) in rows.into_iter().zip(cols) {
                reply.push(self.get_local(self.local_row(i)?, self.local_col(j)?)?);
            }
            replies.push(reply);
        }
        let replies = world.all_to_all_v(replies, &asked)?;

        // answers from each owner come back in the order they were asked
        let mut cursors = vec![0; size];
        owners.into_iter().map(|owner| {
            let value = replies[owner][cursors[owner]];
            cursors[owner] += 1;
            value
        }).collect()
    })}
}

// every member learns how many items each other member is about to send it
fn exchange_counts<C: Transport, X>(world: &Communicator<'_, C>, outgoing: &[Vec<X>]) -> FailResult<Vec<usize>>
{Ok({
    let sends = outgoing.iter().map(|items| vec![items.len()]).collect();
    let counts = world.all_to_all_v(sends, &vec![1; world.size()])?;
    counts.into_iter().map(|count| count[0]).collect()
})}
