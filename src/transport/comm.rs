/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{FailResult, Label, Payload, Reduce, ReduceOp, Transport, TransportError};
use crate::stats::{Collective, Event};

/// Tags at or above this value are used internally by the collectives.
pub const FIRST_RESERVED_TAG: u16 = 1000;

const TAG_BARRIER: u16 = FIRST_RESERVED_TAG;
const TAG_BROADCAST: u16 = FIRST_RESERVED_TAG + 1;
const TAG_GATHER: u16 = FIRST_RESERVED_TAG + 2;
const TAG_SCATTER: u16 = FIRST_RESERVED_TAG + 3;
const TAG_ALL_GATHER: u16 = FIRST_RESERVED_TAG + 4;
const TAG_ALL_TO_ALL: u16 = FIRST_RESERVED_TAG + 5;
const TAG_SEND_RECV: u16 = FIRST_RESERVED_TAG + 6;

/// An ordered group of world ranks that take part in collectives together.
///
/// Ranks passed to and returned from the methods here are *member* indices,
/// i.e. positions in the member list, not world ranks.
///
/// Every member must call the same collectives in the same order.  Nothing
/// checks this; a mismatch deadlocks (or, on a backend with a stall timeout,
/// fails with [`TransportError::Stalled`]).
pub struct Communicator<'t, C: Transport> {
    transport: &'t C,
    context: u16,
    members: Vec<usize>,
    me: usize,
}

impl<'t, C: Transport> Communicator<'t, C> {
    /// `members` lists world ranks in communicator order and must contain this
    /// process's world rank.
    pub fn new(transport: &'t C, context: u16, members: Vec<usize>) -> FailResult<Self>
    {
        let rank = transport.rank();
        let me = match members.iter().position(|&m| m == rank) {
            Some(me) => me,
            None => throw!(TransportError::NotAMember { rank, members }),
        };
        Ok(Communicator { transport, context, members, me })
    }

    /// All world ranks in their natural order.
    pub fn world(transport: &'t C, context: u16) -> Self
    {
        let members = (0..transport.size()).collect();
        let me = transport.rank();
        Communicator { transport, context, members, me }
    }

    /// This process's member index.
    pub fn rank(&self) -> usize { self.me }
    pub fn size(&self) -> usize { self.members.len() }
    pub fn members(&self) -> &[usize] { &self.members }
    pub fn world_rank(&self, member: usize) -> usize { self.members[member] }
    pub fn transport(&self) -> &'t C { self.transport }

    fn label(&self, tag: u16) -> Label
    { Label { context: self.context, tag } }

    fn raw_send<T: Payload>(&self, dest: usize, tag: u16, data: Vec<T>) -> FailResult<()>
    {
        self.transport.record(Event::Send { elements: data.len() });
        self.transport.send(self.members[dest], self.label(tag), data)
    }

    fn raw_recv<T: Payload>(&self, src: usize, tag: u16) -> FailResult<Vec<T>>
    { self.transport.recv(self.members[src], self.label(tag)) }

    fn record(&self, kind: Collective, elements: usize)
    { self.transport.record(Event::Collective { kind, elements }) }

    pub fn send<T: Payload>(&self, dest: usize, tag: u16, data: Vec<T>) -> FailResult<()>
    {
        ensure!(tag < FIRST_RESERVED_TAG, "tag {} is reserved for collectives", tag);
        self.raw_send(dest, tag, data)
    }

    pub fn recv<T: Payload>(&self, src: usize, tag: u16) -> FailResult<Vec<T>>
    {
        ensure!(tag < FIRST_RESERVED_TAG, "tag {} is reserved for collectives", tag);
        self.raw_recv(src, tag)
    }

    /// Sends `data` to `dest` and receives `recv_count` elements from `src`.
    ///
    /// Like the collectives, an empty message is skipped on both ends.
    pub fn send_recv<T: Payload>(&self, dest: usize, data: Vec<T>, src: usize, recv_count: usize) -> FailResult<Vec<T>>
    {Ok({
        let mut kept = None;
        match dest == self.me {
            true => kept = Some(data),
            false => if !data.is_empty() {
                self.raw_send(dest, TAG_SEND_RECV, data)?;
            },
        }
        let buf = match (src == self.me, recv_count) {
            (true, _) => kept.unwrap_or_default(),
            (false, 0) => vec![],
            (false, _) => self.raw_recv(src, TAG_SEND_RECV)?,
        };
        if buf.len() != recv_count {
            throw!(TransportError::Count { member: src, expected: recv_count, actual: buf.len() });
        }
        buf
    })}

    pub fn barrier(&self) -> FailResult<()>
    {Ok({
        self.record(Collective::Barrier, 0);
        if self.size() == 1 {
            return Ok(());
        }
        if self.me == 0 {
            for src in 1..self.size() {
                self.raw_recv::<u8>(src, TAG_BARRIER)?;
            }
            for dest in 1..self.size() {
                self.raw_send::<u8>(dest, TAG_BARRIER, vec![])?;
            }
        } else {
            self.raw_send::<u8>(0, TAG_BARRIER, vec![])?;
            self.raw_recv::<u8>(0, TAG_BARRIER)?;
        }
    })}

    /// The root supplies `Some(data)`; everybody (root included) gets it back.
    pub fn broadcast<T: Payload>(&self, root: usize, value: Option<Vec<T>>) -> FailResult<Vec<T>>
    {Ok({
        if self.me == root {
            let data = match value {
                Some(data) => data,
                None => bail!("broadcast root was not given any data"),
            };
            self.record(Collective::Broadcast, data.len());
            for dest in (0..self.size()).filter(|&m| m != root) {
                self.raw_send(dest, TAG_BROADCAST, data.clone())?;
            }
            data
        } else {
            self.record(Collective::Broadcast, 0);
            self.raw_recv(root, TAG_BROADCAST)?
        }
    })}

    /// Returns `Some(contributions)` on the root, in member order.
    pub fn gather_v<T: Payload>(&self, root: usize, data: Vec<T>) -> FailResult<Option<Vec<Vec<T>>>>
    {Ok({
        self.record(Collective::Gather, data.len());
        if self.me == root {
            let mut data = Some(data);
            let mut out = Vec::with_capacity(self.size());
            for src in 0..self.size() {
                match src == root {
                    true => out.push(data.take().unwrap_or_default()),
                    false => out.push(self.raw_recv(src, TAG_GATHER)?),
                }
            }
            Some(out)
        } else {
            self.raw_send(root, TAG_GATHER, data)?;
            None
        }
    })}

    /// The root supplies one part per member.
    pub fn scatter_v<T: Payload>(&self, root: usize, parts: Option<Vec<Vec<T>>>) -> FailResult<Vec<T>>
    {Ok({
        if self.me == root {
            let parts = match parts {
                Some(parts) => parts,
                None => bail!("scatter root was not given any data"),
            };
            ensure!(parts.len() == self.size(), "scatter needs {} parts, got {}", self.size(), parts.len());
            self.record(Collective::Scatter, parts.iter().map(Vec::len).sum());

            let mut mine = vec![];
            for (dest, part) in parts.into_iter().enumerate() {
                match dest == root {
                    true => mine = part,
                    false => self.raw_send(dest, TAG_SCATTER, part)?,
                }
            }
            mine
        } else {
            self.record(Collective::Scatter, 0);
            self.raw_recv(root, TAG_SCATTER)?
        }
    })}

    /// Every member receives every member's contribution, in member order.
    pub fn all_gather_v<T: Payload>(&self, data: Vec<T>) -> FailResult<Vec<Vec<T>>>
    {
        self.record(Collective::AllGather, data.len());
        self.exchange_all(data)
    }

    // all_gather_v without the bookkeeping, so that the reductions are
    // counted as themselves
    fn exchange_all<T: Payload>(&self, data: Vec<T>) -> FailResult<Vec<Vec<T>>>
    {Ok({
        for dest in (0..self.size()).filter(|&m| m != self.me) {
            self.raw_send(dest, TAG_ALL_GATHER, data.clone())?;
        }
        let mut data = Some(data);
        let mut out = Vec::with_capacity(self.size());
        for src in 0..self.size() {
            match src == self.me {
                true => out.push(data.take().unwrap_or_default()),
                false => out.push(self.raw_recv(src, TAG_ALL_GATHER)?),
            }
        }
        out
    })}

    /// Personalized exchange.  `sends[m]` goes to member `m`, and
    /// `recv_counts[m]` is the number of elements member `m` sends here.
    ///
    /// Empty messages are never sent, so both sides must agree on which
    /// counts are zero.
    pub fn all_to_all_v<T: Payload>(&self, sends: Vec<Vec<T>>, recv_counts: &[usize]) -> FailResult<Vec<Vec<T>>>
    {
        self.record(Collective::AllToAll, sends.iter().map(Vec::len).sum());
        self.personalized(sends, recv_counts)
    }

    fn personalized<T: Payload>(&self, sends: Vec<Vec<T>>, recv_counts: &[usize]) -> FailResult<Vec<Vec<T>>>
    {Ok({
        ensure!(sends.len() == self.size(), "all-to-all needs {} send buffers, got {}", self.size(), sends.len());
        ensure!(recv_counts.len() == self.size(), "all-to-all needs {} receive counts, got {}", self.size(), recv_counts.len());

        let mut mine = vec![];
        for (dest, buf) in sends.into_iter().enumerate() {
            if dest == self.me {
                mine = buf;
            } else if !buf.is_empty() {
                self.raw_send(dest, TAG_ALL_TO_ALL, buf)?;
            }
        }

        let mut mine = Some(mine);
        let mut out = Vec::with_capacity(self.size());
        for (src, &expected) in recv_counts.iter().enumerate() {
            let buf = match (src == self.me, expected) {
                (true, _) => mine.take().unwrap_or_default(),
                (false, 0) => vec![],
                (false, _) => self.raw_recv(src, TAG_ALL_TO_ALL)?,
            };
            if buf.len() != expected {
                throw!(TransportError::Count { member: src, expected, actual: buf.len() });
            }
            out.push(buf);
        }
        out
    })}

    /// Elementwise reduction; the result is only returned on the root.
    pub fn reduce<T: Reduce>(&self, root: usize, data: Vec<T>, op: ReduceOp) -> FailResult<Option<Vec<T>>>
    {Ok({
        self.record(Collective::Reduce, data.len());
        if self.me == root {
            let mut data = Some(data);
            let mut parts = Vec::with_capacity(self.size());
            for src in 0..self.size() {
                match src == root {
                    true => parts.push(data.take().unwrap_or_default()),
                    false => parts.push(self.raw_recv(src, TAG_GATHER)?),
                }
            }
            Some(fold(parts, op)?)
        } else {
            self.raw_send(root, TAG_GATHER, data)?;
            None
        }
    })}

    /// Elementwise reduction, returned on every member.
    ///
    /// Contributions are combined in member order on every member, so all of
    /// them obtain bitwise identical results.
    pub fn all_reduce<T: Reduce>(&self, data: Vec<T>, op: ReduceOp) -> FailResult<Vec<T>>
    {
        self.record(Collective::AllReduce, data.len());
        fold(self.exchange_all(data)?, op)
    }

    /// Convenience wrapper for reducing one value.
    pub fn all_reduce_one<T: Reduce>(&self, value: T, op: ReduceOp) -> FailResult<T>
    {Ok({
        let out = self.all_reduce(vec![value], op)?;
        out[0]
    })}

    /// Reduces `data` elementwise and leaves member `m` with the `counts[m]`
    /// elements of the result that follow those of members `0..m`.
    pub fn reduce_scatter<T: Reduce>(&self, data: Vec<T>, counts: &[usize], op: ReduceOp) -> FailResult<Vec<T>>
    {Ok({
        ensure!(counts.len() == self.size(), "reduce-scatter needs {} counts, got {}", self.size(), counts.len());
        let total: usize = counts.iter().sum();
        ensure!(data.len() == total, "reduce-scatter expected {} elements, got {}", total, data.len());
        self.record(Collective::ReduceScatter, data.len());

        let mut sends = Vec::with_capacity(self.size());
        let mut rest = &data[..];
        for &count in counts {
            let (head, tail) = rest.split_at(count);
            sends.push(head.to_vec());
            rest = tail;
        }
        let recv_counts = vec![counts[self.me]; self.size()];
        fold(self.personalized(sends, &recv_counts)?, op)?
    })}
}

fn fold<T: Reduce>(parts: Vec<Vec<T>>, op: ReduceOp) -> FailResult<Vec<T>>
{Ok({
    let mut parts = parts.into_iter();
    let mut acc = parts.next().unwrap_or_default();
    for part in parts {
        ensure!(part.len() == acc.len(), "reduction over buffers of length {} and {}", acc.len(), part.len());
        for (a, b) in acc.iter_mut().zip(part) {
            *a = T::combine(op, *a, b);
        }
    }
    acc
})}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{spmd, ThreadComm, Collective};

    #[test]
    fn gathers_and_broadcasts() {
        let results = spmd(3, |comm: ThreadComm| {
            let world = Communicator::world(&comm, 7);
            let all = world.all_gather_v(vec![world.rank(); world.rank() + 1]).unwrap();
            let root_value = world.broadcast(2, match world.rank() {
                2 => Some(vec![42.0_f64]),
                _ => None,
            }).unwrap();
            let gathered = world.gather_v(1, vec![world.rank() as i64 * 10]).unwrap();
            (all, root_value, gathered)
        });

        for (rank, (all, root_value, gathered)) in results.into_iter().enumerate() {
            assert_eq!(all, vec![vec![0], vec![1, 1], vec![2, 2, 2]]);
            assert_eq!(root_value, vec![42.0]);
            match rank {
                1 => assert_eq!(gathered, Some(vec![vec![0], vec![10], vec![20]])),
                _ => assert_eq!(gathered, None),
            }
        }
    }

    #[test]
    fn personalized_exchange_skips_empty_messages() {
        let results = spmd(3, |comm: ThreadComm| {
            let world = Communicator::world(&comm, 7);
            let me = world.rank();
            // member m sends m copies of its rank to everyone with a higher rank
            let sends = (0..3).map(|dest| match dest > me {
                true => vec![me as u32; me],
                false => vec![],
            }).collect();
            let counts: Vec<_> = (0..3).map(|src| if src < me { src } else { 0 }).collect();
            let got = world.all_to_all_v(sends, &counts).unwrap();
            (got, comm.stats())
        });

        assert_eq!(results[0].0, vec![vec![], vec![], vec![]]);
        assert_eq!(results[2].0, vec![vec![], vec![1], vec![]]);
        // rank 0 has nothing but empty buffers to send
        assert_eq!(results[0].1.messages_sent, 0);
        assert_eq!(results[1].1.messages_sent, 1);
        assert_eq!(results[1].1.calls(Collective::AllToAll), 1);
    }

    #[test]
    fn send_recv_around_a_ring() {
        let results = spmd(3, |comm: ThreadComm| {
            let world = Communicator::world(&comm, 2);
            let me = world.rank();
            let next = (me + 1) % 3;
            let prev = (me + 2) % 3;
            let from_prev = world.send_recv(next, vec![me as u8; me], prev, prev).unwrap();
            let mine = world.send_recv(me, vec![9_u8], me, 1).unwrap();
            (from_prev, mine)
        });
        assert_eq!(results[0], (vec![2, 2], vec![9]));
        assert_eq!(results[1], (vec![], vec![9]));
        assert_eq!(results[2], (vec![1], vec![9]));
    }

    #[test]
    fn reductions_agree_everywhere() {
        let results = spmd(4, |comm: ThreadComm| {
            let world = Communicator::world(&comm, 3);
            let me = world.rank() as f64;
            let sum = world.all_reduce(vec![me, 1.0], ReduceOp::Sum).unwrap();
            let max = world.all_reduce_one(me, ReduceOp::Max).unwrap();
            let root = world.reduce(0, vec![me], ReduceOp::Min).unwrap();
            let scattered = world.reduce_scatter(vec![1_i64; 8], &[2, 2, 3, 1], ReduceOp::Sum).unwrap();
            world.barrier().unwrap();
            (sum, max, root, scattered)
        });

        for (rank, (sum, max, root, scattered)) in results.into_iter().enumerate() {
            assert_eq!(sum, vec![6.0, 4.0]);
            assert_eq!(max, 3.0);
            assert_eq!(root.is_some(), rank == 0);
            let expected_len = [2, 2, 3, 1][rank];
            assert_eq!(scattered, vec![4; expected_len]);
        }
    }

    #[test]
    fn subcommunicators_use_member_indices() {
        let results = spmd(4, |comm: ThreadComm| {
            // odd and even world ranks form two communicators on one context
            let members: Vec<_> = (0..4).filter(|r| r % 2 == comm.rank() % 2).collect();
            let sub = Communicator::new(&comm, 5, members).unwrap();
            let parts = match sub.rank() {
                0 => Some(vec![vec![comm.rank()], vec![comm.rank() + 100]]),
                _ => None,
            };
            sub.scatter_v(0, parts).unwrap()
        });
        assert_eq!(results, vec![vec![0], vec![1], vec![100], vec![101]]);
    }

    #[test]
    fn user_tags_cannot_collide_with_collectives() {
        let comm = ThreadComm::world(1).pop().unwrap();
        let world = Communicator::world(&comm, 0);
        assert!(world.send(0, FIRST_RESERVED_TAG, vec![1u8]).is_err());
        world.send(0, 3, vec![1u8, 2]).unwrap();
        assert_eq!(world.recv::<u8>(0, 3).unwrap(), vec![1, 2]);
    }
}
