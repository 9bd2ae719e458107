/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! In-process backend: one thread per rank.

use crate::{FailResult, Label, Payload, Transport, TransportError};
use crate::stats::{CommStats, Event};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

struct Envelope {
    src: usize,
    label: Label,
    payload: Box<dyn Any + Send>,
}

/// One rank of a world whose ranks are threads of the current process.
///
/// Sends never block (the channels are unbounded).  Messages that arrive
/// before somebody asks for them are parked until a matching `recv`.
pub struct ThreadComm {
    rank: usize,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    parked: RefCell<VecDeque<Envelope>>,
    stall_timeout: Option<Duration>,
    stats: RefCell<CommStats>,
}

impl ThreadComm {
    /// Creates every rank of a world of the given size.  Hand one to each thread.
    pub fn world(size: usize) -> Vec<ThreadComm>
    {
        let (outboxes, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| channel::unbounded()).unzip();
        inboxes.into_iter().enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank,
                inbox,
                outboxes: outboxes.clone(),
                parked: Default::default(),
                stall_timeout: None,
                stats: Default::default(),
            })
            .collect()
    }

    /// Turns a receive that waits longer than `timeout` into a
    /// [`TransportError::Stalled`] instead of a deadlock.
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self
    { self.stall_timeout = timeout; self }

    pub fn stats(&self) -> CommStats
    { self.stats.borrow().clone() }

    pub fn reset_stats(&self)
    { *self.stats.borrow_mut() = CommStats::default(); }

    fn take_parked(&self, src: usize, label: Label) -> Option<Envelope>
    {
        let mut parked = self.parked.borrow_mut();
        let index = parked.iter().position(|e| e.src == src && e.label == label)?;
        parked.remove(index)
    }

    fn next_arrival(&self, src: usize, label: Label) -> FailResult<Envelope>
    {
        let timeout = match self.stall_timeout {
            None => return self.inbox.recv().map_err(|_| {
                TransportError::Disconnected { rank: self.rank, dest: src }.into()
            }),
            Some(timeout) => timeout,
        };
        match self.inbox.recv_timeout(timeout) {
            Ok(envelope) => Ok(envelope),
            Err(RecvTimeoutError::Timeout) => {
                throw!(TransportError::Stalled { rank: self.rank, src, label, timeout })
            },
            Err(RecvTimeoutError::Disconnected) => {
                throw!(TransportError::Disconnected { rank: self.rank, dest: src })
            },
        }
    }
}

impl Transport for ThreadComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.outboxes.len() }

    fn send<T: Payload>(&self, dest: usize, label: Label, data: Vec<T>) -> FailResult<()>
    {
        let rank = self.rank;
        let outbox = match self.outboxes.get(dest) {
            Some(outbox) => outbox,
            None => throw!(TransportError::Disconnected { rank, dest }),
        };
        let envelope = Envelope { src: rank, label, payload: Box::new(data) };
        outbox.send(envelope).map_err(|_| TransportError::Disconnected { rank, dest })?;
        Ok(())
    }

    fn recv<T: Payload>(&self, src: usize, label: Label) -> FailResult<Vec<T>>
    {
        let envelope = match self.take_parked(src, label) {
            Some(envelope) => envelope,
            None => loop {
                let envelope = self.next_arrival(src, label)?;
                if envelope.src == src && envelope.label == label {
                    break envelope;
                }
                trace!("rank {} parks a message from {} ({:?})", self.rank, envelope.src, envelope.label);
                self.parked.borrow_mut().push_back(envelope);
            },
        };
        match envelope.payload.downcast::<Vec<T>>() {
            Ok(data) => Ok(*data),
            Err(_) => throw!(TransportError::PayloadType { rank: self.rank, src, label }),
        }
    }

    fn record(&self, event: Event)
    { self.stats.borrow_mut().record(event) }
}

/// Runs `f` on every rank of a fresh world of `size` threads and returns the
/// results in rank order.
///
/// A panic on any rank is resumed on the calling thread once all ranks have
/// finished.
pub fn spmd<R, F>(size: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(ThreadComm) -> R + Sync,
{ spmd_with(ThreadComm::world(size), f) }

/// [`spmd`] for a world that has already been configured.
pub fn spmd_with<R, F>(world: Vec<ThreadComm>, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(ThreadComm) -> R + Sync,
{
    let f = &f;
    let joined = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = world.into_iter()
            .map(|comm| scope.spawn(move |_| f(comm)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    });

    let joined = joined.unwrap_or_else(|payload| ::std::panic::resume_unwind(payload));
    joined.into_iter()
        .map(|result| result.unwrap_or_else(|payload| ::std::panic::resume_unwind(payload)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(tag: u16) -> Label { Label { context: 0, tag } }

    #[test]
    fn out_of_order_arrivals_are_parked() {
        let results = spmd(2, |comm| {
            match comm.rank() {
                0 => {
                    comm.send(1, label(1), vec![1.0_f64]).unwrap();
                    comm.send(1, label(2), vec![2.0_f64]).unwrap();
                    comm.send(1, label(1), vec![3.0_f64]).unwrap();
                    vec![]
                },
                _ => {
                    let b = comm.recv::<f64>(0, label(2)).unwrap();
                    let a1 = comm.recv::<f64>(0, label(1)).unwrap();
                    let a2 = comm.recv::<f64>(0, label(1)).unwrap();
                    vec![a1[0], a2[0], b[0]]
                },
            }
        });
        assert_eq!(results[1], vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn wrong_payload_type_is_an_error() {
        let comm = ThreadComm::world(1).pop().unwrap();
        comm.send(0, label(0), vec![1_u8]).unwrap();
        let err = comm.recv::<f64>(0, label(0)).unwrap_err();
        assert!(err.downcast_ref::<TransportError>().is_some());
    }

    #[test]
    fn stall_timeout_reports_instead_of_hanging() {
        let comm = ThreadComm::world(2).remove(0)
            .with_stall_timeout(Some(Duration::from_millis(20)));
        match comm.recv::<u8>(1, label(0)).unwrap_err().downcast::<TransportError>() {
            Ok(TransportError::Stalled { src: 1, .. }) => {},
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "rank 1 failed")]
    fn panics_propagate_to_the_caller() {
        spmd(2, |comm| {
            if comm.rank() == 1 {
                panic!("rank 1 failed");
            }
        });
    }
}
