/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Messaging substrate for distributed matrices.
//!
//! Everything the rest of gridmat needs from "the network" is expressed through
//! the [`Transport`] trait, which only knows how to move a `Vec<T>` from one
//! rank to another.  The collectives (broadcast, all-to-all, reductions...) are
//! layered on top of it by [`Communicator`], which is an ordered subset of the
//! world ranks together with a context id that keeps its traffic separate from
//! that of other communicators.
//!
//! Two backends are provided:
//!
//! * [`ThreadComm`], which runs one thread per rank inside a single process.
//!   This is what the test suite uses, and it is also how a single-process
//!   computation is represented (a world of size 1).
//! * `MpiTransport`, behind the `mpi-support` feature.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;

macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

pub use crate::payload::{Payload, Reduce, ReduceOp};
mod payload;

pub use crate::comm::{Communicator, FIRST_RESERVED_TAG};
mod comm;

pub use crate::stats::{Collective, CommStats, Event};
mod stats;

pub use crate::thread::{ThreadComm, spmd, spmd_with};
mod thread;

#[cfg(feature = "mpi-support")]
pub use crate::mpi_backend::MpiTransport;
#[cfg(feature = "mpi-support")]
mod mpi_backend;

use std::time::Duration;

pub type FailResult<T> = Result<T, failure::Error>;

/// Identifies a stream of messages between two ranks.
///
/// Messages sent from one rank to another under the same label are received
/// in the order they were sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub context: u16,
    pub tag: u16,
}

/// A world of cooperating ranks that can exchange buffers.
///
/// `send` must not wait for the matching `recv` to be posted; the collectives
/// in [`Communicator`] post all of their sends before any of their receives.
pub trait Transport {
    /// This process's rank in the world.
    fn rank(&self) -> usize;

    /// Number of ranks in the world.
    fn size(&self) -> usize;

    fn send<T: Payload>(&self, dest: usize, label: Label, data: Vec<T>) -> FailResult<()>;

    /// Blocks until a message from `src` with the given label is available.
    fn recv<T: Payload>(&self, src: usize, label: Label) -> FailResult<Vec<T>>;

    /// Hook for backends that keep statistics.
    fn record(&self, event: Event) { let _ = event; }
}

#[derive(Debug, Fail)]
pub enum TransportError {
    #[fail(display = "rank {} gave up after {:?} waiting on rank {} ({:?})", rank, timeout, src, label)]
    Stalled { rank: usize, src: usize, label: Label, timeout: Duration },

    #[fail(display = "rank {} got a payload of the wrong type from rank {} ({:?})", rank, src, label)]
    PayloadType { rank: usize, src: usize, label: Label },

    #[fail(display = "rank {} cannot reach rank {}", rank, dest)]
    Disconnected { rank: usize, dest: usize },

    #[fail(display = "expected {} elements from member {}, but received {}", expected, member, actual)]
    Count { member: usize, expected: usize, actual: usize },

    #[fail(display = "world rank {} is not a member of communicator {:?}", rank, members)]
    NotAMember { rank: usize, members: Vec<usize> },
}
