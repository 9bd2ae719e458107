/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Dense matrices distributed over a two-dimensional grid of processes.
//!
//! A [`DistMatrix`] pairs a [`Grid`] with a [`DistData`] descriptor saying
//! which process holds which entry.  Fourteen distribution pairs are
//! supported (see [`Pair`]); [`DistMatrix::redistribute_into`] converts
//! between any two of them using collective communication over the grid.
//!
//! Communication goes through a [`Transport`].  [`ThreadComm`] runs every
//! rank as a thread of the current process, which is also how a
//! single-process computation is expressed.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;

macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

pub type FailResult<T> = Result<T, failure::Error>;

pub use crate::errors::{AlignmentError, BoundsError, ConfigurationError, GridMismatchError, TransportError, ViewError};
pub mod errors;

pub use crate::scalar::Ring;
mod scalar;

pub use crate::storage::{HostStorage, Storage};
mod storage;

pub use crate::local::{Matrix, MatrixMut, MatrixRef, MatrixRef_};
mod local;

pub use crate::dist_matrix::{DistMatrix, ViewKind};
mod dist_matrix;

mod queues;

pub use crate::redist::redistribute;
pub mod redist;

pub mod level1;
pub mod norms;
pub mod serial;
pub mod logging;

pub use gridmat_config::{Settings, YamlRead};
pub use gridmat_grid::{
    Axis, BlockCyclic, Coord, Device, Dim, Dist, DistData,
    DimData, Grid, GridShape, Linearization, Pair, Projection, RedistPolicy, Scope,
};
pub use gridmat_transport::{
    Collective, CommStats, Communicator, Payload, Reduce, ReduceOp,
    ThreadComm, Transport, spmd, spmd_with,
};
#[cfg(feature = "mpi-support")]
pub use gridmat_transport::MpiTransport;
