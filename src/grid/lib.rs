/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Process grids and the metadata that says who owns which matrix entry.
//!
//! Nothing in this crate moves matrix data.  It answers questions like "which
//! process owns row 17 under `[VC,STAR]` with alignment 3?" and hands out the
//! communicators (one per grid axis) that the redistribution engine talks over.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;

macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

pub use crate::errors::{ConfigurationError, GridMismatchError};
mod errors;

pub use crate::index::BlockCyclic;
mod index;

pub use crate::grid::{Axis, Coord, Grid, GridShape, Linearization, RedistPolicy, Scope};
mod grid;

pub use crate::dist::{Dist, Pair};
mod dist;

pub use crate::data::{Device, Dim, DimData, DistData, Projection};
mod data;

pub type FailResult<T> = Result<T, failure::Error>;
