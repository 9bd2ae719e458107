/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! MPI backend.
//!
//! Messages travel as raw bytes, which is why [`Payload`] is an unsafe trait.
//! Sends are buffered (`MPI_Bsend`), which gives them the "never waits for the
//! receiver" behavior that the collectives rely on; the attached buffer must
//! be large enough for the largest burst of outstanding sends.

use crate::{FailResult, Label, Payload, Transport};

use ::mpi::environment::Universe;
use ::mpi::topology::SystemCommunicator;
use ::mpi::traits::*;

use std::mem;

/// Contexts and tags are packed into a single MPI tag, which the standard
/// only guarantees up to 32767.
const TAGS_PER_CONTEXT: i32 = 1024;

pub struct MpiTransport {
    world: SystemCommunicator,
}

impl MpiTransport {
    pub fn new(universe: &mut Universe, buffer_bytes: usize) -> Self
    {
        universe.set_buffer_size(buffer_bytes);
        MpiTransport { world: universe.world() }
    }
}

fn mpi_tag(label: Label) -> FailResult<::mpi::Tag>
{Ok({
    let Label { context, tag } = label;
    ensure!(i32::from(tag) < TAGS_PER_CONTEXT, "tag {} does not fit in an MPI tag", tag);
    ensure!(i32::from(context) < 32, "context {} does not fit in an MPI tag", context);
    i32::from(context) * TAGS_PER_CONTEXT + i32::from(tag)
})}

impl Transport for MpiTransport {
    fn rank(&self) -> usize { self.world.rank() as usize }
    fn size(&self) -> usize { self.world.size() as usize }

    fn send<T: Payload>(&self, dest: usize, label: Label, data: Vec<T>) -> FailResult<()>
    {Ok({
        let tag = mpi_tag(label)?;
        let bytes = unsafe {
            ::std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * mem::size_of::<T>())
        };
        self.world.process_at_rank(dest as ::mpi::Rank).buffered_send_with_tag(bytes, tag);
    })}

    fn recv<T: Payload>(&self, src: usize, label: Label) -> FailResult<Vec<T>>
    {Ok({
        let tag = mpi_tag(label)?;
        let (bytes, _status) = self.world.process_at_rank(src as ::mpi::Rank).receive_vec_with_tag::<u8>(tag);

        let size = mem::size_of::<T>();
        ensure!(size > 0 && bytes.len() % size == 0, "message of {} bytes from rank {} is not a whole number of elements", bytes.len(), src);
        let mut out = vec![T::default(); bytes.len() / size];
        unsafe {
            // the destination is properly aligned for T, the source need not be
            ::std::ptr::copy_nonoverlapping(bytes.as_ptr(), out.as_mut_ptr() as *mut u8, bytes.len());
        }
        out
    })}
}
