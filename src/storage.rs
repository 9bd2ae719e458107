/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Backing memory for local matrices.

use gridmat_grid::Device;

/// A contiguous buffer of matrix entries on some device.
///
/// Only host memory exists today; the trait is the seam where device
/// memory would be added, so nothing outside this module touches the
/// `Vec` directly.
pub trait Storage<T>: Sized {
    fn device(&self) -> Device;

    /// A buffer of `len` default-initialized entries.
    fn allocate(len: usize) -> Self;

    fn len(&self) -> usize;

    /// Copies `src` into the front of the buffer.
    fn copy_in(&mut self, src: &[T]);

    /// Copies the front of the buffer into `dest`.
    fn copy_out(&self, dest: &mut [T]);

    fn host(&self) -> &[T];
    fn host_mut(&mut self) -> &mut [T];
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostStorage<T> {
    data: Vec<T>,
}

impl<T: Copy + Default> Storage<T> for HostStorage<T> {
    fn device(&self) -> Device { Device::Cpu }

    fn allocate(len: usize) -> Self
    { HostStorage { data: vec![T::default(); len] } }

    fn len(&self) -> usize { self.data.len() }

    fn copy_in(&mut self, src: &[T])
    { self.data[..src.len()].copy_from_slice(src) }

    fn copy_out(&self, dest: &mut [T])
    { dest.copy_from_slice(&self.data[..dest.len()]) }

    fn host(&self) -> &[T] { &self.data }
    fn host_mut(&mut self) -> &mut [T] { &mut self.data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_in_and_out() {
        let mut buf = HostStorage::<i32>::allocate(4);
        assert_eq!(buf.device(), Device::Cpu);
        assert_eq!(buf.host(), &[0, 0, 0, 0]);

        buf.copy_in(&[1, 2]);
        assert_eq!(buf.host(), &[1, 2, 0, 0]);

        let mut out = [9; 3];
        buf.copy_out(&mut out);
        assert_eq!(out, [1, 2, 0]);
    }
}
