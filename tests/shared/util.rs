/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

/// The value stored at `(i, j)` by most tests.  Distinct for every entry of
/// any matrix smaller than 1000x1000.
pub fn entry(i: usize, j: usize) -> i64
{ (1000 * i + j) as i64 }

pub fn sorted<T: Ord>(mut xs: Vec<T>) -> Vec<T>
{ xs.sort(); xs }
