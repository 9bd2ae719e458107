/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use failure::Backtrace;

use crate::GridShape;

/// A request that can never succeed as configured.
///
/// Grid shapes that do not match the process count, invalid distribution
/// pairs, out-of-range alignments, and redistributions that have no route
/// all land here.
#[derive(Debug, Fail)]
#[fail(display = "configuration error: {}", message)]
pub struct ConfigurationError {
    backtrace: Backtrace,
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self
    { ConfigurationError { backtrace: Backtrace::new(), message: message.into() } }
}

/// Two operands live on process grids of different shapes.
#[derive(Debug, Fail)]
#[fail(display = "operands live on a {} grid and a {} grid", expected, found)]
pub struct GridMismatchError {
    backtrace: Backtrace,
    pub expected: GridShape,
    pub found: GridShape,
}

impl GridMismatchError {
    pub fn new(expected: GridShape, found: GridShape) -> Self
    { GridMismatchError { backtrace: Backtrace::new(), expected, found } }
}
