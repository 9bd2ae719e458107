/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use failure::Backtrace;

pub use gridmat_grid::{ConfigurationError, GridMismatchError};
pub use gridmat_transport::TransportError;

/// An index or range outside of a matrix.
#[derive(Debug, Fail)]
#[fail(display = "out of bounds: {}", message)]
pub struct BoundsError {
    backtrace: Backtrace,
    pub message: String,
}

impl BoundsError {
    pub fn new(message: impl Into<String>) -> Self
    { BoundsError { backtrace: Backtrace::new(), message: message.into() } }
}

/// Entrywise arithmetic on operands whose descriptors are not compatible.
///
/// Call one of the `align_with` methods first.
#[derive(Debug, Fail)]
#[fail(display = "alignment error: {}", message)]
pub struct AlignmentError {
    backtrace: Backtrace,
    pub message: String,
}

impl AlignmentError {
    pub fn new(message: impl Into<String>) -> Self
    { AlignmentError { backtrace: Backtrace::new(), message: message.into() } }
}

/// Writing through a locked view, or reallocating a view.
#[derive(Debug, Fail)]
#[fail(display = "view error: {}", message)]
pub struct ViewError {
    backtrace: Backtrace,
    pub message: String,
}

impl ViewError {
    pub fn new(message: impl Into<String>) -> Self
    { ViewError { backtrace: Backtrace::new(), message: message.into() } }
}
