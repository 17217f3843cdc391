// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The errors a render can fail with.  Points that never reach a
//! root are not errors; they are classified as non-converged and
//! painted with the palette's reserved color.

use failure::Fail;

/// Everything that can stop a render call before it hands back a
/// frame.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// A parameter was out of range.  Detected before any compute
    /// begins; the library never clamps on the caller's behalf.
    #[fail(display = "invalid parameter {}: {}", name, reason)]
    InvalidParameter {
        /// The offending parameter.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The output planes or a task's scratch memory could not be
    /// allocated.
    #[fail(
        display = "could not allocate {} bytes with alignment {}",
        bytes, alignment
    )]
    AllocationFailure {
        /// Requested size.
        bytes: usize,
        /// Requested alignment.
        alignment: usize,
    },

    /// The palette cannot color every root of the polynomial.
    #[fail(
        display = "palette has {} entries, too few for degree {}",
        entries, degree
    )]
    PaletteTooSmall {
        /// Entries in the palette, including the non-converged color.
        entries: usize,
        /// Degree of the polynomial being rendered.
        degree: usize,
    },

    /// A worker thread panicked while running its units.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,
}

impl RenderError {
    pub(crate) fn invalid<S: Into<String>>(name: &'static str, reason: S) -> Self {
        RenderError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
