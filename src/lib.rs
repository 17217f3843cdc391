#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newton fractal renderer
//!
//! Newton's method finds a root of a function by repeatedly sliding
//! down its tangent: `z <- z - f(z) / f'(z)`.  For the polynomial
//! `z^n - 1` there are n roots, evenly spaced around the unit
//! circle, and which one a starting point slides into depends on the
//! starting point in a wildly intricate way.  Coloring every point of
//! a region of the complex plane by the root it reaches, and shading
//! it by how quickly it got there, produces the Newton fractal.
//!
//! Every pixel is independent of every other, so the image is split
//! into bands of rows and handed to a [`Dispatcher`], which runs them
//! either on the calling thread or across a pool of workers.  Both
//! produce byte-identical frames; the benchmark harness checksums
//! them to prove it.

extern crate crossbeam;
extern crate failure;
extern crate fnv;
extern crate image;
extern crate itertools;
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod bench;
pub mod complex;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod frame;
pub mod palette;
pub mod planes;
pub mod render;
pub mod roots;
pub mod solver;

pub use dispatch::{Dispatcher, Executor, Parallel, Sequential};
pub use error::RenderError;
pub use frame::FrameBuffer;
pub use render::{render, render_with, RenderOptions, RenderParams, Renderer};
