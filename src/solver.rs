// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Newton-Raphson iteration for z^n - 1, one starting point at a
//! time.
//!
//! Each point is stepped with `z <- z - f(z) / f'(z)` until it either
//! lands within the convergence threshold of a root, runs out of
//! iterations, or hits a zero derivative (the origin, for n > 1),
//! where no step can be taken.  Whatever root is nearest at that
//! moment is the point's classification, provided it is close
//! enough; otherwise the point is non-converged.

use num::Complex;

use crate::complex::{divide, power};
use crate::roots::RootSet;

/// When the solver compares the iterate against the root set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConvergenceCheck {
    /// Before every step, stopping as soon as a root is within the
    /// threshold.  The iteration count then measures convergence
    /// speed.
    EveryStep,
    /// Once, after the full budget has been spent (or a zero
    /// derivative stopped the iteration).  Converged points report
    /// the whole budget as their iteration count.
    AfterLoop,
}

impl Default for ConvergenceCheck {
    fn default() -> Self {
        ConvergenceCheck::EveryStep
    }
}

/// The outcome for one starting point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Index into the root set, or None if the point did not
    /// converge.
    pub root: Option<usize>,
    /// Newton steps actually taken.
    pub iterations: u32,
}

impl Classification {
    /// Position in a palette: 0 for non-converged, `root + 1`
    /// otherwise.
    #[inline]
    pub fn palette_index(&self) -> usize {
        self.root.map_or(0, |r| r + 1)
    }
}

/// The fixed parameters of one run of the solver.  Cheap to copy;
/// each worker can hold its own.
#[derive(Clone, Debug)]
pub struct Newton {
    roots: RootSet,
    max_iterations: u32,
    min_step_squared: f64,
    check: ConvergenceCheck,
}

impl Newton {
    /// `roots` fixes the degree.  `max_iterations` and
    /// `min_step_squared` are expected to be validated already.
    pub fn new(
        roots: RootSet,
        max_iterations: u32,
        min_step_squared: f64,
        check: ConvergenceCheck,
    ) -> Newton {
        Newton {
            roots,
            max_iterations,
            min_step_squared,
            check,
        }
    }

    /// The root set points are classified against.
    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// The iteration budget.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    fn landed(&self, z: Complex<f64>) -> Option<usize> {
        match self.roots.nearest(z) {
            Some((i, d)) if d < self.min_step_squared => Some(i),
            _ => None,
        }
    }

    /// Iterates from `z0` and classifies where it ends up.
    pub fn classify(&self, z0: Complex<f64>) -> Classification {
        let degree = self.roots.len() as u32;
        let scale = f64::from(degree);
        let mut z = z0;
        let mut count: u32 = 0;

        while count <= self.max_iterations {
            if self.check == ConvergenceCheck::EveryStep {
                if let Some(root) = self.landed(z) {
                    return Classification {
                        root: Some(root),
                        iterations: count,
                    };
                }
            }

            let mut f = power(z, degree);
            f.re -= 1.0;
            let d = power(z, degree - 1);
            let df = Complex::new(d.re * scale, d.im * scale);

            let step = match divide(f, df) {
                Some(step) => step,
                None => break,
            };
            z = Complex::new(z.re - step.re, z.im - step.im);
            count += 1;
        }

        Classification {
            root: self.landed(z),
            iterations: count,
        }
    }
}
